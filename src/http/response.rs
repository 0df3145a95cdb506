//! HTTP response building module
//!
//! Builders for the status codes the transcode server emits.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";

/// Methods accepted on the transcode endpoint
pub const TRANSCODE_ALLOW: &str = "POST, OPTIONS";

/// Header carrying the transcoder exit code, when known
pub const EXIT_CODE_HEADER: &str = "x-transcoder-exit-code";

/// Build a plain text response
pub fn build_text_response(status: StatusCode, body: String) -> Response<Full<Bytes>> {
    let content_length = body.len();
    Response::builder()
        .status(status)
        .header("Content-Type", TEXT_PLAIN)
        .header("Content-Length", content_length)
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build a JSON response, falling back to 500 if serialization fails
pub fn build_json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = match serde_json::to_string_pretty(body) {
        Ok(j) => j,
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response: {e}"));
            return build_text_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "500 Internal Server Error".to_string(),
            );
        }
    };

    Response::builder()
        .status(status)
        .header("Content-Type", APPLICATION_JSON)
        .header("Content-Length", json.len())
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// JSON error body: `{"error": "...", "status": 400}`
pub fn build_json_error(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    build_json_response(
        status,
        &serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        }),
    )
}

/// Build 400 Bad Request response
pub fn build_400_response(message: &str) -> Response<Full<Bytes>> {
    build_text_response(StatusCode::BAD_REQUEST, format!("400 Bad Request: {message}\n"))
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    build_text_response(StatusCode::NOT_FOUND, "404 Not Found\n".to_string())
}

/// Build 405 Method Not Allowed response
pub fn build_405_response(allow: &str) -> Response<Full<Bytes>> {
    let mut resp = build_text_response(
        StatusCode::METHOD_NOT_ALLOWED,
        "405 Method Not Allowed\n".to_string(),
    );
    if let Ok(value) = allow.parse() {
        resp.headers_mut().insert(hyper::header::ALLOW, value);
    }
    resp
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<Full<Bytes>> {
    build_text_response(
        StatusCode::PAYLOAD_TOO_LARGE,
        "413 Payload Too Large\n".to_string(),
    )
}

/// Build OPTIONS response
pub fn build_options_response(allow: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Allow", allow)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build health check response
pub fn build_health_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    build_text_response(status, format!("{message}\n"))
}

/// Attach the transcoder exit code header
pub fn with_exit_code(
    mut resp: Response<Full<Bytes>>,
    exit_code: Option<i32>,
) -> Response<Full<Bytes>> {
    if let Some(code) = exit_code {
        resp.headers_mut().insert(EXIT_CODE_HEADER, code.into());
    }
    resp
}

/// Add the `Server` header to any response
pub fn with_server_name(
    mut resp: Response<Full<Bytes>>,
    server_name: &str,
) -> Response<Full<Bytes>> {
    if let Ok(value) = server_name.parse() {
        resp.headers_mut().insert(hyper::header::SERVER, value);
    }
    resp
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_response_headers() {
        let resp = build_text_response(StatusCode::OK, "hello\n".to_string());
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["Content-Type"], TEXT_PLAIN);
        assert_eq!(resp.headers()["Content-Length"], "6");
    }

    #[test]
    fn test_405_carries_allow() {
        let resp = build_405_response(TRANSCODE_ALLOW);
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers()["Allow"], "POST, OPTIONS");
    }

    #[test]
    fn test_exit_code_header() {
        let resp = with_exit_code(build_text_response(StatusCode::OK, String::new()), Some(1));
        assert_eq!(resp.headers()[EXIT_CODE_HEADER], "1");

        let resp = with_exit_code(build_text_response(StatusCode::OK, String::new()), None);
        assert!(resp.headers().get(EXIT_CODE_HEADER).is_none());
    }

    #[test]
    fn test_json_error() {
        let resp = build_json_error(StatusCode::BAD_REQUEST, "bad");
        assert_eq!(resp.headers()["Content-Type"], APPLICATION_JSON);
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
