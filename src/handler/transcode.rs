//! Transcode endpoint
//!
//! `POST <transcode_path>` with the recording identifier in a form field.
//! Responds with the transcoder command line followed by everything the
//! transcoder printed, whether it succeeded or not.

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::{Request, Response, StatusCode};

use crate::config::AppState;
use crate::handler::router::RouteOutcome;
use crate::http::{self, form, form::FormEncoding};
use crate::logger;
use crate::transcode::{render_lines, Identifier, TranscodeError, TranscodeReport};

/// Handle one transcode request
pub async fn handle_transcode<B>(req: Request<B>, state: &AppState) -> RouteOutcome
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let wants_json = accepts_json(&req);
    let max_body_size = state.config.http.max_body_size;

    if let Some(resp) = check_body_size(&req, max_body_size) {
        return RouteOutcome::new(resp);
    }

    let query = req.uri().query().map(ToString::to_string);
    let content_type = req
        .headers()
        .get(hyper::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);

    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let body = match Limited::new(req.into_body(), limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is::<LengthLimitError>() => {
            logger::log_warning(&format!("Request body exceeds {max_body_size} bytes"));
            return RouteOutcome::new(http::build_413_response());
        }
        Err(e) => {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            return RouteOutcome::new(http::build_400_response("failed to read request body"));
        }
    };

    let field = &state.config.http.field_name;
    let raw = extract_identifier(body, content_type.as_deref(), query.as_deref(), field).await;

    let id = match raw
        .ok_or_else(|| TranscodeError::MissingField(field.clone()))
        .and_then(|raw| Identifier::parse(&raw).map_err(TranscodeError::from))
    {
        Ok(id) => id,
        Err(e) => {
            logger::log_warning(&format!("Rejected transcode request: {e}"));
            return RouteOutcome::new(error_response(&e, wants_json));
        }
    };

    let mut outcome = match state.transcoder.transcode(&id).await {
        Ok(report) => {
            logger::log_transcoder_output(id.as_str(), &report.output);
            let mut outcome = RouteOutcome::new(report_response(&report, wants_json));
            outcome.exit_code = report.exit_code;
            outcome
        }
        Err(e) => RouteOutcome::new(error_response(&e, wants_json)),
    };
    outcome.identifier = Some(id.as_str().to_string());
    outcome
}

/// Form body field first, then the query string
async fn extract_identifier(
    body: Bytes,
    content_type: Option<&str>,
    query: Option<&str>,
    field: &str,
) -> Option<String> {
    let encoding = content_type.and_then(FormEncoding::from_content_type);
    let from_body = match (encoding, content_type) {
        (Some(FormEncoding::UrlEncoded), _) => {
            form::find_field(&String::from_utf8_lossy(&body), field)
        }
        (Some(FormEncoding::Multipart), Some(ct)) => {
            match form::find_multipart_field(body, ct, field).await {
                Ok(value) => value,
                Err(e) => {
                    logger::log_warning(&format!("Malformed multipart body: {e}"));
                    None
                }
            }
        }
        _ => None,
    };
    from_body.or_else(|| query.and_then(|q| form::find_field(q, field)))
}

fn accepts_json<B>(req: &Request<B>) -> bool {
    req.headers()
        .get(hyper::header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"))
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let size_str = req
        .headers()
        .get(hyper::header::CONTENT_LENGTH)?
        .to_str()
        .ok()?;
    match size_str.parse::<u64>() {
        Ok(size) if size > max_body_size => {
            logger::log_warning(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            Some(http::build_413_response())
        }
        _ => None,
    }
}

fn report_response(report: &TranscodeReport, json: bool) -> Response<Full<Bytes>> {
    let resp = if json {
        http::build_json_response(StatusCode::OK, report)
    } else {
        http::build_text_response(StatusCode::OK, report.to_text())
    };
    http::with_exit_code(resp, report.exit_code)
}

const fn status_for(err: &TranscodeError) -> StatusCode {
    match err {
        TranscodeError::InvalidIdentifier(_) | TranscodeError::MissingField(_) => {
            StatusCode::BAD_REQUEST
        }
        TranscodeError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        TranscodeError::Spawn(_) | TranscodeError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: &TranscodeError, json: bool) -> Response<Full<Bytes>> {
    let status = status_for(err);
    match err {
        TranscodeError::Timeout {
            command, partial, ..
        } => {
            if json {
                http::build_json_response(
                    status,
                    &serde_json::json!({
                        "error": err.to_string(),
                        "command": command,
                        "output": partial,
                    }),
                )
            } else {
                let mut body = render_lines(command, partial);
                body.push_str(&err.to_string());
                body.push('\n');
                http::build_text_response(status, body)
            }
        }
        _ if json => http::build_json_error(status, &err.to_string()),
        TranscodeError::InvalidIdentifier(_) | TranscodeError::MissingField(_) => {
            http::build_400_response(&err.to_string())
        }
        _ => http::build_text_response(status, format!("{err}\n")),
    }
}
