//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: route matching, method
//! validation and access logging.

use crate::config::AppState;
use crate::handler::transcode;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

const LIVENESS_PATH: &str = "/healthz";
const READINESS_PATH: &str = "/readyz";

/// Response plus what the access log wants to know about it
pub struct RouteOutcome {
    pub response: Response<Full<Bytes>>,
    pub identifier: Option<String>,
    pub exit_code: Option<i32>,
}

impl RouteOutcome {
    pub const fn new(response: Response<Full<Bytes>>) -> Self {
        Self {
            response,
            identifier: None,
            exit_code: None,
        }
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    let access_log = state.access_log_enabled();

    let mut entry = access_log.then(|| {
        let mut entry = AccessLogEntry::new(
            remote_addr.to_string(),
            req.method().to_string(),
            req.uri().path().to_string(),
        );
        entry.query = req.uri().query().map(ToString::to_string);
        entry.http_version = version_str(req.version()).to_string();
        entry.user_agent = req
            .headers()
            .get(hyper::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        entry
    });

    logger::log_debug(&format!("{} {} from {remote_addr}", req.method(), req.uri()));

    let outcome = route_request(req, &state).await;
    let response = http::with_server_name(outcome.response, &state.config.http.server_name);

    if let Some(entry) = entry.as_mut() {
        entry.status = response.status().as_u16();
        entry.body_bytes = usize::try_from(response.body().size_hint().exact().unwrap_or(0))
            .unwrap_or(usize::MAX);
        entry.identifier = outcome.identifier;
        entry.exit_code = outcome.exit_code;
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Route request based on path and method
async fn route_request<B>(req: Request<B>, state: &AppState) -> RouteOutcome
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    let path = req.uri().path();

    // Health check endpoints (always fast)
    if state.config.http.health_enabled && (path == LIVENESS_PATH || path == READINESS_PATH) {
        if !matches!(method, Method::GET | Method::HEAD) {
            return RouteOutcome::new(http::build_405_response("GET, HEAD"));
        }
        let resp = if path == LIVENESS_PATH {
            http::build_health_response(StatusCode::OK, "ok")
        } else {
            readiness(state).await
        };
        return RouteOutcome::new(resp);
    }

    if path != state.config.http.transcode_path {
        return RouteOutcome::new(http::build_404_response());
    }

    match method {
        Method::POST => transcode::handle_transcode(req, state).await,
        Method::OPTIONS => RouteOutcome::new(http::build_options_response(http::TRANSCODE_ALLOW)),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            RouteOutcome::new(http::build_405_response(http::TRANSCODE_ALLOW))
        }
    }
}

/// Ready once the recordings directory is reachable
async fn readiness(state: &AppState) -> Response<Full<Bytes>> {
    let root = &state.transcoder.config().source_root;
    match tokio::fs::metadata(root).await {
        Ok(meta) if meta.is_dir() => http::build_health_response(StatusCode::OK, "ok"),
        _ => {
            logger::log_warning(&format!(
                "Readiness check failed: source root '{}' unavailable",
                root.display()
            ));
            http::build_health_response(StatusCode::SERVICE_UNAVAILABLE, "source root unavailable")
        }
    }
}

const fn version_str(version: hyper::Version) -> &'static str {
    match version {
        hyper::Version::HTTP_09 => "0.9",
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        hyper::Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
