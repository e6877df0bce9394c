//! Service middleware for request logging and metrics.
//!
//! ## Metrics Exposed
//!
//! - `request_metric` events (target `filmgraph::metrics`) with the
//!   normalized path, method, status and latency.

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use regex_lite::Regex;
use std::sync::OnceLock;
use std::time::Instant;
use tracing::{info, info_span, Instrument};

/// Header carrying the request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Metrics middleware that records request counts and latency.
///
/// Uses tracing events; aggregate them from logs.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = normalize_path(request.uri().path());

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status().as_u16();

    info!(
        target: "filmgraph::metrics",
        metric_type = "request",
        path = %path,
        method = %method,
        status = status,
        latency_ms = latency.as_millis() as u64,
        "request_metric"
    );

    response
}

/// Request logging middleware that adds a correlation id and timing.
///
/// Reuses an incoming `X-Request-Id` or generates a UUID, runs the
/// request inside a span carrying it, and echoes it on the response.
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let method = request.method().clone();
    let uri = request.uri().path().to_string();

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %uri,
        status = tracing::field::Empty,
        latency_ms = tracing::field::Empty,
    );

    let mut response = next.run(request).instrument(span.clone()).await;

    let latency = start.elapsed();
    let status = response.status().as_u16();

    span.record("status", status);
    span.record("latency_ms", latency.as_millis() as u64);

    info!(
        target: "filmgraph::access",
        request_id = %request_id,
        method = %method,
        path = %uri,
        status = status,
        latency_ms = latency.as_millis() as u64,
        "request completed"
    );

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

fn id_segment() -> &'static Regex {
    static ID_SEGMENT: OnceLock<Regex> = OnceLock::new();
    ID_SEGMENT.get_or_init(|| Regex::new(r"^-?[0-9]+$").expect("id segment pattern is valid"))
}

/// Normalize path for metrics to avoid high cardinality.
///
/// Replaces numeric path segments with `:id`.
fn normalize_path(path: &str) -> String {
    let re = id_segment();
    path.split('/')
        .map(|segment| if re.is_match(segment) { ":id" } else { segment })
        .collect::<Vec<_>>()
        .join("/")
}
