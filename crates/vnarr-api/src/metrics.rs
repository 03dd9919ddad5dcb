//! Prometheus metrics for the API server.

use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names.
pub mod names {
    pub const HTTP_REQUESTS_TOTAL: &str = "vnarr_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "vnarr_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "vnarr_http_requests_in_flight";

    pub const WS_CONNECTIONS_TOTAL: &str = "vnarr_ws_connections_total";
    pub const WS_MESSAGES_SENT: &str = "vnarr_ws_messages_sent_total";

    pub const RUNS_STARTED_TOTAL: &str = "vnarr_runs_started_total";
    pub const RUNS_FAILED_TOTAL: &str = "vnarr_runs_failed_total";
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_ws_connection() {
    counter!(names::WS_CONNECTIONS_TOTAL).increment(1);
}

pub fn record_ws_messages_sent(count: usize) {
    counter!(names::WS_MESSAGES_SENT).increment(count as u64);
}

pub fn record_run_started() {
    counter!(names::RUNS_STARTED_TOTAL).increment(1);
}

pub fn record_run_failed() {
    counter!(names::RUNS_FAILED_TOTAL).increment(1);
}

/// Collapse per-video path segments so label cardinality stays bounded.
fn sanitize_path(path: &str) -> String {
    match path.strip_prefix("/ws/progress/") {
        Some(_) => "/ws/progress/:key".to_string(),
        None => path.to_string(),
    }
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );

    response
}
