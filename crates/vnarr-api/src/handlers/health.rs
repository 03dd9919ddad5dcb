//! Health and environment checks.

use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use vnarr_worker::missing_env_vars;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Liveness probe.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Report whether every required environment variable is set.
pub async fn env_check() -> (StatusCode, String) {
    env_report(&missing_env_vars())
}

fn env_report(missing: &[&str]) -> (StatusCode, String) {
    if missing.is_empty() {
        (StatusCode::OK, "All env vars are set".to_string())
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Missing env vars: {}", missing.join(", ")),
        )
    }
}
