//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use vnarr_media::MediaError;
use vnarr_worker::WorkerError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] vnarr_storage::StorageError),

    #[error("Vision model error: {0}")]
    Vision(#[from] vnarr_vision::VisionError),

    #[error("Cache error: {0}")]
    Cache(#[from] vnarr_cache::CacheError),

    #[error("{0}")]
    Worker(#[from] WorkerError),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Vision(_) => StatusCode::BAD_GATEWAY,
            ApiError::Storage(_) | ApiError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Worker(e) => match e {
                WorkerError::Media(MediaError::InvalidImageData { .. })
                | WorkerError::Media(MediaError::BatchSize { .. }) => StatusCode::BAD_REQUEST,
                WorkerError::NoFrames { .. } | WorkerError::NoCollages { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                WorkerError::Vision(_) | WorkerError::SpeechFailed(_) | WorkerError::ImageFetchFailed(_) => {
                    StatusCode::BAD_GATEWAY
                }
                WorkerError::ConfigError(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Whether the message may reveal internals.
    fn is_internal(&self) -> bool {
        self.status_code() == StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let production = std::env::var("ENVIRONMENT")
            .map(|e| e.eq_ignore_ascii_case("production"))
            .unwrap_or(false);
        let detail = if self.is_internal() && production {
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorResponse { detail })).into_response()
    }
}
