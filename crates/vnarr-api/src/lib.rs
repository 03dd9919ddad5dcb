//! Axum HTTP API server.
//!
//! This crate provides:
//! - Narration runs for stored videos, with progress over WebSocket
//! - Captioning of live capture frames
//! - Video catalog, vision model discovery and spoken narration
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod ws;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
