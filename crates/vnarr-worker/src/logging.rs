//! Structured run logging.

use tracing::{error, info, warn, Span};

/// Logs the lifecycle of one pipeline run with consistent fields.
#[derive(Debug, Clone)]
pub struct RunLogger {
    run_id: String,
    video_key: String,
    operation: String,
}

impl RunLogger {
    /// Create a logger for a run over `video_key`.
    pub fn new(video_key: &str, operation: &str) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            video_key: video_key.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            video_key = %self.video_key,
            operation = %self.operation,
            "Run started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            video_key = %self.video_key,
            operation = %self.operation,
            "Run progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            run_id = %self.run_id,
            video_key = %self.video_key,
            operation = %self.operation,
            "Run warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            run_id = %self.run_id,
            video_key = %self.video_key,
            operation = %self.operation,
            "Run error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            video_key = %self.video_key,
            operation = %self.operation,
            "Run completed: {}", message
        );
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn video_key(&self) -> &str {
        &self.video_key
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span carrying the run's identifying fields.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "run",
            run_id = %self.run_id,
            video_key = %self.video_key,
            operation = %self.operation
        )
    }
}
