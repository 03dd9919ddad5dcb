//! Application state.

use vnarr_worker::{Services, WorkerResult};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub services: Services,
}

impl AppState {
    /// Create new application state.
    pub fn new(config: ApiConfig) -> WorkerResult<Self> {
        let services = Services::from_env()?;
        Ok(Self { config, services })
    }
}
