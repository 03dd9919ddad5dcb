//! Ollama-compatible HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use crate::error::{VisionError, VisionResult};
use crate::types::{ChatReply, ChatRequest, ChatResponse, ModelInfo, TagsResponse};

pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
pub const DEFAULT_VISION_MODEL: &str = "llava";

/// Vision client configuration.
#[derive(Debug, Clone)]
pub struct VisionConfig {
    /// Inference server base URL
    pub host: String,
    /// Model used when the caller does not name one
    pub default_model: String,
    /// Per-request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_OLLAMA_HOST.to_string(),
            default_model: DEFAULT_VISION_MODEL.to_string(),
            timeout: None,
        }
    }
}

impl VisionConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("OLLAMA_HOST")
                .ok()
                .filter(|h| !h.is_empty())
                .unwrap_or(defaults.host),
            default_model: std::env::var("VISION_DEFAULT_MODEL")
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or(defaults.default_model),
            timeout: std::env::var("VISION_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs),
        }
    }

    /// The caller's model, or the configured default when blank.
    pub fn resolve_model<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        match requested.map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => &self.default_model,
        }
    }
}

/// A chat-style model that accepts images.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Send one non-streaming chat request and return the validated reply.
    async fn chat(&self, request: ChatRequest) -> VisionResult<ChatReply>;
}

/// Client for an Ollama server.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    config: VisionConfig,
}

impl OllamaClient {
    pub fn new(config: VisionConfig) -> VisionResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| VisionError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn from_env() -> VisionResult<Self> {
        Self::new(VisionConfig::from_env())
    }

    pub fn config(&self) -> &VisionConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.host.trim_end_matches('/'), path)
    }

    /// Names of installed models whose families include `clip`.
    pub async fn list_vision_models(&self) -> VisionResult<Vec<String>> {
        let response = self.client.get(self.endpoint("/api/tags")).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VisionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| VisionError::invalid_response(format!("Malformed model list: {}", e)))?;

        let names: Vec<String> = tags
            .models
            .into_iter()
            .filter(ModelInfo::is_vision_capable)
            .map(|m| m.name)
            .collect();

        debug!(count = names.len(), "Listed vision models");
        Ok(names)
    }
}

#[async_trait]
impl VisionModel for OllamaClient {
    async fn chat(&self, request: ChatRequest) -> VisionResult<ChatReply> {
        info!(model = %request.model, messages = request.messages.len(), "Calling vision model");

        let response = self
            .client
            .post(self.endpoint("/api/chat"))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VisionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| VisionError::invalid_response(format!("Malformed chat response: {}", e)))?;

        let reply = body.validate()?;
        debug!(chars = reply.text.len(), "Vision model replied");
        Ok(reply)
    }
}
