//! Vision model client.
//!
//! Talks to an Ollama-compatible inference server:
//! - `POST /api/chat` for image captioning
//! - `GET /api/tags` for discovering vision-capable models

pub mod client;
pub mod error;
pub mod types;

pub use client::{OllamaClient, VisionConfig, VisionModel, DEFAULT_OLLAMA_HOST, DEFAULT_VISION_MODEL};
pub use error::{VisionError, VisionResult};
pub use types::{ChatMessage, ChatReply, ChatRequest, ChatResponse, ModelInfo, Role};
