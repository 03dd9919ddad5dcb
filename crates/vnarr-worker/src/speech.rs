//! Spoken narration.
//!
//! Narration text is synthesized once, stored as MP3 and the public URL
//! cached under the raw text with no expiry.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, warn};

use vnarr_cache::CaptionCache;
use vnarr_models::keys::speech_key;
use vnarr_models::CaptionResult;
use vnarr_storage::ObjectStore;

use crate::error::{WorkerError, WorkerResult};

pub const DEFAULT_SPEECH_MODEL: &str = "eleven_turbo_v2";
pub const DEFAULT_SPEECH_BASE_URL: &str = "https://api.elevenlabs.io";

const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

/// Text-to-speech configuration.
#[derive(Clone)]
pub struct SpeechConfig {
    pub api_key: Option<String>,
    pub voice_id: Option<String>,
    pub model_id: String,
    pub base_url: String,
}

impl std::fmt::Debug for SpeechConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("voice_id", &self.voice_id)
            .field("model_id", &self.model_id)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            voice_id: None,
            model_id: DEFAULT_SPEECH_MODEL.to_string(),
            base_url: DEFAULT_SPEECH_BASE_URL.to_string(),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

impl SpeechConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: non_empty_var("XI_API_KEY"),
            voice_id: non_empty_var("XI_VOICE_ID"),
            model_id: non_empty_var("XI_MODEL_ID").unwrap_or(defaults.model_id),
            base_url: non_empty_var("XI_BASE_URL").unwrap_or(defaults.base_url),
        }
    }
}

/// Drop double quotes, single quotes and newlines.
pub fn sanitize_narration(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '"' | '\'' | '\n'))
        .collect()
}

/// Turns text into audio bytes.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> WorkerResult<Vec<u8>>;
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model_id: &'a str,
    text: &'a str,
}

/// ElevenLabs text-to-speech client.
#[derive(Clone)]
pub struct ElevenLabsClient {
    client: Client,
    config: SpeechConfig,
}

impl ElevenLabsClient {
    pub fn new(client: Client, config: SpeechConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    async fn synthesize(&self, text: &str) -> WorkerResult<Vec<u8>> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| WorkerError::config_error("XI_API_KEY is not set"))?;
        let voice_id = self
            .config
            .voice_id
            .as_deref()
            .ok_or_else(|| WorkerError::config_error("XI_VOICE_ID is not set"))?;

        let url = format!(
            "{}/v1/text-to-speech/{}",
            self.config.base_url.trim_end_matches('/'),
            voice_id
        );

        let response = self
            .client
            .post(&url)
            .header("Accept", AUDIO_CONTENT_TYPE)
            .header("xi-api-key", api_key)
            .json(&SpeechRequest {
                model_id: &self.config.model_id,
                text,
            })
            .send()
            .await
            .map_err(|e| WorkerError::speech_failed(e.to_string()))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(WorkerError::speech_failed(format!("HTTP {}: {}", status, body)));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| WorkerError::speech_failed(e.to_string()))?;
        Ok(audio.to_vec())
    }
}

/// Cached narration-to-audio service.
#[derive(Clone)]
pub struct NarrationSpeech {
    cache: Arc<dyn CaptionCache>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    store: Arc<dyn ObjectStore>,
}

impl NarrationSpeech {
    pub fn new(
        cache: Arc<dyn CaptionCache>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            cache,
            synthesizer,
            store,
        }
    }

    /// Public URL of the spoken `narration` for `video_key`.
    ///
    /// Returns `Ok(None)` when the audio was synthesized but could not be stored.
    pub async fn narrate(&self, narration: &str, video_key: &str) -> WorkerResult<Option<String>> {
        if let Some(cached) = self.cache.get(narration).await? {
            debug!(video_key = %video_key, "Speech cache hit");
            return Ok(Some(cached.text));
        }

        let audio = self
            .synthesizer
            .synthesize(&sanitize_narration(narration))
            .await?;

        let key = speech_key(video_key, chrono::Utc::now().timestamp_millis());
        if let Err(e) = self.store.put_bytes(&key, audio, AUDIO_CONTENT_TYPE).await {
            metrics::counter!("vnarr_upload_failures_total").increment(1);
            warn!(key = %key, error = %e, "Failed to store narration audio");
            return Ok(None);
        }

        let url = self.store.public_url(&key);
        self.cache
            .set(&CaptionResult::new(narration, url.as_str(), None))
            .await?;

        info!(video_key = %video_key, url = %url, "Narration audio stored");
        Ok(Some(url))
    }
}
