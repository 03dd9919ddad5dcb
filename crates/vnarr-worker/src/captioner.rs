//! Narrative captioning of collages.
//!
//! Each collage is described by a vision model in the light of everything
//! said about the video so far. Results are cached by collage URL; a cached
//! caption is returned as stored even if the running context has moved on.

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use tracing::{debug, info};

use vnarr_cache::CaptionCache;
use vnarr_models::CaptionResult;
use vnarr_vision::{ChatMessage, ChatRequest, VisionModel};

use crate::context::NarrativeContext;
use crate::error::{WorkerError, WorkerResult};

/// Persona given to the model ahead of every collage.
pub const SYSTEM_PERSONA: &str = "You are a witty narrator delivering an intellectual roast of whatever \
     you are shown. Stay sharp and playful, reference what is actually visible, and keep it to a few sentences.";

/// Prompt for one collage given the narration so far.
pub fn build_prompt(context: &str) -> String {
    format!(
        "The image is a collage of consecutive frames from one video, read left to right, \
         top to bottom. Continue the narration for these frames without repeating yourself.\n\
         Narration so far:\n{}",
        context
    )
}

/// Fetches raw image bytes by URL.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> WorkerResult<Vec<u8>>;
}

/// [`ImageFetcher`] over plain HTTP.
#[derive(Clone, Default)]
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> WorkerResult<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| WorkerError::image_fetch_failed(format!("{}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(WorkerError::image_fetch_failed(format!(
                "{}: HTTP {}",
                url,
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| WorkerError::image_fetch_failed(format!("{}: {}", url, e)))?;
        Ok(bytes.to_vec())
    }
}

/// One caption and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caption {
    pub text: String,
    pub from_cache: bool,
}

/// Produces context-aware captions for collage images.
#[derive(Clone)]
pub struct NarrativeCaptioner {
    cache: Arc<dyn CaptionCache>,
    vision: Arc<dyn VisionModel>,
    fetcher: Arc<dyn ImageFetcher>,
    ttl_secs: u64,
}

impl NarrativeCaptioner {
    pub fn new(
        cache: Arc<dyn CaptionCache>,
        vision: Arc<dyn VisionModel>,
        fetcher: Arc<dyn ImageFetcher>,
        ttl_secs: u64,
    ) -> Self {
        Self {
            cache,
            vision,
            fetcher,
            ttl_secs,
        }
    }

    /// Caption the image at `image_url`.
    ///
    /// The caller appends the returned text to `context` before the next call.
    /// Fetch, inference and cache failures propagate; nothing is retried.
    pub async fn caption(
        &self,
        image_url: &str,
        context: &NarrativeContext,
        model: &str,
    ) -> WorkerResult<Caption> {
        if let Some(cached) = self.cache.get(image_url).await? {
            metrics::counter!("vnarr_caption_cache_hits_total").increment(1);
            debug!(image_url = %image_url, "Caption cache hit");
            return Ok(Caption {
                text: cached.text,
                from_cache: true,
            });
        }
        metrics::counter!("vnarr_caption_cache_misses_total").increment(1);

        let bytes = self.fetcher.fetch(image_url).await?;
        let image = STANDARD.encode(&bytes);

        let request = ChatRequest::new(
            model,
            vec![
                ChatMessage::system(SYSTEM_PERSONA),
                ChatMessage::user(build_prompt(context.as_str())).with_images(vec![image]),
            ],
        );

        info!(image_url = %image_url, model = %model, context_captions = context.len(), "Captioning collage");
        let reply = self.vision.chat(request).await?;

        self.cache
            .set(&CaptionResult::new(image_url, reply.text.as_str(), Some(self.ttl_secs)))
            .await?;

        Ok(Caption {
            text: reply.text,
            from_cache: false,
        })
    }
}
