//! Wiring of production collaborators.

use std::sync::Arc;

use reqwest::Client;
use tracing::info;

use vnarr_cache::{CacheConfig, ProgressChannel, RedisCaptionCache};
use vnarr_storage::{S3Store, StorageConfig};
use vnarr_vision::{OllamaClient, VisionConfig};

use crate::captioner::{HttpImageFetcher, NarrativeCaptioner};
use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::extractor::FfmpegExtractor;
use crate::pipeline::NarrationPipeline;
use crate::speech::{ElevenLabsClient, NarrationSpeech, SpeechConfig};

/// Everything a process needs to run narrations.
#[derive(Clone)]
pub struct Services {
    pub pipeline: NarrationPipeline,
    pub speech: NarrationSpeech,
    pub vision: OllamaClient,
    pub store: Arc<S3Store>,
    pub progress: ProgressChannel,
}

impl Services {
    /// Build every client from environment variables.
    pub fn from_env() -> WorkerResult<Self> {
        let worker = WorkerConfig::from_env();
        let storage = StorageConfig::from_env()?;
        let cache = CacheConfig::from_env();
        let vision = VisionConfig::from_env();
        let speech = SpeechConfig::from_env();

        info!(worker = ?worker, storage = ?storage, vision = ?vision, speech = ?speech, "Loaded configuration");
        Self::new(worker, storage, cache, vision, speech)
    }

    pub fn new(
        worker: WorkerConfig,
        storage: StorageConfig,
        cache: CacheConfig,
        vision: VisionConfig,
        speech: SpeechConfig,
    ) -> WorkerResult<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| WorkerError::config_error(format!("Failed to build HTTP client: {}", e)))?;

        let store = Arc::new(S3Store::new(storage));
        let captions = Arc::new(RedisCaptionCache::new(&cache)?);
        let progress = ProgressChannel::new(&cache.redis_url)?;
        let vision = OllamaClient::new(vision)?;

        let captioner = NarrativeCaptioner::new(
            captions.clone(),
            Arc::new(vision.clone()),
            Arc::new(HttpImageFetcher::new(http.clone())),
            worker.caption_ttl_secs,
        );

        let pipeline = NarrationPipeline::new(
            worker,
            store.clone(),
            Arc::new(progress.clone()),
            Arc::new(FfmpegExtractor),
            captioner,
            http.clone(),
        );

        let speech = NarrationSpeech::new(
            captions,
            Arc::new(ElevenLabsClient::new(http, speech)),
            store.clone(),
        );

        Ok(Self {
            pipeline,
            speech,
            vision,
            store,
            progress,
        })
    }
}
