//! Narration pipeline.
//!
//! One run takes a video from nothing (or from previously rendered
//! collages) to a finished narrative:
//!
//! ```text
//! INIT ─┬─ collages exist ──> RESUME_FROM_COLLAGES ───────────────────────┐
//!       └─ none ─> DOWNLOAD ─> EXTRACT_FRAMES ─> BATCH_AND_CAPTION ──────┴─> DONE (END)
//! ```
//!
//! Batches are captioned strictly one after another; each caption sees the
//! captions of every batch before it.

use std::path::Path;
use std::sync::Arc;

use reqwest::Client;
use tracing::{warn, Instrument};

use vnarr_cache::{ProgressChannel, ProgressPublisher};
use vnarr_media::{has_frames, list_frames};
use vnarr_models::{partition_batches, VideoAsset};
use vnarr_storage::{list_collages, ObjectInfo, ObjectStore};

use crate::captioner::NarrativeCaptioner;
use crate::composer::{CollageComposer, CollageInput, UploadOutcome};
use crate::config::WorkerConfig;
use crate::context::NarrativeContext;
use crate::download::ensure_local_video;
use crate::error::{WorkerError, WorkerResult};
use crate::extractor::FrameExtractor;
use crate::logging::RunLogger;

/// Video key used for capture-mode collages when the caller gives none.
pub const DEFAULT_CAPTURE_KEY: &str = "live-capture";

/// Marker between caption and URL in a capture description.
pub const COLLAGE_URL_MARKER: &str = "COLLAGE_URL:";

/// Which branch a run took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPath {
    Resume,
    Fresh,
}

impl RunPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunPath::Resume => "resume",
            RunPath::Fresh => "fresh",
        }
    }
}

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub path: RunPath,
    /// Collage URLs in captioning order
    pub collage_urls: Vec<String>,
    /// Captions in captioning order
    pub captions: Vec<String>,
    /// How many captions were served from the caption cache
    pub cached_captions: usize,
    /// Final running context
    pub narrative: String,
}

/// Caption of a single capture collage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureDescription {
    pub caption: String,
    pub collage_url: String,
}

impl CaptureDescription {
    /// `"{caption}COLLAGE_URL:{url}"`.
    pub fn response_text(&self) -> String {
        format!("{}{}{}", self.caption, COLLAGE_URL_MARKER, self.collage_url)
    }
}

/// Drives narration runs.
#[derive(Clone)]
pub struct NarrationPipeline {
    config: WorkerConfig,
    store: Arc<dyn ObjectStore>,
    publisher: Arc<dyn ProgressPublisher>,
    extractor: Arc<dyn FrameExtractor>,
    captioner: NarrativeCaptioner,
    composer: CollageComposer,
    http: Client,
}

impl NarrationPipeline {
    pub fn new(
        config: WorkerConfig,
        store: Arc<dyn ObjectStore>,
        publisher: Arc<dyn ProgressPublisher>,
        extractor: Arc<dyn FrameExtractor>,
        captioner: NarrativeCaptioner,
        http: Client,
    ) -> Self {
        let composer = CollageComposer::new(
            store.clone(),
            config.layout(),
            config.collages_namespace.clone(),
            config.upload_policy,
        );

        Self {
            config,
            store,
            publisher,
            extractor,
            captioner,
            composer,
            http,
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Run the pipeline for one video.
    ///
    /// Consumers learn that the run finished from the `END` event on the
    /// video's channel; a failed run never publishes it.
    pub async fn run(&self, video: &VideoAsset, model: &str) -> WorkerResult<RunSummary> {
        let logger = RunLogger::new(video.key(), "describe_video");
        let span = logger.create_span();

        async {
            logger.log_start(&format!("model={}", model));

            let existing =
                list_collages(self.store.as_ref(), &self.config.collages_namespace, video.key()).await?;

            let result = if existing.is_empty() {
                self.generate(video, model, &logger).await
            } else {
                logger.log_progress(&format!("found {} existing collages", existing.len()));
                self.caption_existing(video, existing, model, &logger).await
            };

            match &result {
                Ok(summary) => {
                    metrics::counter!("vnarr_pipeline_runs_total", "path" => summary.path.as_str())
                        .increment(1);
                    logger.log_completion(&format!(
                        "{} path, {} captions ({} cached)",
                        summary.path.as_str(),
                        summary.captions.len(),
                        summary.cached_captions
                    ));
                }
                Err(e) => logger.log_error(&e.to_string()),
            }

            result
        }
        .instrument(span)
        .await
    }

    /// Caption the collages already stored for `video`.
    ///
    /// Fails with [`WorkerError::NoCollages`] when there are none.
    pub async fn resume_from_collages(&self, video: &VideoAsset, model: &str) -> WorkerResult<RunSummary> {
        let logger = RunLogger::new(video.key(), "resume");
        let existing =
            list_collages(self.store.as_ref(), &self.config.collages_namespace, video.key()).await?;

        self.caption_existing(video, existing, model, &logger).await
    }

    async fn caption_existing(
        &self,
        video: &VideoAsset,
        collages: Vec<ObjectInfo>,
        model: &str,
        logger: &RunLogger,
    ) -> WorkerResult<RunSummary> {
        if collages.is_empty() {
            return Err(WorkerError::no_collages(video.key()));
        }

        let channel = ProgressChannel::channel_name(video.key());
        let mut context = NarrativeContext::new();
        let mut collage_urls = Vec::with_capacity(collages.len());
        let mut captions = Vec::with_capacity(collages.len());
        let mut cached_captions = 0;

        // Listing order, not collage number.
        for collage in &collages {
            let url = self.store.public_url(&collage.key);
            let caption = self.captioner.caption(&url, &context, model).await?;

            if caption.from_cache {
                cached_captions += 1;
            }
            context.append(&caption.text);
            self.publish(&channel, &caption.text, logger).await;

            collage_urls.push(url);
            captions.push(caption.text);
        }

        self.publish_end(&channel, logger).await;

        Ok(RunSummary {
            path: RunPath::Resume,
            collage_urls,
            captions,
            cached_captions,
            narrative: context.into_inner(),
        })
    }

    async fn generate(&self, video: &VideoAsset, model: &str, logger: &RunLogger) -> WorkerResult<RunSummary> {
        let frames_dir = self.config.frames_dir(video.key());

        if has_frames(&frames_dir).await? {
            logger.log_progress("frames already extracted");
        } else {
            let video_path = self.config.video_path(video.key());
            ensure_local_video(&self.http, &video.source_url, &video_path).await?;

            logger.log_progress("extracting frames");
            if let Err(e) = self
                .extractor
                .extract(&video_path, &frames_dir, self.config.sampling())
                .await
            {
                discard_frames(&frames_dir, logger).await;
                return Err(e);
            }
        }

        let frames = list_frames(&frames_dir).await?;
        if frames.is_empty() {
            return Err(WorkerError::no_frames(video.key()));
        }

        let batches = partition_batches(frames);
        logger.log_progress(&format!("captioning {} batches", batches.len()));

        let channel = ProgressChannel::channel_name(video.key());
        let mut context = NarrativeContext::new();
        let mut collage_urls = Vec::with_capacity(batches.len());
        let mut captions = Vec::with_capacity(batches.len());
        let mut cached_captions = 0;

        for batch in batches {
            let paths = batch.members.into_iter().map(|frame| frame.path).collect();
            let collage = self
                .composer
                .compose_batch(CollageInput::Frames(paths), batch.batch_index, video.key())
                .await?;

            if let UploadOutcome::Failed(reason) = &collage.upload {
                logger.log_warning(&format!("collage {} not stored: {}", collage.key, reason));
            }

            let caption = self.captioner.caption(&collage.url, &context, model).await?;

            if caption.from_cache {
                cached_captions += 1;
            }
            context.append(&caption.text);
            self.publish(&channel, &caption.text, logger).await;

            collage_urls.push(collage.url);
            captions.push(caption.text);
        }

        self.publish_end(&channel, logger).await;

        let narrative = context.as_str().to_string();
        context.clear();

        Ok(RunSummary {
            path: RunPath::Fresh,
            collage_urls,
            captions,
            cached_captions,
            narrative,
        })
    }

    /// Compose one capture collage and caption it with an empty context.
    ///
    /// Nothing is published.
    pub async fn describe_frames(
        &self,
        frames: Vec<String>,
        video_key: Option<&str>,
        model: &str,
    ) -> WorkerResult<CaptureDescription> {
        let video_key = video_key.unwrap_or(DEFAULT_CAPTURE_KEY);
        let collage = self
            .composer
            .compose_batch(CollageInput::Capture(frames), 0, video_key)
            .await?;

        let caption = self
            .captioner
            .caption(&collage.url, &NarrativeContext::new(), model)
            .await?;

        Ok(CaptureDescription {
            caption: caption.text,
            collage_url: collage.url,
        })
    }

    async fn publish(&self, channel: &str, message: &str, logger: &RunLogger) {
        if let Err(e) = self.publisher.publish_message(channel, message).await {
            logger.log_warning(&format!("progress publish failed: {}", e));
        }
    }

    async fn publish_end(&self, channel: &str, logger: &RunLogger) {
        if let Err(e) = self.publisher.publish_end(channel).await {
            warn!(channel = %channel, error = %e, "Failed to publish END");
            logger.log_warning("END sentinel not published");
        }
    }
}

/// Remove whatever a failed extraction left behind.
async fn discard_frames(frames_dir: &Path, logger: &RunLogger) {
    match tokio::fs::remove_dir_all(frames_dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => logger.log_warning(&format!(
            "failed to discard partial frames in {}: {}",
            frames_dir.display(),
            e
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        png_base64, write_frames, EmptyExtractor, FlakyExtractor, MemoryCache, MemoryStore,
        RecordingPublisher, ScriptedVision, StaticFetcher,
    };
    use crate::config::UploadPolicy;
    use vnarr_cache::CaptionCache;
    use vnarr_media::CollageLayout;
    use vnarr_models::CaptionResult;

    struct Harness {
        _work: tempfile::TempDir,
        config: WorkerConfig,
        store: Arc<MemoryStore>,
        cache: Arc<MemoryCache>,
        vision: Arc<ScriptedVision>,
        publisher: Arc<RecordingPublisher>,
    }

    impl Harness {
        fn new<I, S>(replies: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            let work = tempfile::tempdir().unwrap();
            let layout = CollageLayout {
                cell_width: 12,
                cell_height: 8,
                jpeg_quality: 70,
            };
            let config = WorkerConfig {
                work_dir: work.path().to_path_buf(),
                cell_width: layout.cell_width,
                cell_height: layout.cell_height,
                jpeg_quality: layout.jpeg_quality,
                upload_policy: UploadPolicy::BestEffort,
                ..WorkerConfig::default()
            };

            Self {
                _work: work,
                config,
                store: Arc::new(MemoryStore::new("https://bucket.example")),
                cache: Arc::new(MemoryCache::default()),
                vision: Arc::new(ScriptedVision::new(replies)),
                publisher: Arc::new(RecordingPublisher::default()),
            }
        }

        fn pipeline(&self) -> NarrationPipeline {
            self.pipeline_with(Arc::new(EmptyExtractor))
        }

        fn pipeline_with(&self, extractor: Arc<dyn FrameExtractor>) -> NarrationPipeline {
            let captioner = NarrativeCaptioner::new(
                self.cache.clone(),
                self.vision.clone(),
                Arc::new(StaticFetcher::new(b"collage")),
                self.config.caption_ttl_secs,
            );
            NarrationPipeline::new(
                self.config.clone(),
                self.store.clone(),
                self.publisher.clone(),
                extractor,
                captioner,
                Client::new(),
            )
        }

        fn seed_frames(&self, key: &str, count: usize) {
            write_frames(&self.config.frames_dir(key), count);
        }

        fn seed_video(&self, key: &str) {
            let path = self.config.video_path(key);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, b"not really a video").unwrap();
        }
    }

    fn video(key: &str) -> VideoAsset {
        VideoAsset::new(format!("https://videos.example/{}", key), key).unwrap()
    }

    #[tokio::test]
    async fn test_fresh_run_thirteen_frames() {
        let harness = Harness::new(["one", "two", "three"]);
        harness.seed_frames("cat.mp4", 13);

        let summary = harness.pipeline().run(&video("cat.mp4"), "llava").await.unwrap();

        assert_eq!(summary.path, RunPath::Fresh);
        assert_eq!(
            harness.store.keys(),
            vec![
                "collages/cat.mp4/collage-1.jpg",
                "collages/cat.mp4/collage-2.jpg",
                "collages/cat.mp4/collage-3.jpg",
            ]
        );
        assert_eq!(summary.captions, vec!["one", "two", "three"]);
        assert_eq!(summary.narrative, "one\ntwo\nthree\n");
        assert_eq!(summary.cached_captions, 0);

        let payloads = harness.publisher.payloads("cat.mp4");
        assert_eq!(payloads, vec!["one", "two", "three", "END"]);
    }

    #[tokio::test]
    async fn test_failed_extraction_leaves_no_frames_for_next_run() {
        let harness = Harness::new(["from all frames"]);
        harness.seed_video("bad.mp4");
        let extractor = Arc::new(FlakyExtractor::new(4));
        let pipeline = harness.pipeline_with(extractor.clone());

        let err = pipeline.run(&video("bad.mp4"), "llava").await.unwrap_err();
        assert!(matches!(
            err,
            WorkerError::Media(vnarr_media::MediaError::Extraction { .. })
        ));
        assert!(!harness.config.frames_dir("bad.mp4").exists());
        assert!(harness.store.keys().is_empty());
        assert!(harness.publisher.payloads("bad.mp4").is_empty());

        let summary = pipeline.run(&video("bad.mp4"), "llava").await.unwrap();
        assert_eq!(extractor.calls(), 2);
        assert_eq!(summary.path, RunPath::Fresh);
        assert_eq!(summary.captions, vec!["from all frames"]);
        assert_eq!(harness.publisher.payloads("bad.mp4"), vec!["from all frames", "END"]);
    }

    #[tokio::test]
    async fn test_context_accumulates_between_batches() {
        let harness = Harness::new(["first", "second", "third"]);
        harness.seed_frames("dog.mp4", 18);

        harness.pipeline().run(&video("dog.mp4"), "llava").await.unwrap();

        let prompts: Vec<String> = harness
            .vision
            .requests()
            .into_iter()
            .map(|r| r.messages[1].content.clone())
            .collect();
        assert_eq!(prompts.len(), 3);
        assert!(prompts[0].ends_with("Narration so far:\n"));
        assert!(prompts[1].ends_with("Narration so far:\nfirst\n"));
        assert!(prompts[2].ends_with("Narration so far:\nfirst\nsecond\n"));
    }

    #[tokio::test]
    async fn test_resume_uses_listing_order() {
        let harness = Harness::new(["about two", "about one"]);
        harness.store.insert("collages/cat.mp4/collage-2.jpg", b"jpeg");
        harness.store.insert("collages/cat.mp4/collage-1.jpg", b"jpeg");

        let summary = harness.pipeline().run(&video("cat.mp4"), "llava").await.unwrap();

        assert_eq!(summary.path, RunPath::Resume);
        assert_eq!(
            summary.collage_urls,
            vec![
                "https://bucket.example/collages/cat.mp4/collage-2.jpg",
                "https://bucket.example/collages/cat.mp4/collage-1.jpg",
            ]
        );
        assert_eq!(summary.narrative, "about two\nabout one\n");
        assert_eq!(
            harness.publisher.payloads("cat.mp4"),
            vec!["about two", "about one", "END"]
        );

        let prompts = harness.vision.requests();
        assert!(prompts[1].messages[1].content.ends_with("about two\n"));
    }

    #[tokio::test]
    async fn test_resume_with_cache_hits_still_emits_every_event() {
        let harness = Harness::new(["fresh caption"]);
        harness.store.insert("collages/cat.mp4/collage-1.jpg", b"jpeg");
        harness.store.insert("collages/cat.mp4/collage-2.jpg", b"jpeg");
        harness
            .cache
            .set(&CaptionResult::new(
                "https://bucket.example/collages/cat.mp4/collage-1.jpg",
                "cached caption",
                None,
            ))
            .await
            .unwrap();

        let summary = harness.pipeline().run(&video("cat.mp4"), "llava").await.unwrap();

        assert_eq!(summary.captions, vec!["cached caption", "fresh caption"]);
        assert_eq!(summary.cached_captions, 1);
        assert_eq!(harness.vision.calls(), 1);
        assert_eq!(
            harness.publisher.payloads("cat.mp4"),
            vec!["cached caption", "fresh caption", "END"]
        );
    }

    #[tokio::test]
    async fn test_zero_frames_fails_without_events() {
        let harness = Harness::new(Vec::<String>::new());
        harness.seed_video("empty.mp4");

        let err = harness.pipeline().run(&video("empty.mp4"), "llava").await.unwrap_err();

        assert!(matches!(err, WorkerError::NoFrames { .. }));
        assert!(harness.publisher.events().is_empty());
    }

    #[tokio::test]
    async fn test_resume_without_collages() {
        let harness = Harness::new(Vec::<String>::new());

        let err = harness
            .pipeline()
            .resume_from_collages(&video("cat.mp4"), "llava")
            .await
            .unwrap_err();

        assert!(matches!(err, WorkerError::NoCollages { .. }));
        assert!(harness.publisher.events().is_empty());
    }

    #[tokio::test]
    async fn test_failed_caption_publishes_no_end() {
        let harness = Harness::new(["only one"]);
        harness.seed_frames("cat.mp4", 7);

        let err = harness.pipeline().run(&video("cat.mp4"), "llava").await.unwrap_err();

        assert!(matches!(err, WorkerError::Vision(_)));
        assert_eq!(harness.publisher.payloads("cat.mp4"), vec!["only one"]);
    }

    #[tokio::test]
    async fn test_upload_failure_does_not_abort_run() {
        let harness = Harness::new(["still narrated"]);
        harness.seed_frames("cat.mp4", 3);
        harness.store.fail_puts(true);

        let summary = harness.pipeline().run(&video("cat.mp4"), "llava").await.unwrap();

        assert_eq!(summary.captions, vec!["still narrated"]);
        assert_eq!(harness.publisher.payloads("cat.mp4"), vec!["still narrated", "END"]);
    }

    #[tokio::test]
    async fn test_concurrent_runs_keep_separate_context() {
        let harness = Harness::new(["a1", "b1", "a2", "b2"]);
        harness.seed_frames("a.mp4", 12);
        harness.seed_frames("b.mp4", 12);
        let pipeline = harness.pipeline();

        let (video_a, video_b) = (video("a.mp4"), video("b.mp4"));

        let (a, b) = tokio::join!(
            pipeline.run(&video_a, "llava"),
            pipeline.run(&video_b, "llava")
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(a.captions.len(), 2);
        assert_eq!(b.captions.len(), 2);
        assert_eq!(a.narrative, format!("{}\n{}\n", a.captions[0], a.captions[1]));
        assert_eq!(b.narrative, format!("{}\n{}\n", b.captions[0], b.captions[1]));
        for caption in &a.captions {
            assert!(!b.captions.contains(caption));
        }
    }

    #[tokio::test]
    async fn test_describe_frames() {
        let harness = Harness::new(["webcam roast"]);

        let description = harness
            .pipeline()
            .describe_frames(vec![png_base64(), png_base64()], None, "llava")
            .await
            .unwrap();

        assert!(description
            .collage_url
            .starts_with("https://bucket.example/capture/live-capture/"));
        assert_eq!(
            description.response_text(),
            format!("webcam roastCOLLAGE_URL:{}", description.collage_url)
        );
        assert!(harness.publisher.events().is_empty());
        assert!(harness.vision.requests()[0].messages[1]
            .content
            .ends_with("Narration so far:\n"));
    }
}
