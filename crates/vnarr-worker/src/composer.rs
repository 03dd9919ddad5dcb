//! Collage composition and persistence.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use vnarr_media::{decode_inline_images, encode_jpeg, load_image_files, render_collage, CollageLayout};
use vnarr_models::keys::{capture_key, collage_key};
use vnarr_storage::ObjectStore;

use crate::config::UploadPolicy;
use crate::error::WorkerResult;

const COLLAGE_CONTENT_TYPE: &str = "image/jpeg";

/// Images making up one batch, in grid order.
#[derive(Debug, Clone)]
pub enum CollageInput {
    /// Sampled frame files of a stored video.
    Frames(Vec<PathBuf>),
    /// Inline base64 images from a live capture source.
    Capture(Vec<String>),
}

impl CollageInput {
    pub fn len(&self) -> usize {
        match self {
            CollageInput::Frames(paths) => paths.len(),
            CollageInput::Capture(payloads) => payloads.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_capture(&self) -> bool {
        matches!(self, CollageInput::Capture(_))
    }
}

/// Result of writing a collage to the object store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Stored,
    /// The write failed and [`UploadPolicy::BestEffort`] absorbed it.
    Failed(String),
}

/// A rendered collage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedCollage {
    pub key: String,
    pub url: String,
    pub upload: UploadOutcome,
}

/// Renders batches into collages and stores them.
#[derive(Clone)]
pub struct CollageComposer {
    store: Arc<dyn ObjectStore>,
    layout: CollageLayout,
    namespace: String,
    policy: UploadPolicy,
}

impl CollageComposer {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        layout: CollageLayout,
        namespace: impl Into<String>,
        policy: UploadPolicy,
    ) -> Self {
        Self {
            store,
            layout,
            namespace: namespace.into(),
            policy,
        }
    }

    /// Object key for a batch.
    ///
    /// Stored videos get `{namespace}/{video}/collage-{n}.jpg`; captures are
    /// keyed by the current time.
    pub fn object_key(&self, input: &CollageInput, video_key: &str, batch_index: usize) -> String {
        if input.is_capture() {
            capture_key(video_key, chrono::Utc::now().timestamp_millis())
        } else {
            collage_key(&self.namespace, video_key, batch_index)
        }
    }

    /// Render one batch and store it, returning its public URL.
    pub async fn compose_batch(
        &self,
        input: CollageInput,
        batch_index: usize,
        video_key: &str,
    ) -> WorkerResult<ComposedCollage> {
        let key = self.object_key(&input, video_key, batch_index);
        let members = input.len();
        let layout = self.layout;

        let jpeg = tokio::task::spawn_blocking(move || {
            let images = match &input {
                CollageInput::Frames(paths) => load_image_files(paths)?,
                CollageInput::Capture(payloads) => decode_inline_images(payloads)?,
            };
            let canvas = render_collage(&layout, images)?;
            encode_jpeg(&canvas, layout.jpeg_quality)
        })
        .await??;

        let url = self.store.public_url(&key);
        let upload = match self.store.put_bytes(&key, jpeg, COLLAGE_CONTENT_TYPE).await {
            Ok(()) => UploadOutcome::Stored,
            Err(e) if self.policy == UploadPolicy::BestEffort => {
                metrics::counter!("vnarr_upload_failures_total").increment(1);
                warn!(key = %key, error = %e, "Collage upload failed, continuing");
                UploadOutcome::Failed(e.to_string())
            }
            Err(e) => return Err(e.into()),
        };

        metrics::counter!("vnarr_collages_composed_total").increment(1);
        info!(key = %key, batch = batch_index, members, "Composed collage");

        Ok(ComposedCollage { key, url, upload })
    }
}
