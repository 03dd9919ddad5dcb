//! Frame extraction stage.

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use vnarr_media::{extract_frames, DecodeProgress, FrameSampling};

use crate::error::WorkerResult;

/// Turns a local video into sampled frame files.
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    /// Write sampled frames of `video` into `dest`.
    async fn extract(&self, video: &Path, dest: &Path, sampling: FrameSampling) -> WorkerResult<()>;
}

/// [`FrameExtractor`] backed by FFmpeg.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegExtractor;

#[async_trait]
impl FrameExtractor for FfmpegExtractor {
    async fn extract(&self, video: &Path, dest: &Path, sampling: FrameSampling) -> WorkerResult<()> {
        let frames = extract_frames(video, dest, sampling, |p: DecodeProgress| {
            debug!(frame = p.frame, out_time_ms = p.out_time_ms, speed = p.speed, "Decoding");
        })
        .await?;

        debug!(count = frames.len(), "Frames written");
        Ok(())
    }
}
