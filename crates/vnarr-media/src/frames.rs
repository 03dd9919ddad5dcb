//! Frame extraction.
//!
//! Samples one frame out of every `interval` decoded frames and writes them
//! as `frame-0001.png`, `frame-0002.png`, ... so that a sorted directory
//! listing is the temporal order.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use vnarr_models::{FrameArtifact, FRAME_FILE_PREFIX};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::progress::DecodeProgress;

/// Default sampling interval, in decoded frames.
pub const DEFAULT_FRAME_INTERVAL: u32 = 30;

/// Frame sampling settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSampling {
    /// Keep one frame out of every `interval`
    pub interval: u32,
}

impl Default for FrameSampling {
    fn default() -> Self {
        Self {
            interval: DEFAULT_FRAME_INTERVAL,
        }
    }
}

impl FrameSampling {
    pub fn every(interval: u32) -> Self {
        Self {
            interval: interval.max(1),
        }
    }

    /// FFmpeg select filter keeping frames 0, interval, 2*interval, ...
    pub fn select_filter(&self) -> String {
        format!("select=not(mod(n\\,{}))", self.interval.max(1))
    }
}

/// Build the FFmpeg command that samples `video_path` into `dest_dir`.
pub fn sampling_command(
    video_path: impl AsRef<Path>,
    dest_dir: impl AsRef<Path>,
    sampling: FrameSampling,
) -> FfmpegCommand {
    let pattern = dest_dir
        .as_ref()
        .join(format!("{}%04d.png", FRAME_FILE_PREFIX));

    FfmpegCommand::new(video_path, pattern)
        .video_filter(sampling.select_filter())
        .variable_frame_rate()
        .start_number(1)
}

/// Decode `video_path` and write sampled frames into `dest_dir`.
///
/// Callers check [`has_frames`] first; this always decodes. Frames are
/// written to a staging directory next to `dest_dir` and only moved into
/// place once FFmpeg succeeds, so a failed decode leaves `dest_dir`
/// without frames. Failures are reported as [`MediaError::Extraction`].
pub async fn extract_frames<F>(
    video_path: impl AsRef<Path>,
    dest_dir: impl AsRef<Path>,
    sampling: FrameSampling,
    on_progress: F,
) -> MediaResult<Vec<FrameArtifact>>
where
    F: Fn(DecodeProgress) + Send + 'static,
{
    let video_path = video_path.as_ref();
    let dest_dir = dest_dir.as_ref();

    if !video_path.exists() {
        return Err(MediaError::extraction(video_path, "source video does not exist"));
    }

    let staging = staging_dir(dest_dir);
    remove_dir_if_exists(&staging).await?;
    tokio::fs::create_dir_all(&staging).await?;

    info!(
        video = %video_path.display(),
        dest = %dest_dir.display(),
        interval = sampling.interval,
        "Extracting frames"
    );

    let cmd = sampling_command(video_path, &staging, sampling);
    let decoded = FfmpegRunner::new()
        .run_with_progress(&cmd, on_progress)
        .await
        .map_err(|e| match e {
            MediaError::FfmpegFailed { message, stderr, .. } => MediaError::extraction(
                video_path,
                stderr.map(|s| format!("{}: {}", message, s)).unwrap_or(message),
            ),
            other => other,
        });

    if let Err(e) = decoded {
        if let Err(cleanup) = remove_dir_if_exists(&staging).await {
            warn!(dir = %staging.display(), error = %cleanup, "Failed to discard partial frames");
        }
        return Err(e);
    }

    promote_staging(&staging, dest_dir).await?;

    let frames = list_frames(dest_dir).await?;
    info!(count = frames.len(), "Frame extraction complete");
    Ok(frames)
}

/// Sibling directory frames are decoded into before promotion.
fn staging_dir(dest_dir: &Path) -> PathBuf {
    let mut name = dest_dir.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

/// Replace `dest_dir` with the finished `staging` directory.
async fn promote_staging(staging: &Path, dest_dir: &Path) -> MediaResult<()> {
    remove_dir_if_exists(dest_dir).await?;
    if let Some(parent) = dest_dir.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::rename(staging, dest_dir).await?;
    Ok(())
}

async fn remove_dir_if_exists(dir: &Path) -> MediaResult<()> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// List sampled frames in `dir` in temporal order.
///
/// A missing directory yields an empty list.
pub async fn list_frames(dir: impl AsRef<Path>) -> MediaResult<Vec<FrameArtifact>> {
    let dir = dir.as_ref();

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(dir = %dir.display(), "Frame directory does not exist");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with(FRAME_FILE_PREFIX) && name.ends_with(".png") {
            names.push(name);
        }
    }
    names.sort();

    Ok(names
        .into_iter()
        .enumerate()
        .map(|(index, name)| FrameArtifact::new(index, dir.join(name)))
        .collect())
}

/// Whether `dir` already holds sampled frames.
pub async fn has_frames(dir: impl AsRef<Path>) -> MediaResult<bool> {
    Ok(!list_frames(dir).await?.is_empty())
}
