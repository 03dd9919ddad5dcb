//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("No frames found for {video_key}")]
    NoFrames { video_key: String },

    #[error("No collages found for {video_key}")]
    NoCollages { video_key: String },

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Image fetch failed: {0}")]
    ImageFetchFailed(String),

    #[error("Speech synthesis failed: {0}")]
    SpeechFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    Storage(#[from] vnarr_storage::StorageError),

    #[error("Media error: {0}")]
    Media(#[from] vnarr_media::MediaError),

    #[error("Cache error: {0}")]
    Cache(#[from] vnarr_cache::CacheError),

    #[error("Vision model error: {0}")]
    Vision(#[from] vnarr_vision::VisionError),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn no_frames(video_key: impl Into<String>) -> Self {
        Self::NoFrames {
            video_key: video_key.into(),
        }
    }

    pub fn no_collages(video_key: impl Into<String>) -> Self {
        Self::NoCollages {
            video_key: video_key.into(),
        }
    }

    pub fn download_failed(msg: impl Into<String>) -> Self {
        Self::DownloadFailed(msg.into())
    }

    pub fn image_fetch_failed(msg: impl Into<String>) -> Self {
        Self::ImageFetchFailed(msg.into())
    }

    pub fn speech_failed(msg: impl Into<String>) -> Self {
        Self::SpeechFailed(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Malformed capture payloads abort only the batch they belong to.
    pub fn is_invalid_image_data(&self) -> bool {
        matches!(
            self,
            WorkerError::Media(vnarr_media::MediaError::InvalidImageData { .. })
        )
    }
}
