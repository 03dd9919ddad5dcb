//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    /// The source video could not be decoded into frames.
    #[error("Frame extraction failed for {path}: {message}")]
    Extraction { path: PathBuf, message: String },

    /// A capture payload could not be decoded into an image.
    #[error("Invalid image data at position {index}: {message}")]
    InvalidImageData { index: usize, message: String },

    #[error("Collage needs between 1 and {max} images, got {got}")]
    BatchSize { got: usize, max: usize },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create an extraction error for a source video.
    pub fn extraction(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Extraction {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid image data error for a batch member.
    pub fn invalid_image_data(index: usize, message: impl Into<String>) -> Self {
        Self::InvalidImageData {
            index,
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
