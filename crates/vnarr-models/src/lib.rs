//! Shared data models for the video narration pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Video jobs and catalog listings
//! - Sampled frames and collage batches
//! - Cached caption results
//! - Progress events and the end-of-stream sentinel
//! - Object key conventions shared by every stage

pub mod caption;
pub mod collage;
pub mod frame;
pub mod keys;
pub mod progress;
pub mod video;

// Re-export common types
pub use caption::CaptionResult;
pub use collage::{
    batch_count, grid_position, partition_batches, CollageBatch, GridPosition, BATCH_SIZE,
    GRID_COLUMNS, GRID_ROWS,
};
pub use frame::{frame_file_name, FrameArtifact, FRAME_FILE_PREFIX};
pub use progress::{ProgressEvent, END_SENTINEL};
pub use video::{VideoAsset, VideoAssetError, VideoListing};
