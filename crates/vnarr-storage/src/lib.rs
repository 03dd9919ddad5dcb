//! S3-compatible object storage client.
//!
//! This crate provides:
//! - The `ObjectStore` seam used by the pipeline (put/list/get + public URLs)
//! - An AWS SDK backed implementation for S3-compatible buckets
//! - Catalog helpers (video listing, collage listing)

pub mod client;
pub mod error;
pub mod operations;

pub use client::{ObjectInfo, ObjectStore, S3Store, StorageConfig};
pub use error::{StorageError, StorageResult};
pub use operations::{list_collages, list_videos};
