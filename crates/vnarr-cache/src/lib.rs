//! Redis-backed caption cache and progress notifications.
//!
//! This crate provides:
//! - Caption cache keyed by collage URL or narration text, with optional expiry
//! - Progress events via Redis Pub/Sub, terminated by an `END` sentinel

pub mod cache;
pub mod error;
pub mod progress;

pub use cache::{CacheConfig, CaptionCache, RedisCaptionCache};
pub use error::{CacheError, CacheResult};
pub use progress::{ProgressChannel, ProgressPublisher};
