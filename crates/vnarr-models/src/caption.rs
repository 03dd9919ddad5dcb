//! Cached caption results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A computed result stored in the caption cache.
///
/// Collage captions are keyed by collage URL. Synthesized narration shares
/// the same key space, keyed by the narration text with the audio URL as
/// `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionResult {
    /// Cache key (collage URL or raw narration text)
    pub key: String,
    /// Cached payload
    pub text: String,
    /// When the entry was written
    pub cached_at: DateTime<Utc>,
    /// Expiry requested when the entry was written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_seconds: Option<u64>,
}

impl CaptionResult {
    /// Create a result stamped with the current time.
    pub fn new(key: impl Into<String>, text: impl Into<String>, ttl_seconds: Option<u64>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
            cached_at: Utc::now(),
            ttl_seconds,
        }
    }
}
