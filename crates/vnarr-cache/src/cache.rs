//! Caption cache.
//!
//! Collage captions (keyed by collage URL) and narration audio (keyed by the
//! narration text) share one key space. The two key shapes never collide in
//! practice: one is always an absolute URL, the other free text.

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::{debug, warn};

use vnarr_models::CaptionResult;

use crate::error::CacheResult;

/// Default Redis URL.
pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";

/// Cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Redis URL
    pub redis_url: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: DEFAULT_REDIS_URL.to_string(),
        }
    }
}

impl CacheConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            redis_url: std::env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string()),
        }
    }
}

/// Content-keyed store of computed results.
///
/// A hit is returned as stored; freshness is not re-validated.
#[async_trait]
pub trait CaptionCache: Send + Sync {
    /// Look up a result.
    async fn get(&self, key: &str) -> CacheResult<Option<CaptionResult>>;

    /// Store a result under `result.key`, expiring after `result.ttl_seconds` when set.
    async fn set(&self, result: &CaptionResult) -> CacheResult<()>;

    /// Set or refresh the expiry of a key.
    async fn expire(&self, key: &str, seconds: u64) -> CacheResult<()>;
}

/// Redis implementation of [`CaptionCache`].
#[derive(Clone)]
pub struct RedisCaptionCache {
    client: redis::Client,
}

impl RedisCaptionCache {
    /// Create a new cache client.
    pub fn new(config: &CacheConfig) -> CacheResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self { client })
    }

    /// Create from environment variables.
    pub fn from_env() -> CacheResult<Self> {
        Self::new(&CacheConfig::from_env())
    }

    /// Round-trip a PING.
    pub async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }
}

/// Decode a stored value.
///
/// Plain strings written by older deployments are served as-is.
fn decode_entry(key: &str, raw: String) -> CaptionResult {
    match serde_json::from_str::<CaptionResult>(&raw) {
        Ok(result) => result,
        Err(e) => {
            warn!(key = %key, error = %e, "Cache entry is not a caption record, serving raw value");
            CaptionResult::new(key, raw, None)
        }
    }
}

#[async_trait]
impl CaptionCache for RedisCaptionCache {
    async fn get(&self, key: &str) -> CacheResult<Option<CaptionResult>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(key).await?;

        debug!(key = %key, hit = raw.is_some(), "Caption cache lookup");
        Ok(raw.map(|raw| decode_entry(key, raw)))
    }

    async fn set(&self, result: &CaptionResult) -> CacheResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload = serde_json::to_string(result)?;

        match result.ttl_seconds {
            Some(ttl) => conn.set_ex::<_, _, ()>(&result.key, payload, ttl).await?,
            None => conn.set::<_, _, ()>(&result.key, payload).await?,
        }

        debug!(key = %result.key, ttl = ?result.ttl_seconds, "Caption cache write");
        Ok(())
    }

    async fn expire(&self, key: &str, seconds: u64) -> CacheResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.expire::<_, ()>(key, seconds as i64).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_json_entry() {
        let stored = CaptionResult::new("https://b/collage-1.jpg", "a cat judges you", Some(3600));
        let raw = serde_json::to_string(&stored).unwrap();

        assert_eq!(decode_entry("https://b/collage-1.jpg", raw), stored);
    }

    #[test]
    fn test_decode_plain_entry() {
        let decoded = decode_entry("hello there", "https://b/elevenLabsAudio/v/1.mp3".to_string());
        assert_eq!(decoded.key, "hello there");
        assert_eq!(decoded.text, "https://b/elevenLabsAudio/v/1.mp3");
        assert_eq!(decoded.ttl_seconds, None);
    }

    #[test]
    fn test_config_default() {
        assert_eq!(CacheConfig::default().redis_url, "redis://localhost:6379");
    }
}
