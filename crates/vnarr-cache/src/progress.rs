//! Progress events via Redis Pub/Sub.
//!
//! Delivery is best-effort: subscribers that are not listening when an
//! event is published never see it.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;
use redis::AsyncCommands;
use tracing::debug;

use vnarr_models::ProgressEvent;

use crate::error::CacheResult;

/// Broadcast of progress events.
#[async_trait]
pub trait ProgressPublisher: Send + Sync {
    /// Publish an already built envelope.
    async fn publish(&self, event: &ProgressEvent) -> CacheResult<()>;

    /// Wrap `message` in an envelope for `channel` and publish it.
    async fn publish_message(&self, channel: &str, message: &str) -> CacheResult<()> {
        self.publish(&ProgressEvent::new(channel, message)).await
    }

    /// Publish the end-of-stream sentinel for `channel`.
    async fn publish_end(&self, channel: &str) -> CacheResult<()> {
        self.publish(&ProgressEvent::end(channel)).await
    }
}

/// Channel for publishing/subscribing to progress events.
#[derive(Clone)]
pub struct ProgressChannel {
    client: redis::Client,
}

impl ProgressChannel {
    /// Create a new progress channel.
    pub fn new(redis_url: &str) -> CacheResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    /// Channel name for a video run.
    pub fn channel_name(video_key: &str) -> String {
        video_key.to_string()
    }

    /// Subscribe to a channel.
    /// Returns a pinned stream that can be polled with `.next()`.
    pub async fn subscribe(
        &self,
        channel: &str,
    ) -> CacheResult<Pin<Box<dyn Stream<Item = ProgressEvent> + Send>>> {
        use futures_util::StreamExt;

        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(channel).await?;

        let stream = pubsub.into_on_message().filter_map(|msg| async move {
            let payload: String = msg.get_payload().ok()?;
            serde_json::from_str(&payload).ok()
        });

        Ok(Box::pin(stream))
    }
}

#[async_trait]
impl ProgressPublisher for ProgressChannel {
    async fn publish(&self, event: &ProgressEvent) -> CacheResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload = serde_json::to_string(event)?;

        debug!(channel = %event.channel, "Publishing progress event");
        conn.publish::<_, _, ()>(&event.channel, payload).await?;

        Ok(())
    }
}
