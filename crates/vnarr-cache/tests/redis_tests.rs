//! Redis integration tests.

use std::time::Duration;

use futures_util::StreamExt;
use vnarr_cache::{CacheConfig, CaptionCache, ProgressChannel, ProgressPublisher, RedisCaptionCache};
use vnarr_models::CaptionResult;

fn redis_url() -> String {
    dotenvy::dotenv().ok();
    CacheConfig::from_env().redis_url
}

/// Cached captions come back byte-for-byte.
#[tokio::test]
#[ignore = "requires Redis"]
async fn test_caption_roundtrip() {
    let cache = RedisCaptionCache::new(&CacheConfig { redis_url: redis_url() }).expect("cache");
    cache.ping().await.expect("ping");

    let key = format!("https://bucket/collages/test-{}/collage-1.jpg", std::process::id());
    let stored = CaptionResult::new(&key, "A cat contemplates\nthe void.", Some(60));
    cache.set(&stored).await.expect("set");

    let fetched = cache.get(&key).await.expect("get").expect("hit");
    assert_eq!(fetched.text, stored.text);
    assert_eq!(fetched.ttl_seconds, Some(60));

    cache.expire(&key, 1).await.expect("expire");
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(cache.get(&key).await.expect("get").is_none());
}

/// Subscribers see caption events followed by the sentinel.
#[tokio::test]
#[ignore = "requires Redis"]
async fn test_progress_channel() {
    let progress = ProgressChannel::new(&redis_url()).expect("Failed to create progress channel");
    let channel = format!("vnarr-test-{}", std::process::id());

    let subscriber = {
        let progress = progress.clone();
        let channel = channel.clone();
        tokio::spawn(async move {
            let mut stream = progress.subscribe(&channel).await.expect("Failed to subscribe");
            let mut payloads = Vec::new();
            while let Ok(Some(event)) =
                tokio::time::timeout(Duration::from_secs(5), stream.next()).await
            {
                let done = event.is_end();
                payloads.push(event.payload);
                if done {
                    break;
                }
            }
            payloads
        })
    };

    // Give the subscriber time to attach; there is no replay.
    tokio::time::sleep(Duration::from_millis(200)).await;

    progress.publish_message(&channel, "first caption").await.expect("publish");
    progress.publish_end(&channel).await.expect("publish end");

    let payloads = subscriber.await.expect("subscriber task");
    assert_eq!(payloads, vec!["first caption".to_string(), "END".to_string()]);
}
