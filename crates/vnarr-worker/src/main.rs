//! Single-run narration CLI.
//!
//! Usage: `vnarr-worker <video-url> <video-key> [model]`

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vnarr_media::check_ffmpeg;
use vnarr_models::VideoAsset;
use vnarr_worker::Services;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    dotenvy::dotenv().ok();

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(true))
            .with(env_filter)
            .init();
    }

    let mut args = std::env::args().skip(1);
    let (url, key) = match (args.next(), args.next()) {
        (Some(url), Some(key)) => (url, key),
        _ => anyhow::bail!("usage: vnarr-worker <video-url> <video-key> [model]"),
    };
    let requested_model = args.next();

    check_ffmpeg().context("FFmpeg is required")?;

    let video = VideoAsset::new(url, key).context("Invalid video")?;
    let services = Services::from_env().context("Failed to initialise services")?;
    let model = services
        .vision
        .config()
        .resolve_model(requested_model.as_deref())
        .to_string();

    info!(video_key = %video.key(), model = %model, "Starting vnarr-worker");

    let summary = services
        .pipeline
        .run(&video, &model)
        .await
        .with_context(|| format!("Narration of {} failed", video.key()))?;

    println!("{}", summary.narrative);
    Ok(())
}
