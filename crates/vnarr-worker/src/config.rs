//! Worker configuration.

use std::path::PathBuf;
use std::str::FromStr;

use vnarr_media::collage::{DEFAULT_CELL_HEIGHT, DEFAULT_CELL_WIDTH, DEFAULT_JPEG_QUALITY};
use vnarr_media::{CollageLayout, FrameSampling, DEFAULT_FRAME_INTERVAL};
use vnarr_models::keys::DEFAULT_COLLAGES_NAMESPACE;

/// Default expiry for collage captions.
pub const DEFAULT_CAPTION_TTL_SECS: u64 = 3600;

/// What a failed collage upload does to its batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UploadPolicy {
    /// Log the failure and carry on with the computed URL.
    #[default]
    BestEffort,
    /// Fail the batch.
    Strict,
}

impl FromStr for UploadPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "best_effort" | "besteffort" => Ok(Self::BestEffort),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown upload policy: {}", other)),
        }
    }
}

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Local working area for downloaded videos and sampled frames
    pub work_dir: PathBuf,
    /// Object-store prefix for rendered collages
    pub collages_namespace: String,
    /// Keep one frame out of every `frame_interval`
    pub frame_interval: u32,
    /// Collage cell width in pixels
    pub cell_width: u32,
    /// Collage cell height in pixels
    pub cell_height: u32,
    /// JPEG quality for collages (1-100)
    pub jpeg_quality: u8,
    /// Expiry of freshly computed captions
    pub caption_ttl_secs: u64,
    /// Collage upload failure handling
    pub upload_policy: UploadPolicy,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("/tmp/vnarr"),
            collages_namespace: DEFAULT_COLLAGES_NAMESPACE.to_string(),
            frame_interval: DEFAULT_FRAME_INTERVAL,
            cell_width: DEFAULT_CELL_WIDTH,
            cell_height: DEFAULT_CELL_HEIGHT,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            caption_ttl_secs: DEFAULT_CAPTION_TTL_SECS,
            upload_policy: UploadPolicy::BestEffort,
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            work_dir: std::env::var("WORKER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            collages_namespace: std::env::var("COLLAGES_NAMESPACE")
                .ok()
                .filter(|ns| !ns.is_empty())
                .unwrap_or(defaults.collages_namespace),
            frame_interval: env_parse("FRAME_INTERVAL").unwrap_or(defaults.frame_interval),
            cell_width: env_parse("COLLAGE_CELL_WIDTH").unwrap_or(defaults.cell_width),
            cell_height: env_parse("COLLAGE_CELL_HEIGHT").unwrap_or(defaults.cell_height),
            jpeg_quality: env_parse::<u8>("COLLAGE_JPEG_QUALITY")
                .map(|q| q.clamp(1, 100))
                .unwrap_or(defaults.jpeg_quality),
            caption_ttl_secs: env_parse("CAPTION_TTL_SECS").unwrap_or(defaults.caption_ttl_secs),
            upload_policy: env_parse("UPLOAD_POLICY").unwrap_or(defaults.upload_policy),
        }
    }

    /// Local path of a downloaded source video.
    pub fn video_path(&self, video_key: &str) -> PathBuf {
        self.work_dir.join(vnarr_models::keys::video_key(video_key))
    }

    /// Local directory holding the sampled frames of a video.
    pub fn frames_dir(&self, video_key: &str) -> PathBuf {
        self.work_dir.join(vnarr_models::keys::frames_dir(video_key))
    }

    pub fn layout(&self) -> CollageLayout {
        CollageLayout {
            cell_width: self.cell_width,
            cell_height: self.cell_height,
            jpeg_quality: self.jpeg_quality,
        }
    }

    pub fn sampling(&self) -> FrameSampling {
        FrameSampling::every(self.frame_interval)
    }
}

/// Environment variables the full application needs.
pub fn required_env_vars() -> &'static [&'static str] {
    &[
        "AWS_ENDPOINT_URL_S3",
        "AWS_ACCESS_KEY_ID",
        "AWS_SECRET_ACCESS_KEY",
        "BUCKET_NAME",
        "REDIS_URL",
        "XI_API_KEY",
        "XI_VOICE_ID",
    ]
}

/// Required variables that are unset or empty, in declaration order.
pub fn missing_env_vars() -> Vec<&'static str> {
    missing_from(|name| std::env::var(name).ok())
}

fn missing_from(lookup: impl Fn(&str) -> Option<String>) -> Vec<&'static str> {
    required_env_vars()
        .iter()
        .copied()
        .filter(|name| lookup(name).map_or(true, |v| v.is_empty()))
        .collect()
}
