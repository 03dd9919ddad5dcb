//! Object key conventions.
//!
//! Layout:
//! - `video/{key}` source video
//! - `frames/{key}/frame-0001.png` local working area, never uploaded
//! - `{collages}/{key}/collage-{n}.jpg` rendered collages
//! - `capture/{key}/{timestamp}.jpg` collages built from live captures
//! - `elevenLabsAudio/{key}/{timestamp}.mp3` synthesized narration

/// Default namespace for rendered collages.
pub const DEFAULT_COLLAGES_NAMESPACE: &str = "collages";

/// Prefix for source videos.
pub const VIDEO_PREFIX: &str = "video";

/// Prefix for local frame directories.
pub const FRAMES_PREFIX: &str = "frames";

/// Prefix for capture-mode collages.
pub const CAPTURE_PREFIX: &str = "capture";

/// Prefix for synthesized narration audio.
pub const SPEECH_PREFIX: &str = "elevenLabsAudio";

/// Key of a source video.
pub fn video_key(video_key: &str) -> String {
    format!("{}/{}", VIDEO_PREFIX, video_key)
}

/// Relative directory holding the sampled frames of a video.
pub fn frames_dir(video_key: &str) -> String {
    format!("{}/{}", FRAMES_PREFIX, video_key)
}

/// Listing prefix for a video's collages (trailing slash included).
pub fn collages_prefix(namespace: &str, video_key: &str) -> String {
    format!("{}/{}/", namespace, video_key)
}

/// Key of the collage for 0-based `batch_index`.
pub fn collage_key(namespace: &str, video_key: &str, batch_index: usize) -> String {
    format!("{}/{}/collage-{}.jpg", namespace, video_key, batch_index + 1)
}

/// Key of a capture-mode collage.
pub fn capture_key(video_key: &str, timestamp_ms: i64) -> String {
    format!("{}/{}/{}.jpg", CAPTURE_PREFIX, video_key, timestamp_ms)
}

/// Key of a synthesized narration clip.
pub fn speech_key(video_key: &str, timestamp_ms: i64) -> String {
    format!("{}/{}/{}.mp3", SPEECH_PREFIX, video_key, timestamp_ms)
}
