//! FFmpeg progress parsing.

use serde::{Deserialize, Serialize};

/// Progress information reported while FFmpeg decodes a video.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecodeProgress {
    /// Number of frames written so far
    pub frame: u64,
    /// Current FPS
    pub fps: f64,
    /// Position in the source, in milliseconds
    pub out_time_ms: i64,
    /// Decode speed (e.g., 1.5 = 1.5x realtime)
    pub speed: f64,
    /// Whether decoding is complete
    pub is_complete: bool,
}

/// Parse one line of FFmpeg's `-progress` output into `current`.
///
/// Returns a snapshot when a `progress=` line closes a block.
pub(crate) fn parse_progress_line(line: &str, current: &mut DecodeProgress) -> Option<DecodeProgress> {
    let (key, value) = line.trim().split_once('=')?;

    match key {
        "out_time_us" => {
            if let Ok(us) = value.parse::<i64>() {
                current.out_time_ms = us / 1000;
            }
        }
        "frame" => {
            if let Ok(frame) = value.parse() {
                current.frame = frame;
            }
        }
        "fps" => {
            if let Ok(fps) = value.parse() {
                current.fps = fps;
            }
        }
        "speed" => {
            if let Some(speed) = value.strip_suffix('x').and_then(|s| s.trim().parse().ok()) {
                current.speed = speed;
            }
        }
        "progress" => {
            current.is_complete = value == "end";
            return Some(current.clone());
        }
        _ => {}
    }

    None
}

/// Whether a stderr line belongs to the `-progress` key/value stream.
pub(crate) fn is_progress_line(line: &str) -> bool {
    const KEYS: &[&str] = &[
        "frame", "fps", "stream_0_0_q", "bitrate", "total_size", "out_time_us", "out_time_ms",
        "out_time", "dup_frames", "drop_frames", "speed", "progress",
    ];
    line.split_once('=')
        .map(|(key, _)| KEYS.contains(&key.trim()))
        .unwrap_or(false)
}
