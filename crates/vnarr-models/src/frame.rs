//! Sampled still frames.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// File name prefix shared by every sampled frame.
pub const FRAME_FILE_PREFIX: &str = "frame-";

/// Zero-padded file name for the frame with the given 1-based ordinal.
///
/// Directory listing order equals temporal order as long as ordinals stay
/// below 10000.
pub fn frame_file_name(ordinal: u32) -> String {
    format!("{}{:04}.png", FRAME_FILE_PREFIX, ordinal)
}

/// One sampled still image on local disk.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FrameArtifact {
    /// Extraction ordinal (0-based position in the sampled sequence)
    pub index: usize,
    /// Location of the encoded frame
    pub path: PathBuf,
}

impl FrameArtifact {
    pub fn new(index: usize, path: impl Into<PathBuf>) -> Self {
        Self {
            index,
            path: path.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_file_name_is_sortable() {
        assert_eq!(frame_file_name(1), "frame-0001.png");
        assert_eq!(frame_file_name(42), "frame-0042.png");

        let mut names: Vec<String> = [10, 2, 100, 1].iter().map(|n| frame_file_name(*n)).collect();
        names.sort();
        assert_eq!(
            names,
            vec!["frame-0001.png", "frame-0002.png", "frame-0010.png", "frame-0100.png"]
        );
    }
}
