//! Media primitives for the narration pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building for frame sampling
//! - Progress parsing from `-progress pipe:2`
//! - Frame extraction into sortable, zero-padded files
//! - Collage rendering (white canvas, cover-fit cells, 3x2 grid, JPEG output)
//! - Inline base64 image decoding for capture sources

pub mod collage;
pub mod command;
pub mod error;
pub mod frames;
pub mod inline;
pub mod progress;

pub use collage::{encode_jpeg, load_image_files, render_collage, CollageLayout};
pub use command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use frames::{extract_frames, has_frames, list_frames, FrameSampling, DEFAULT_FRAME_INTERVAL};
pub use inline::decode_inline_images;
pub use progress::DecodeProgress;
