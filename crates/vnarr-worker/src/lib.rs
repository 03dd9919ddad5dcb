//! Video narration pipeline.
//!
//! Samples frames from a video, renders them six at a time into collages,
//! captions each collage with a vision model while carrying the narration
//! so far forward, and reports every caption on a progress channel that
//! ends with `END`.

pub mod captioner;
pub mod composer;
pub mod config;
pub mod context;
pub mod download;
pub mod error;
pub mod extractor;
pub mod logging;
pub mod pipeline;
pub mod services;
pub mod speech;

#[cfg(test)]
pub(crate) mod testing;

pub use captioner::{Caption, HttpImageFetcher, ImageFetcher, NarrativeCaptioner};
pub use composer::{CollageComposer, CollageInput, ComposedCollage, UploadOutcome};
pub use config::{missing_env_vars, required_env_vars, UploadPolicy, WorkerConfig};
pub use context::NarrativeContext;
pub use error::{WorkerError, WorkerResult};
pub use extractor::{FfmpegExtractor, FrameExtractor};
pub use logging::RunLogger;
pub use pipeline::{CaptureDescription, NarrationPipeline, RunPath, RunSummary};
pub use services::Services;
pub use speech::{ElevenLabsClient, NarrationSpeech, SpeechConfig, SpeechSynthesizer};
