//! Progress events broadcast during a pipeline run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payload of the terminal event of a run.
pub const END_SENTINEL: &str = "END";

/// Envelope published to subscribers of a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Channel the event belongs to
    pub channel: String,
    /// Caption text, or [`END_SENTINEL`] for the final event
    pub payload: String,
    /// Publication time
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    /// Wrap a message for a channel.
    pub fn new(channel: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            payload: payload.into(),
            timestamp: Utc::now(),
        }
    }

    /// Terminal event for a channel.
    pub fn end(channel: impl Into<String>) -> Self {
        Self::new(channel, END_SENTINEL)
    }

    /// Whether this event marks the end of the stream.
    pub fn is_end(&self) -> bool {
        self.payload == END_SENTINEL
    }
}
