//! Beat and downbeat detection.

mod command;
mod events;

pub use command::CommandDetector;
pub use events::{estimate_tempo, DetectedEvents, DEFAULT_TEMPO_BPM};

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

use crate::tool::ToolError;

/// Errors that can occur during detection. Never fatal to the job.
#[derive(Debug, Error)]
pub enum DetectionError {
    /// No detector is installed or configured.
    #[error("Beat detection unavailable: {reason}")]
    Unavailable { reason: String },

    /// The detector ran and failed.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// The detector's output could not be read.
    #[error("Failed to parse detector output: {reason}")]
    ParseError { reason: String },
}

impl DetectionError {
    /// Creates an unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Whether detection is missing, as opposed to failing at runtime.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// Finds beats and downbeats in a (percussive) audio track.
#[async_trait]
pub trait EventDetector: Send + Sync {
    /// Returns the name of this detector implementation.
    fn name(&self) -> &str;

    /// Detects events, returned in ascending order.
    async fn detect(&self, audio_path: &Path) -> Result<DetectedEvents, DetectionError>;
}
