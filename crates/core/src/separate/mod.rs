//! Harmonic/percussive component separation.

mod band_split;

pub use band_split::BandSplitSeparator;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::tool::ToolError;

/// Output tracks of a separation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeparatedTracks {
    pub harmonic: PathBuf,
    pub percussive: PathBuf,
}

/// Errors that can occur during separation. Always fatal to the job.
#[derive(Debug, Error)]
pub enum SeparationError {
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("Separation failed: {reason}")]
    Failed { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SeparationError {
    /// Creates a generic separation failure.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }
}

/// Splits an audio file into harmonic and percussive tracks.
#[async_trait]
pub trait ComponentSeparator: Send + Sync {
    /// Returns the name of this separator implementation.
    fn name(&self) -> &str;

    /// Writes both tracks into `out_dir` and returns their paths.
    async fn separate(
        &self,
        audio_path: &Path,
        out_dir: &Path,
    ) -> Result<SeparatedTracks, SeparationError>;
}
