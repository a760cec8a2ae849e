//! Error types for the pipeline module.

use thiserror::Error;

use crate::acquisition::AcquisitionError;
use crate::locator::LocatorError;
use crate::probe::ProbeError;
use crate::separate::SeparationError;

/// Fatal pipeline failures. The message becomes the job's error.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to download media: {0}")]
    Acquisition(#[from] AcquisitionError),

    #[error("Downloaded audio is unreadable: {0}")]
    Probe(#[from] ProbeError),

    #[error("Failed to separate audio components: {0}")]
    Separation(#[from] SeparationError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Stage label for metrics.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Acquisition(_) => "acquire",
            Self::Probe(_) => "prepare",
            Self::Separation(_) => "separate",
            Self::Internal(_) => "internal",
        }
    }
}

/// Errors returned synchronously from submission.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    InvalidLocator(#[from] LocatorError),
}
