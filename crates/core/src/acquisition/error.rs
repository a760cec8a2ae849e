//! Error types for the acquisition module.

use thiserror::Error;

use crate::tool::ToolError;

/// Errors that can occur while acquiring media.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// The source has no such media, or it is private or removed.
    #[error("Media not found: {reason}")]
    NotFound { reason: String },

    /// Transient network failure talking to the source.
    #[error("Network error: {reason}")]
    Network { reason: String },

    /// The download or extraction tool failed.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// Tool succeeded but the expected output file is missing.
    #[error("Expected output missing: {reason}")]
    MissingOutput { reason: String },

    /// No result within the deadline.
    #[error("Download timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The acquisition task panicked or was aborted.
    #[error("Acquisition task failed: {0}")]
    TaskFailed(String),

    /// I/O error preparing directories.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AcquisitionError {
    /// Creates a not found error.
    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::NotFound {
            reason: reason.into(),
        }
    }

    /// Creates a network error.
    pub fn network(reason: impl Into<String>) -> Self {
        Self::Network {
            reason: reason.into(),
        }
    }

    /// Creates a missing output error.
    pub fn missing_output(reason: impl Into<String>) -> Self {
        Self::MissingOutput {
            reason: reason.into(),
        }
    }

    /// Whether the deadline expired.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Timeout { .. } | Self::Io(_))
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Network { .. } => "network",
            Self::Tool(_) => "tool",
            Self::MissingOutput { .. } => "missing_output",
            Self::Timeout { .. } => "timeout",
            Self::TaskFailed(_) => "task_failed",
            Self::Io(_) => "io",
        }
    }
}
