//! Media probing for the prepare stage.

mod ffprobe;

pub use ffprobe::FfprobeProber;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::tool::ToolError;

/// Information about a media file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Path to the probed file.
    pub path: PathBuf,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Container format name.
    pub format: String,
    /// Audio codec, if an audio stream exists.
    pub audio_codec: Option<String>,
    /// Audio sample rate in Hz.
    pub audio_sample_rate: Option<u32>,
    /// Number of audio channels.
    pub audio_channels: Option<u8>,
}

impl MediaInfo {
    /// Whether the file has an audio stream.
    pub fn has_audio(&self) -> bool {
        self.audio_codec.is_some()
    }
}

/// Errors that can occur while probing.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Input file does not exist.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// ffprobe could not run or rejected the file.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// ffprobe output could not be parsed.
    #[error("Failed to parse media info: {reason}")]
    ParseError { reason: String },

    /// File has no audio stream.
    #[error("No audio stream in {path}")]
    NoAudio { path: PathBuf },
}

/// Reads container and stream information from a media file.
#[async_trait]
pub trait MediaProber: Send + Sync {
    /// Returns the name of this prober implementation.
    fn name(&self) -> &str;

    /// Probes a media file to get its information.
    async fn probe(&self, path: &Path) -> Result<MediaInfo, ProbeError>;
}
