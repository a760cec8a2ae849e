//! Types for acquired media.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Files produced by a successful acquisition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquiredMedia {
    /// Decodable audio track, usually WAV.
    pub audio_path: PathBuf,
    /// Video file when the acquirer fetched one.
    pub video_path: Option<PathBuf>,
    /// Thumbnail image when available.
    pub thumbnail_path: Option<PathBuf>,
    /// Duration reported by the source, in seconds.
    pub duration_secs: Option<f64>,
    /// Title reported by the source.
    pub title: String,
}

impl AcquiredMedia {
    /// Audio-only result.
    pub fn audio(audio_path: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        Self {
            audio_path: audio_path.into(),
            video_path: None,
            thumbnail_path: None,
            duration_secs: None,
            title: title.into(),
        }
    }

    /// Sets the reported duration.
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.duration_secs = Some(secs);
        self
    }

    /// Sets the video file.
    pub fn with_video(mut self, path: impl Into<PathBuf>) -> Self {
        self.video_path = Some(path.into());
        self
    }

    /// Sets the thumbnail file.
    pub fn with_thumbnail(mut self, path: impl Into<PathBuf>) -> Self {
        self.thumbnail_path = Some(path.into());
        self
    }
}
