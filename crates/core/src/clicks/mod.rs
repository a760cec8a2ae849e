//! Click track rendering.

mod mixing;

pub use mixing::{synthesize_clicks, MixingClickTrackRenderer};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::audio::AudioError;

/// Tracks the clicks are mixed into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickSources {
    pub original: PathBuf,
    pub harmonic: PathBuf,
    pub percussive: PathBuf,
}

/// Rendered click tracks. `None` means that track was not produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClickTracks {
    /// Original audio plus clicks.
    pub with_original: Option<PathBuf>,
    /// Harmonic track plus clicks.
    pub with_harmonic: Option<PathBuf>,
    /// Percussive track plus clicks.
    pub with_percussive: Option<PathBuf>,
    /// Clicks alone.
    pub clicks_only: Option<PathBuf>,
}

impl ClickTracks {
    /// Number of tracks produced.
    pub fn count(&self) -> usize {
        [
            &self.with_original,
            &self.with_harmonic,
            &self.with_percussive,
            &self.clicks_only,
        ]
        .iter()
        .filter(|t| t.is_some())
        .count()
    }
}

/// Errors that can occur while rendering. Never fatal to the job.
#[derive(Debug, Error)]
pub enum ClickTrackError {
    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Mixes audible clicks at event times into audio tracks.
#[async_trait]
pub trait ClickTrackRenderer: Send + Sync {
    /// Returns the name of this renderer implementation.
    fn name(&self) -> &str;

    /// Writes up to four click tracks into `out_dir`.
    async fn render(
        &self,
        sources: &ClickSources,
        beats: &[f64],
        downbeats: &[f64],
        out_dir: &Path,
    ) -> Result<ClickTracks, ClickTrackError>;
}
