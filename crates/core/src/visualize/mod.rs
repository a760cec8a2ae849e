//! Waveform rendering.

mod waveform;

pub use waveform::WaveformVisualizer;

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

use crate::audio::AudioError;

/// Errors that can occur while rendering. Never fatal to the job.
#[derive(Debug, Error)]
pub enum VisualizationError {
    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error("Image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Render task failed: {0}")]
    Task(String),
}

/// Renders an image of an audio track with event markers.
#[async_trait]
pub trait Visualizer: Send + Sync {
    /// Returns the name of this visualizer implementation.
    fn name(&self) -> &str;

    /// Renders the image and returns it as a base64-encoded PNG.
    async fn render(
        &self,
        audio_path: &Path,
        beats: &[f64],
        downbeats: &[f64],
    ) -> Result<String, VisualizationError>;
}
