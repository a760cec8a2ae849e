//! Mock visualizer and click track renderer for testing.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::clicks::{ClickSources, ClickTrackError, ClickTrackRenderer, ClickTracks};
use crate::visualize::{VisualizationError, Visualizer};

/// Base64 of the 8-byte PNG signature.
pub const MOCK_IMAGE: &str = "iVBORw0KGgo=";

/// Mock implementation of the Visualizer trait.
#[derive(Debug)]
pub struct MockVisualizer {
    next_error: Arc<RwLock<Option<VisualizationError>>>,
    rendered: Arc<RwLock<Vec<(usize, usize)>>>,
}

impl Default for MockVisualizer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockVisualizer {
    /// Create a new mock visualizer.
    pub fn new() -> Self {
        Self {
            next_error: Arc::new(RwLock::new(None)),
            rendered: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Configure the next render to fail with the given error.
    pub async fn set_next_error(&self, error: VisualizationError) {
        *self.next_error.write().await = Some(error);
    }

    /// Beat and downbeat counts of each render.
    pub async fn rendered(&self) -> Vec<(usize, usize)> {
        self.rendered.read().await.clone()
    }
}

#[async_trait]
impl Visualizer for MockVisualizer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn render(
        &self,
        _audio_path: &Path,
        beats: &[f64],
        downbeats: &[f64],
    ) -> Result<String, VisualizationError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        self.rendered
            .write()
            .await
            .push((beats.len(), downbeats.len()));
        Ok(MOCK_IMAGE.to_string())
    }
}

/// Mock implementation of the ClickTrackRenderer trait.
///
/// Writes all four click tracks as placeholder files.
#[derive(Debug)]
pub struct MockClickTrackRenderer {
    next_error: Arc<RwLock<Option<ClickTrackError>>>,
    calls: Arc<RwLock<usize>>,
}

impl Default for MockClickTrackRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockClickTrackRenderer {
    /// Create a new mock renderer.
    pub fn new() -> Self {
        Self {
            next_error: Arc::new(RwLock::new(None)),
            calls: Arc::new(RwLock::new(0)),
        }
    }

    /// Configure the next render to fail with the given error.
    pub async fn set_next_error(&self, error: ClickTrackError) {
        *self.next_error.write().await = Some(error);
    }

    /// Number of renders started.
    pub async fn call_count(&self) -> usize {
        *self.calls.read().await
    }
}

#[async_trait]
impl ClickTrackRenderer for MockClickTrackRenderer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn render(
        &self,
        _sources: &ClickSources,
        _beats: &[f64],
        _downbeats: &[f64],
        out_dir: &Path,
    ) -> Result<ClickTracks, ClickTrackError> {
        *self.calls.write().await += 1;
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        tokio::fs::create_dir_all(out_dir).await?;
        let tracks = ClickTracks {
            with_original: Some(out_dir.join("audio_with_clicks.wav")),
            with_harmonic: Some(out_dir.join("harmonic_with_clicks.wav")),
            with_percussive: Some(out_dir.join("percussive_with_clicks.wav")),
            clicks_only: Some(out_dir.join("clicks_only.wav")),
        };
        for path in [
            &tracks.with_original,
            &tracks.with_harmonic,
            &tracks.with_percussive,
            &tracks.clicks_only,
        ]
        .into_iter()
        .flatten()
        {
            tokio::fs::write(path, b"mock clicks").await?;
        }
        Ok(tracks)
    }
}
