//! Mock prober for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::probe::{MediaInfo, MediaProber, ProbeError};

/// Mock implementation of the MediaProber trait.
///
/// Reports a WAV file of the configured duration for any existing path.
#[derive(Debug)]
pub struct MockProber {
    probed: Arc<RwLock<Vec<PathBuf>>>,
    next_error: Arc<RwLock<Option<ProbeError>>>,
    duration_secs: Arc<RwLock<f64>>,
}

impl Default for MockProber {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProber {
    /// Create a new mock prober.
    pub fn new() -> Self {
        Self {
            probed: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            duration_secs: Arc::new(RwLock::new(210.5)),
        }
    }

    /// Configure the next probe to fail with the given error.
    pub async fn set_next_error(&self, error: ProbeError) {
        *self.next_error.write().await = Some(error);
    }

    /// Set the reported duration.
    pub async fn set_duration(&self, secs: f64) {
        *self.duration_secs.write().await = secs;
    }

    /// Paths probed so far.
    pub async fn probed_paths(&self) -> Vec<PathBuf> {
        self.probed.read().await.clone()
    }
}

#[async_trait]
impl MediaProber for MockProber {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, ProbeError> {
        self.probed.write().await.push(path.to_path_buf());

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        if !path.exists() {
            return Err(ProbeError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        Ok(MediaInfo {
            path: path.to_path_buf(),
            duration_secs: *self.duration_secs.read().await,
            format: "wav".to_string(),
            audio_codec: Some("pcm_s16le".to_string()),
            audio_sample_rate: Some(44100),
            audio_channels: Some(2),
        })
    }
}
