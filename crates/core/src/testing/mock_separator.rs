//! Mock separator for testing.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::separate::{ComponentSeparator, SeparatedTracks, SeparationError};

/// Mock implementation of the ComponentSeparator trait.
///
/// Writes placeholder `harmonic.wav` and `percussive.wav` files.
#[derive(Debug)]
pub struct MockSeparator {
    calls: Arc<RwLock<usize>>,
    next_error: Arc<RwLock<Option<SeparationError>>>,
    panic: Arc<RwLock<bool>>,
}

impl Default for MockSeparator {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSeparator {
    /// Create a new mock separator.
    pub fn new() -> Self {
        Self {
            calls: Arc::new(RwLock::new(0)),
            next_error: Arc::new(RwLock::new(None)),
            panic: Arc::new(RwLock::new(false)),
        }
    }

    /// Configure the next separation to fail with the given error.
    pub async fn set_next_error(&self, error: SeparationError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make separation panic.
    pub async fn set_panic(&self, panic: bool) {
        *self.panic.write().await = panic;
    }

    /// Number of separations started.
    pub async fn call_count(&self) -> usize {
        *self.calls.read().await
    }
}

#[async_trait]
impl ComponentSeparator for MockSeparator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn separate(
        &self,
        audio_path: &Path,
        out_dir: &Path,
    ) -> Result<SeparatedTracks, SeparationError> {
        *self.calls.write().await += 1;

        if *self.panic.read().await {
            panic!("mock separator panicked on {}", audio_path.display());
        }
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        tokio::fs::create_dir_all(out_dir).await?;
        let tracks = SeparatedTracks {
            harmonic: out_dir.join("harmonic.wav"),
            percussive: out_dir.join("percussive.wav"),
        };
        tokio::fs::write(&tracks.harmonic, b"mock harmonic").await?;
        tokio::fs::write(&tracks.percussive, b"mock percussive").await?;
        Ok(tracks)
    }
}
