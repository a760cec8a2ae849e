//! Mock acquirer for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::acquisition::{AcquiredMedia, AcquisitionError, MediaAcquirer};
use crate::locator::SourceLocator;

/// A recorded acquisition for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedAcquisition {
    /// Video id that was requested.
    pub video_id: String,
    /// Directory the media was written to.
    pub dest_dir: PathBuf,
}

/// Mock implementation of the MediaAcquirer trait.
///
/// Writes small placeholder files instead of downloading:
/// - `audio.wav` always
/// - `video.mp4` and `video.jpg` when video output is enabled
///
/// # Example
///
/// ```rust,ignore
/// let acquirer = MockAcquirer::new();
/// acquirer.set_delay(Duration::from_millis(200)).await;
/// acquirer.set_next_error(AcquisitionError::not_found("gone")).await;
/// ```
#[derive(Debug)]
pub struct MockAcquirer {
    name: String,
    calls: Arc<RwLock<Vec<RecordedAcquisition>>>,
    completed: Arc<RwLock<usize>>,
    next_error: Arc<RwLock<Option<AcquisitionError>>>,
    delay: Arc<RwLock<Duration>>,
    never_complete: Arc<RwLock<bool>>,
    with_video: Arc<RwLock<bool>>,
    duration_secs: Arc<RwLock<Option<f64>>>,
}

impl Default for MockAcquirer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAcquirer {
    /// Create a new mock acquirer that writes audio and video.
    pub fn new() -> Self {
        Self::named("mock")
    }

    /// Create a mock acquirer with a custom name.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            calls: Arc::new(RwLock::new(Vec::new())),
            completed: Arc::new(RwLock::new(0)),
            next_error: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
            never_complete: Arc::new(RwLock::new(false)),
            with_video: Arc::new(RwLock::new(true)),
            duration_secs: Arc::new(RwLock::new(Some(212.0))),
        }
    }

    /// Create a mock acquirer that writes audio only.
    pub fn audio_only() -> Self {
        Self {
            with_video: Arc::new(RwLock::new(false)),
            ..Self::named("mock-audio")
        }
    }

    /// Configure the next acquisition to fail with the given error.
    pub async fn set_next_error(&self, error: AcquisitionError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make acquisitions hang forever.
    pub async fn set_never_complete(&self, never: bool) {
        *self.never_complete.write().await = never;
    }

    /// Set the simulated download time.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Enable or disable writing a video and thumbnail.
    pub async fn set_with_video(&self, with_video: bool) {
        *self.with_video.write().await = with_video;
    }

    /// Set the duration reported by the source.
    pub async fn set_duration(&self, secs: Option<f64>) {
        *self.duration_secs.write().await = secs;
    }

    /// Number of acquisitions started.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Number of acquisitions that ran to completion.
    pub async fn completed_count(&self) -> usize {
        *self.completed.read().await
    }

    /// All recorded acquisitions.
    pub async fn recorded_calls(&self) -> Vec<RecordedAcquisition> {
        self.calls.read().await.clone()
    }

    async fn write_outputs(&self, dest_dir: &Path) -> Result<AcquiredMedia, AcquisitionError> {
        tokio::fs::create_dir_all(dest_dir).await?;
        let audio = dest_dir.join("audio.wav");
        tokio::fs::write(&audio, b"RIFF mock audio").await?;

        let mut media = AcquiredMedia::audio(audio, "Mock Song");
        if *self.with_video.read().await {
            let video = dest_dir.join("video.mp4");
            let thumbnail = dest_dir.join("video.jpg");
            tokio::fs::write(&video, b"mock video").await?;
            tokio::fs::write(&thumbnail, b"mock thumbnail").await?;
            media = media.with_video(video).with_thumbnail(thumbnail);
        }
        if let Some(secs) = *self.duration_secs.read().await {
            media = media.with_duration(secs);
        }
        Ok(media)
    }
}

#[async_trait]
impl MediaAcquirer for MockAcquirer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn acquire(
        &self,
        locator: &SourceLocator,
        dest_dir: &Path,
    ) -> Result<AcquiredMedia, AcquisitionError> {
        self.calls.write().await.push(RecordedAcquisition {
            video_id: locator.video_id().to_string(),
            dest_dir: dest_dir.to_path_buf(),
        });

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        if *self.never_complete.read().await {
            std::future::pending::<()>().await;
        }

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let media = self.write_outputs(dest_dir).await?;
        *self.completed.write().await += 1;
        Ok(media)
    }
}
