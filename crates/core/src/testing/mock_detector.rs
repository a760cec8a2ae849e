//! Mock detector for testing.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::detect::{DetectedEvents, DetectionError, EventDetector};

use super::fixtures;

/// Mock implementation of the EventDetector trait.
///
/// Returns the configured events, by default 16 beats at 120 BPM with a
/// downbeat every fourth beat.
#[derive(Debug)]
pub struct MockDetector {
    events: Arc<RwLock<DetectedEvents>>,
    next_error: Arc<RwLock<Option<DetectionError>>>,
}

impl Default for MockDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDetector {
    /// Create a new mock detector.
    pub fn new() -> Self {
        let beats = fixtures::beats(16);
        let downbeats = fixtures::downbeats(&beats);
        Self {
            events: Arc::new(RwLock::new(DetectedEvents::from_events(beats, downbeats))),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Set the events returned by detection.
    pub async fn set_events(&self, beats: Vec<f64>, downbeats: Vec<f64>) {
        *self.events.write().await = DetectedEvents::from_events(beats, downbeats);
    }

    /// Replace the returned events entirely.
    pub async fn set_detected(&self, events: DetectedEvents) {
        *self.events.write().await = events;
    }

    /// Configure the next detection to fail with the given error.
    pub async fn set_next_error(&self, error: DetectionError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl EventDetector for MockDetector {
    fn name(&self) -> &str {
        "mock"
    }

    async fn detect(&self, _audio_path: &Path) -> Result<DetectedEvents, DetectionError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        Ok(self.events.read().await.clone())
    }
}
