//! Testing utilities and mock implementations of the stage traits.
//!
//! Every mock writes small placeholder files where the real implementation
//! would produce media, so a whole pipeline run works on a temp directory
//! without yt-dlp or ffmpeg installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use stepbeat_core::testing::MockCollaborators;
//!
//! let mocks = MockCollaborators::new();
//! mocks.detector.set_events(fixtures::beats(8), vec![0.0]).await;
//! mocks.visualizer.set_next_error(/* ... */).await;
//!
//! let orchestrator = PipelineOrchestrator::new(&config, registry, mocks.collaborators());
//! ```

mod mock_acquirer;
mod mock_detector;
mod mock_prober;
mod mock_renderers;
mod mock_separator;

pub use mock_acquirer::{MockAcquirer, RecordedAcquisition};
pub use mock_detector::MockDetector;
pub use mock_prober::MockProber;
pub use mock_renderers::{MockClickTrackRenderer, MockVisualizer, MOCK_IMAGE};
pub use mock_separator::MockSeparator;

use std::sync::Arc;

use crate::pipeline::Collaborators;
use crate::steps::FixedVocabularySteps;

/// One mock per stage, kept so tests can configure them after wiring.
#[derive(Debug, Clone)]
pub struct MockCollaborators {
    pub acquirer: Arc<MockAcquirer>,
    pub fallback_acquirer: Arc<MockAcquirer>,
    pub prober: Arc<MockProber>,
    pub separator: Arc<MockSeparator>,
    pub detector: Arc<MockDetector>,
    pub visualizer: Arc<MockVisualizer>,
    pub click_tracks: Arc<MockClickTrackRenderer>,
}

impl Default for MockCollaborators {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCollaborators {
    /// Fresh mocks. The fallback acquirer writes audio only.
    pub fn new() -> Self {
        Self {
            acquirer: Arc::new(MockAcquirer::named("mock")),
            fallback_acquirer: Arc::new(MockAcquirer::audio_only()),
            prober: Arc::new(MockProber::new()),
            separator: Arc::new(MockSeparator::new()),
            detector: Arc::new(MockDetector::new()),
            visualizer: Arc::new(MockVisualizer::new()),
            click_tracks: Arc::new(MockClickTrackRenderer::new()),
        }
    }

    /// Trait-object view for the orchestrator.
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            acquirer: self.acquirer.clone(),
            fallback_acquirer: self.fallback_acquirer.clone(),
            prober: self.prober.clone(),
            separator: self.separator.clone(),
            detector: self.detector.clone(),
            visualizer: self.visualizer.clone(),
            click_tracks: self.click_tracks.clone(),
            steps: Arc::new(FixedVocabularySteps),
        }
    }
}

/// Test fixtures and helper functions.
pub mod fixtures {
    /// `n` beats half a second apart, starting at zero (120 BPM).
    pub fn beats(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64 * 0.5).collect()
    }

    /// Every fourth entry of `beats`.
    pub fn downbeats(beats: &[f64]) -> Vec<f64> {
        beats.iter().step_by(4).copied().collect()
    }
}
