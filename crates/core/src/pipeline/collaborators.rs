//! The set of stage implementations a pipeline runs with.

use std::sync::Arc;

use crate::acquisition::{MediaAcquirer, YtDlpAcquirer};
use crate::clicks::{ClickTrackRenderer, MixingClickTrackRenderer};
use crate::config::Config;
use crate::detect::{CommandDetector, EventDetector};
use crate::probe::{FfprobeProber, MediaProber};
use crate::separate::{BandSplitSeparator, ComponentSeparator};
use crate::steps::{FixedVocabularySteps, StepStrategy};
use crate::visualize::{Visualizer, WaveformVisualizer};

/// Stage implementations, shared across jobs.
#[derive(Clone)]
pub struct Collaborators {
    /// Primary acquisition path.
    pub acquirer: Arc<dyn MediaAcquirer>,
    /// Alternate acquisition path, tried at most once per job.
    pub fallback_acquirer: Arc<dyn MediaAcquirer>,
    pub prober: Arc<dyn MediaProber>,
    pub separator: Arc<dyn ComponentSeparator>,
    pub detector: Arc<dyn EventDetector>,
    pub visualizer: Arc<dyn Visualizer>,
    pub click_tracks: Arc<dyn ClickTrackRenderer>,
    pub steps: Arc<dyn StepStrategy>,
}

impl Collaborators {
    /// Real implementations backed by yt-dlp, ffmpeg and ffprobe.
    pub fn from_config(config: &Config) -> Self {
        let tools = &config.tools;
        Self {
            acquirer: Arc::new(YtDlpAcquirer::full(tools, &config.acquisition)),
            fallback_acquirer: Arc::new(YtDlpAcquirer::audio_only(tools, &config.acquisition)),
            prober: Arc::new(FfprobeProber::new(&tools.ffprobe_path)),
            separator: Arc::new(BandSplitSeparator::new(&tools.ffmpeg_path)),
            detector: Arc::new(CommandDetector::new(&config.detection)),
            visualizer: Arc::new(WaveformVisualizer::new(
                &tools.ffmpeg_path,
                &config.visualization,
            )),
            click_tracks: Arc::new(MixingClickTrackRenderer::new(
                &tools.ffmpeg_path,
                config.click_track.clone(),
            )),
            steps: Arc::new(FixedVocabularySteps),
        }
    }

    /// Replaces the step strategy.
    pub fn with_steps(mut self, steps: Arc<dyn StepStrategy>) -> Self {
        self.steps = steps;
        self
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("acquirer", &self.acquirer.name())
            .field("fallback_acquirer", &self.fallback_acquirer.name())
            .field("prober", &self.prober.name())
            .field("separator", &self.separator.name())
            .field("detector", &self.detector.name())
            .field("visualizer", &self.visualizer.name())
            .field("click_tracks", &self.click_tracks.name())
            .field("steps", &self.steps.name())
            .finish()
    }
}
