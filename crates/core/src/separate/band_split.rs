//! Frequency band split through ffmpeg filters.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{ComponentSeparator, SeparatedTracks, SeparationError};
use crate::tool;

/// Coarse separator: low band as "harmonic", high band as "percussive".
///
/// Not a source-separation model. The split keeps hi-hats, snares and
/// transients in the percussive track, which is what beat detection needs.
pub struct BandSplitSeparator {
    ffmpeg_path: PathBuf,
    crossover_hz: u32,
}

impl BandSplitSeparator {
    /// Default crossover frequency in Hz.
    pub const DEFAULT_CROSSOVER_HZ: u32 = 1500;

    /// Creates a separator using the given ffmpeg binary.
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            crossover_hz: Self::DEFAULT_CROSSOVER_HZ,
        }
    }

    /// Sets the crossover frequency.
    pub fn with_crossover(mut self, hz: u32) -> Self {
        self.crossover_hz = hz;
        self
    }

    /// Builds ffmpeg arguments producing both tracks in one pass.
    fn build_args(&self, input: &Path, harmonic: &Path, percussive: &Path) -> Vec<String> {
        let f = self.crossover_hz;
        vec![
            "-y".to_string(),
            "-v".to_string(),
            "error".to_string(),
            "-i".to_string(),
            tool::arg(input),
            "-filter_complex".to_string(),
            format!(
                "[0:a]asplit=2[lo][hi];[lo]lowpass=f={f},lowpass=f={f}[h];[hi]highpass=f={f},highpass=f={f}[p]"
            ),
            "-map".to_string(),
            "[h]".to_string(),
            "-acodec".to_string(),
            "pcm_s16le".to_string(),
            tool::arg(harmonic),
            "-map".to_string(),
            "[p]".to_string(),
            "-acodec".to_string(),
            "pcm_s16le".to_string(),
            tool::arg(percussive),
        ]
    }
}

#[async_trait]
impl ComponentSeparator for BandSplitSeparator {
    fn name(&self) -> &str {
        "band-split"
    }

    async fn separate(
        &self,
        audio_path: &Path,
        out_dir: &Path,
    ) -> Result<SeparatedTracks, SeparationError> {
        if !audio_path.exists() {
            return Err(SeparationError::InputNotFound {
                path: audio_path.to_path_buf(),
            });
        }
        tokio::fs::create_dir_all(out_dir).await?;

        let tracks = SeparatedTracks {
            harmonic: out_dir.join("harmonic.wav"),
            percussive: out_dir.join("percussive.wav"),
        };

        let args = self.build_args(audio_path, &tracks.harmonic, &tracks.percussive);
        debug!(crossover_hz = self.crossover_hz, "Running band split");
        tool::run(&self.ffmpeg_path, &args).await?;

        if !tracks.harmonic.exists() || !tracks.percussive.exists() {
            return Err(SeparationError::failed("ffmpeg did not write both tracks"));
        }
        Ok(tracks)
    }
}
