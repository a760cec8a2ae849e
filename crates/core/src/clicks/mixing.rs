//! Sine-click synthesis mixed into decoded tracks.

use async_trait::async_trait;
use std::f32::consts::TAU;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::{ClickSources, ClickTrackError, ClickTrackRenderer, ClickTracks};
use crate::audio::{self, Pcm};
use crate::config::ClickTrackConfig;

/// Peak level of the click layer after normalization.
const CLICK_LEVEL: f32 = 0.8;
/// Peak level of the music layer after normalization.
const TRACK_LEVEL: f32 = 0.7;

/// Adds a decaying sine click at every event time.
///
/// Clicks past the end of `out` are dropped.
pub fn synthesize_clicks(
    out: &mut [f32],
    times: &[f64],
    sample_rate: u32,
    freq_hz: f32,
    duration_ms: u32,
) {
    let click_len = (sample_rate as u64 * duration_ms as u64 / 1000) as usize;
    if click_len == 0 {
        return;
    }
    let rate = sample_rate as f32;
    // Decays to about 1% by the end of the click
    let decay = 4.6 / click_len as f32;

    for &t in times {
        let start = (t * sample_rate as f64).round() as usize;
        if start >= out.len() {
            continue;
        }
        let end = (start + click_len).min(out.len());
        for (n, sample) in out[start..end].iter_mut().enumerate() {
            let phase = TAU * freq_hz * n as f32 / rate;
            *sample += phase.sin() * (-(n as f32) * decay).exp();
        }
    }
}

/// Renders clicks into the original, harmonic and percussive tracks.
///
/// Beats click at the beat frequency and downbeats at the downbeat
/// frequency. Clicks are normalized to 0.8 and each track to 0.7 before
/// summing. If the original track cannot be decoded nothing is written; a
/// separated track that fails to decode only loses its own output.
pub struct MixingClickTrackRenderer {
    ffmpeg_path: PathBuf,
    config: ClickTrackConfig,
}

impl MixingClickTrackRenderer {
    /// Creates a renderer with the given ffmpeg binary and settings.
    pub fn new(ffmpeg_path: impl Into<PathBuf>, config: ClickTrackConfig) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            config,
        }
    }

    /// Normalized click layer of `len` samples.
    fn click_layer(&self, len: usize, beats: &[f64], downbeats: &[f64]) -> Vec<f32> {
        let mut clicks = vec![0.0f32; len];
        let c = &self.config;
        synthesize_clicks(&mut clicks, beats, c.sample_rate, c.beat_freq_hz, c.click_duration_ms);
        synthesize_clicks(
            &mut clicks,
            downbeats,
            c.sample_rate,
            c.downbeat_freq_hz,
            c.click_duration_ms,
        );
        audio::normalize(&mut clicks, CLICK_LEVEL);
        clicks
    }

    /// Track normalized to 0.7 plus the click layer.
    fn mix(&self, mut track: Vec<f32>, clicks: &[f32]) -> Pcm {
        audio::normalize(&mut track, TRACK_LEVEL);
        for (s, c) in track.iter_mut().zip(clicks) {
            *s = (*s + c).clamp(-1.0, 1.0);
        }
        Pcm {
            samples: track,
            sample_rate: self.config.sample_rate,
        }
    }

    /// Decodes `source`, mixes in clicks and writes `dest`.
    async fn render_one(
        &self,
        source: &Path,
        dest: PathBuf,
        beats: &[f64],
        downbeats: &[f64],
    ) -> Result<PathBuf, ClickTrackError> {
        let pcm = audio::decode_mono(&self.ffmpeg_path, source, self.config.sample_rate).await?;
        let clicks = self.click_layer(pcm.samples.len(), beats, downbeats);
        audio::write_wav(&dest, self.mix(pcm.samples, &clicks)).await?;
        Ok(dest)
    }
}

#[async_trait]
impl ClickTrackRenderer for MixingClickTrackRenderer {
    fn name(&self) -> &str {
        "mixing"
    }

    async fn render(
        &self,
        sources: &ClickSources,
        beats: &[f64],
        downbeats: &[f64],
        out_dir: &Path,
    ) -> Result<ClickTracks, ClickTrackError> {
        tokio::fs::create_dir_all(out_dir).await?;

        let original =
            audio::decode_mono(&self.ffmpeg_path, &sources.original, self.config.sample_rate)
                .await?;
        let clicks = self.click_layer(original.samples.len(), beats, downbeats);

        let clicks_only = out_dir.join("clicks_only.wav");
        audio::write_wav(
            &clicks_only,
            Pcm {
                samples: clicks.clone(),
                sample_rate: self.config.sample_rate,
            },
        )
        .await?;

        let with_original = out_dir.join("audio_with_clicks.wav");
        audio::write_wav(&with_original, self.mix(original.samples, &clicks)).await?;

        let mut tracks = ClickTracks {
            with_original: Some(with_original),
            clicks_only: Some(clicks_only),
            ..Default::default()
        };

        match self
            .render_one(
                &sources.harmonic,
                out_dir.join("harmonic_with_clicks.wav"),
                beats,
                downbeats,
            )
            .await
        {
            Ok(path) => tracks.with_harmonic = Some(path),
            Err(e) => warn!(error = %e, "Harmonic click track failed"),
        }

        match self
            .render_one(
                &sources.percussive,
                out_dir.join("percussive_with_clicks.wav"),
                beats,
                downbeats,
            )
            .await
        {
            Ok(path) => tracks.with_percussive = Some(path),
            Err(e) => warn!(error = %e, "Percussive click track failed"),
        }

        Ok(tracks)
    }
}
