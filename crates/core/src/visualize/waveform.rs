//! Min/max waveform with beat markers, drawn with `image`.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageEncoder, Rgb, RgbImage};
use std::path::{Path, PathBuf};

use super::{VisualizationError, Visualizer};
use crate::audio::{self, Pcm};
use crate::config::VisualizationConfig;

const BACKGROUND: Rgb<u8> = Rgb([24, 24, 32]);
const WAVEFORM: Rgb<u8> = Rgb([90, 160, 220]);
const BEAT: Rgb<u8> = Rgb([220, 50, 50]);
const DOWNBEAT: Rgb<u8> = Rgb([240, 210, 40]);

/// Decode rate for drawing; plenty for a few thousand columns.
const DECODE_RATE: u32 = 8_000;

/// Waveform image renderer.
pub struct WaveformVisualizer {
    ffmpeg_path: PathBuf,
    width: u32,
    height: u32,
}

impl WaveformVisualizer {
    /// Creates a visualizer with the given ffmpeg binary and image size.
    pub fn new(ffmpeg_path: impl Into<PathBuf>, config: &VisualizationConfig) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            width: config.width.max(2),
            height: config.height.max(2),
        }
    }

    /// Draws the waveform and markers.
    fn draw(pcm: &Pcm, beats: &[f64], downbeats: &[f64], width: u32, height: u32) -> RgbImage {
        let mut img = RgbImage::from_pixel(width, height, BACKGROUND);
        let mid = (height / 2) as f32;
        let half = mid - 1.0;

        let per_column = (pcm.samples.len() as f64 / width as f64).max(1.0);
        for x in 0..width {
            let from = (x as f64 * per_column) as usize;
            let to = (((x + 1) as f64 * per_column) as usize).min(pcm.samples.len());
            if from >= to {
                continue;
            }
            let (lo, hi) = pcm.samples[from..to]
                .iter()
                .fold((0.0f32, 0.0f32), |(lo, hi), s| (lo.min(*s), hi.max(*s)));

            let top = (mid - hi.clamp(-1.0, 1.0) * half).round() as u32;
            let bottom = (mid - lo.clamp(-1.0, 1.0) * half).round() as u32;
            for y in top.min(height - 1)..=bottom.min(height - 1) {
                img.put_pixel(x, y, WAVEFORM);
            }
        }

        let duration = pcm.duration_secs();
        if duration > 0.0 {
            for &t in beats {
                Self::marker(&mut img, t / duration, BEAT, 1);
            }
            // Downbeats on top, wider
            for &t in downbeats {
                Self::marker(&mut img, t / duration, DOWNBEAT, 2);
            }
        }

        img
    }

    /// Vertical line at `fraction` of the width.
    fn marker(img: &mut RgbImage, fraction: f64, color: Rgb<u8>, thickness: u32) {
        if !(0.0..=1.0).contains(&fraction) {
            return;
        }
        let (width, height) = img.dimensions();
        let x0 = ((fraction * (width - 1) as f64).round() as u32).min(width - 1);
        for x in x0..(x0 + thickness).min(width) {
            for y in 0..height {
                img.put_pixel(x, y, color);
            }
        }
    }

    /// PNG-encodes and base64-encodes an image.
    fn encode(img: &RgbImage) -> Result<String, VisualizationError> {
        let mut png = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut png);
        encoder.write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgb8,
        )?;
        Ok(STANDARD.encode(png))
    }
}

#[async_trait]
impl Visualizer for WaveformVisualizer {
    fn name(&self) -> &str {
        "waveform"
    }

    async fn render(
        &self,
        audio_path: &Path,
        beats: &[f64],
        downbeats: &[f64],
    ) -> Result<String, VisualizationError> {
        let pcm = audio::decode_mono(&self.ffmpeg_path, audio_path, DECODE_RATE).await?;

        let beats = beats.to_vec();
        let downbeats = downbeats.to_vec();
        let (width, height) = (self.width, self.height);

        tokio::task::spawn_blocking(move || {
            let img = Self::draw(&pcm, &beats, &downbeats, width, height);
            Self::encode(&img)
        })
        .await
        .map_err(|e| VisualizationError::Task(e.to_string()))?
    }
}
