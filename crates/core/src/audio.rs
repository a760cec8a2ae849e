//! Mono PCM decoding and WAV writing shared by the renderers.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::tool::{self, ToolError};

/// Errors while moving audio in and out of PCM.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Audio file not found: {path}")]
    InputNotFound { path: PathBuf },

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("Decoded no audio from {path}")]
    Empty { path: PathBuf },

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Audio task failed: {0}")]
    Task(String),
}

/// Mono PCM samples in [-1.0, 1.0].
#[derive(Debug, Clone, PartialEq)]
pub struct Pcm {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Pcm {
    /// Length in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decodes any ffmpeg-readable file to mono f32 PCM at `sample_rate`.
pub async fn decode_mono(ffmpeg: &Path, input: &Path, sample_rate: u32) -> Result<Pcm, AudioError> {
    if !input.exists() {
        return Err(AudioError::InputNotFound {
            path: input.to_path_buf(),
        });
    }

    let args = vec![
        "-v".to_string(),
        "error".to_string(),
        "-i".to_string(),
        tool::arg(input),
        "-vn".to_string(),
        "-ac".to_string(),
        "1".to_string(),
        "-ar".to_string(),
        sample_rate.to_string(),
        "-f".to_string(),
        "f32le".to_string(),
        "pipe:1".to_string(),
    ];
    let output = tool::run(ffmpeg, &args).await?;

    let samples: Vec<f32> = output
        .stdout
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    if samples.is_empty() {
        return Err(AudioError::Empty {
            path: input.to_path_buf(),
        });
    }

    Ok(Pcm {
        samples,
        sample_rate,
    })
}

/// Writes mono 16-bit WAV, clipping samples to [-1.0, 1.0].
pub async fn write_wav(path: &Path, pcm: Pcm) -> Result<(), AudioError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || write_wav_blocking(&path, &pcm))
        .await
        .map_err(|e| AudioError::Task(e.to_string()))?
}

fn write_wav_blocking(path: &Path, pcm: &Pcm) -> Result<(), AudioError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: pcm.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &s in &pcm.samples {
        let clipped = s.clamp(-1.0, 1.0);
        writer.write_sample((clipped * i16::MAX as f32) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Largest absolute sample value.
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |m, s| m.max(s.abs()))
}

/// Scales samples so the peak equals `target`. Silence is left alone.
pub fn normalize(samples: &mut [f32], target: f32) {
    let p = peak(samples);
    if p > f32::EPSILON {
        let gain = target / p;
        samples.iter_mut().for_each(|s| *s *= gain);
    }
}
