//! ffprobe-based prober.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::{MediaInfo, MediaProber, ProbeError};
use crate::tool;

/// Prober that runs ffprobe and parses its JSON output.
pub struct FfprobeProber {
    ffprobe_path: PathBuf,
}

impl FfprobeProber {
    /// Creates a prober using the given ffprobe binary.
    pub fn new(ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }

    /// Parses ffprobe JSON output into MediaInfo.
    fn parse_probe_output(path: &Path, output: &str) -> Result<MediaInfo, ProbeError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            format: ProbeFormat,
            #[serde(default)]
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            format_name: String,
            duration: Option<String>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            codec_type: String,
            codec_name: Option<String>,
            sample_rate: Option<String>,
            channels: Option<u8>,
            duration: Option<String>,
        }

        let probe: ProbeOutput =
            serde_json::from_str(output).map_err(|e| ProbeError::ParseError {
                reason: format!("Failed to parse ffprobe output: {}", e),
            })?;

        let audio_stream = probe.streams.iter().find(|s| s.codec_type == "audio");

        // Raw streams sometimes only carry a per-stream duration
        let duration_secs = probe
            .format
            .duration
            .as_ref()
            .or_else(|| audio_stream.and_then(|s| s.duration.as_ref()))
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0);

        let format_name = probe
            .format
            .format_name
            .split(',')
            .next()
            .unwrap_or("unknown");

        Ok(MediaInfo {
            path: path.to_path_buf(),
            duration_secs,
            format: format_name.to_string(),
            audio_codec: audio_stream.and_then(|s| s.codec_name.clone()),
            audio_sample_rate: audio_stream
                .and_then(|s| s.sample_rate.as_ref())
                .and_then(|r| r.parse::<u32>().ok()),
            audio_channels: audio_stream.and_then(|s| s.channels),
        })
    }
}

#[async_trait]
impl MediaProber for FfprobeProber {
    fn name(&self) -> &str {
        "ffprobe"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, ProbeError> {
        if !path.exists() {
            return Err(ProbeError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let args = vec![
            "-v".to_string(),
            "quiet".to_string(),
            "-print_format".to_string(),
            "json".to_string(),
            "-show_format".to_string(),
            "-show_streams".to_string(),
            tool::arg(path),
        ];
        let output = tool::run(&self.ffprobe_path, &args).await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let info = Self::parse_probe_output(path, &stdout)?;
        if !info.has_audio() {
            return Err(ProbeError::NoAudio {
                path: path.to_path_buf(),
            });
        }
        Ok(info)
    }
}
