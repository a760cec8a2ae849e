//! yt-dlp based acquirer.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::error::AcquisitionError;
use super::traits::MediaAcquirer;
use super::types::AcquiredMedia;
use crate::config::{AcquisitionConfig, ToolsConfig};
use crate::locator::SourceLocator;
use crate::tool::{self, ToolError};

const THUMBNAIL_EXTENSIONS: [&str; 4] = ["jpg", "webp", "png", "jpeg"];
const VIDEO_EXTENSIONS: [&str; 3] = ["mp4", "mkv", "webm"];

/// What the acquirer downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionMode {
    /// Video with audio, merged to mp4, plus metadata and thumbnail. The
    /// audio track is then extracted to WAV.
    Full,
    /// Best audio stream only, converted to WAV by yt-dlp.
    AudioOnly,
}

/// Acquirer that shells out to yt-dlp (and ffmpeg for audio extraction).
pub struct YtDlpAcquirer {
    mode: AcquisitionMode,
    ytdlp_path: PathBuf,
    ffmpeg_path: PathBuf,
    retries: u32,
    max_height: u32,
}

/// The subset of yt-dlp's info JSON we read.
#[derive(Debug, Deserialize)]
struct VideoInfo {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
}

impl YtDlpAcquirer {
    /// Creates an acquirer in the given mode.
    pub fn new(mode: AcquisitionMode, tools: &ToolsConfig, config: &AcquisitionConfig) -> Self {
        Self {
            mode,
            ytdlp_path: tools.ytdlp_path.clone(),
            ffmpeg_path: tools.ffmpeg_path.clone(),
            retries: config.network_retries,
            max_height: config.max_video_height,
        }
    }

    /// Primary acquirer: video, thumbnail and extracted audio.
    pub fn full(tools: &ToolsConfig, config: &AcquisitionConfig) -> Self {
        Self::new(AcquisitionMode::Full, tools, config)
    }

    /// Fallback acquirer: audio only.
    pub fn audio_only(tools: &ToolsConfig, config: &AcquisitionConfig) -> Self {
        Self::new(AcquisitionMode::AudioOnly, tools, config)
    }

    /// The acquisition mode.
    pub fn mode(&self) -> AcquisitionMode {
        self.mode
    }

    /// Builds yt-dlp arguments for this mode.
    fn build_args(&self, url: &str, dest_dir: &Path) -> Vec<String> {
        let mut args = vec![
            "--no-playlist".to_string(),
            "--no-progress".to_string(),
            "--retries".to_string(),
            self.retries.to_string(),
            "--fragment-retries".to_string(),
            self.retries.to_string(),
            // Print the info JSON on stdout and still download
            "--dump-json".to_string(),
            "--no-simulate".to_string(),
        ];

        // Only hand over ffmpeg when it is an explicit path
        if self.ffmpeg_path.components().count() > 1 {
            args.extend(["--ffmpeg-location".to_string(), tool::arg(&self.ffmpeg_path)]);
        }

        match self.mode {
            AcquisitionMode::Full => {
                args.extend([
                    "-f".to_string(),
                    format!(
                        "bestvideo[height<={h}]+bestaudio/best[height<={h}]",
                        h = self.max_height
                    ),
                    "--merge-output-format".to_string(),
                    "mp4".to_string(),
                    // Single-file formats skip the merge step
                    "--remux-video".to_string(),
                    "mp4".to_string(),
                    "--write-info-json".to_string(),
                    "--write-thumbnail".to_string(),
                    "-o".to_string(),
                    tool::arg(&dest_dir.join("video.%(ext)s")),
                ]);
            }
            AcquisitionMode::AudioOnly => {
                args.extend([
                    "-f".to_string(),
                    "bestaudio/best".to_string(),
                    "-x".to_string(),
                    "--audio-format".to_string(),
                    "wav".to_string(),
                    "-o".to_string(),
                    tool::arg(&dest_dir.join("audio.%(ext)s")),
                ]);
            }
        }

        args.push(url.to_string());
        args
    }

    /// Maps a failed yt-dlp run onto the acquisition taxonomy.
    fn classify_failure(err: ToolError) -> AcquisitionError {
        let Some(stderr) = err.stderr() else {
            return AcquisitionError::Tool(err);
        };
        let lower = stderr.to_lowercase();

        const NOT_FOUND: [&str; 6] = [
            "video unavailable",
            "private video",
            "this video is not available",
            "has been removed",
            "does not exist",
            "http error 404",
        ];
        const NETWORK: [&str; 7] = [
            "unable to download",
            "timed out",
            "connection",
            "temporary failure",
            "network is unreachable",
            "http error 5",
            "http error 429",
        ];

        if NOT_FOUND.iter().any(|m| lower.contains(m)) {
            AcquisitionError::not_found(stderr.to_string())
        } else if NETWORK.iter().any(|m| lower.contains(m)) {
            AcquisitionError::network(stderr.to_string())
        } else {
            AcquisitionError::Tool(err)
        }
    }

    /// Reads title and duration from the first JSON line on stdout.
    fn parse_info(stdout: &str) -> (String, Option<f64>) {
        stdout
            .lines()
            .find(|l| l.trim_start().starts_with('{'))
            .and_then(|l| serde_json::from_str::<VideoInfo>(l).ok())
            .map(|info| (info.title.unwrap_or_default(), info.duration))
            .unwrap_or_default()
    }

    /// First existing `<dir>/<stem>.<ext>` among `extensions`.
    fn find_output(dir: &Path, stem: &str, extensions: &[&str]) -> Option<PathBuf> {
        extensions
            .iter()
            .map(|ext| dir.join(format!("{}.{}", stem, ext)))
            .find(|p| p.exists())
    }

    /// Whether `video` has to be remuxed before it can be served as mp4.
    fn needs_remux(video: &Path) -> bool {
        !video
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("mp4"))
    }

    /// Stream-copies `input` into an mp4 container at `output`.
    fn remux_args(input: &Path, output: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-v".to_string(),
            "error".to_string(),
            "-i".to_string(),
            tool::arg(input),
            "-c".to_string(),
            "copy".to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            tool::arg(output),
        ]
    }

    /// Returns an mp4 path for `video`, remuxing it next to the original when
    /// yt-dlp left another container behind.
    async fn ensure_mp4(&self, video: PathBuf) -> Result<PathBuf, AcquisitionError> {
        if !Self::needs_remux(&video) {
            return Ok(video);
        }
        let output = video.with_extension("mp4");
        debug!(input = %video.display(), "Remuxing video to mp4");
        tool::run(&self.ffmpeg_path, &Self::remux_args(&video, &output)).await?;
        if let Err(e) = tokio::fs::remove_file(&video).await {
            debug!(path = %video.display(), error = %e, "Failed to remove original video");
        }
        Ok(output)
    }

    /// Extracts the audio track of `video` to 44.1 kHz stereo WAV.
    async fn extract_audio(&self, video: &Path, output: &Path) -> Result<(), AcquisitionError> {
        let args = vec![
            "-y".to_string(),
            "-v".to_string(),
            "error".to_string(),
            "-i".to_string(),
            tool::arg(video),
            "-vn".to_string(),
            "-acodec".to_string(),
            "pcm_s16le".to_string(),
            "-ar".to_string(),
            "44100".to_string(),
            "-ac".to_string(),
            "2".to_string(),
            tool::arg(output),
        ];
        tool::run(&self.ffmpeg_path, &args).await?;
        Ok(())
    }
}

#[async_trait]
impl MediaAcquirer for YtDlpAcquirer {
    fn name(&self) -> &str {
        match self.mode {
            AcquisitionMode::Full => "yt-dlp",
            AcquisitionMode::AudioOnly => "yt-dlp-audio",
        }
    }

    async fn acquire(
        &self,
        locator: &SourceLocator,
        dest_dir: &Path,
    ) -> Result<AcquiredMedia, AcquisitionError> {
        tokio::fs::create_dir_all(dest_dir).await?;

        let url = locator.canonical_url();
        let args = self.build_args(&url, dest_dir);
        debug!(acquirer = self.name(), url = %url, "Running yt-dlp");

        let output = tool::run(&self.ytdlp_path, &args)
            .await
            .map_err(Self::classify_failure)?;
        let (title, duration) = Self::parse_info(&String::from_utf8_lossy(&output.stdout));

        let media = match self.mode {
            AcquisitionMode::Full => {
                let video = Self::find_output(dest_dir, "video", &VIDEO_EXTENSIONS)
                    .ok_or_else(|| AcquisitionError::missing_output("video file not written"))?;
                let video = self.ensure_mp4(video).await?;
                let audio = dest_dir.join("audio.wav");
                self.extract_audio(&video, &audio).await?;

                let mut media = AcquiredMedia::audio(audio, title).with_video(video);
                if let Some(thumb) = Self::find_output(dest_dir, "video", &THUMBNAIL_EXTENSIONS) {
                    media = media.with_thumbnail(thumb);
                }
                media
            }
            AcquisitionMode::AudioOnly => {
                let audio = Self::find_output(dest_dir, "audio", &["wav"])
                    .ok_or_else(|| AcquisitionError::missing_output("audio file not written"))?;
                AcquiredMedia::audio(audio, title)
            }
        };

        let media = match duration {
            Some(d) => media.with_duration(d),
            None => media,
        };

        info!(
            acquirer = self.name(),
            video_id = %locator.video_id(),
            title = %media.title,
            duration_secs = ?media.duration_secs,
            "Media acquired"
        );
        Ok(media)
    }
}
