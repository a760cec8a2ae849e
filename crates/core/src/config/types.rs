use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub acquisition: AcquisitionConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub visualization: VisualizationConfig,
    #[serde(default)]
    pub click_track: ClickTrackConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    7081
}

/// Where downloads land and where artifacts are published.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Published artifacts, served under `/static/<job_id>/`.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    /// Raw downloads, one subdirectory per job.
    #[serde(default = "default_videos_dir")]
    pub videos_dir: PathBuf,
    /// Scratch space for separation and click-track rendering.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
    /// Public URL prefix for published artifacts.
    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            static_dir: default_static_dir(),
            videos_dir: default_videos_dir(),
            work_dir: default_work_dir(),
            public_prefix: default_public_prefix(),
        }
    }
}

impl StorageConfig {
    /// Places all three directories under one root.
    pub fn under(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            static_dir: root.join("static"),
            videos_dir: root.join("videos"),
            work_dir: root.join("work"),
            public_prefix: default_public_prefix(),
        }
    }
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_videos_dir() -> PathBuf {
    PathBuf::from("videos")
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("stepbeat")
}

fn default_public_prefix() -> String {
    "/static".to_string()
}

/// Media acquisition limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AcquisitionConfig {
    /// Deadline for a single acquisition attempt in seconds.
    #[serde(default = "default_acquisition_timeout")]
    pub timeout_secs: u64,
    /// How often a waiting acquisition reports progress, in seconds.
    #[serde(default = "default_progress_interval")]
    pub progress_interval_secs: u64,
    /// Abort the underlying download when the deadline passes instead of
    /// only abandoning the wait.
    #[serde(default)]
    pub abort_on_timeout: bool,
    /// Retry count handed to yt-dlp for transient network errors.
    #[serde(default = "default_network_retries")]
    pub network_retries: u32,
    /// Maximum video height requested from the source.
    #[serde(default = "default_max_height")]
    pub max_video_height: u32,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_acquisition_timeout(),
            progress_interval_secs: default_progress_interval(),
            abort_on_timeout: false,
            network_retries: default_network_retries(),
            max_video_height: default_max_height(),
        }
    }
}

impl AcquisitionConfig {
    /// Sets the acquisition deadline.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Sets the progress reporting interval.
    pub fn with_progress_interval(mut self, interval_secs: u64) -> Self {
        self.progress_interval_secs = interval_secs;
        self
    }
}

fn default_acquisition_timeout() -> u64 {
    180
}

fn default_progress_interval() -> u64 {
    5
}

fn default_network_retries() -> u32 {
    5
}

fn default_max_height() -> u32 {
    720
}

/// Paths to the external media tools.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: PathBuf,
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: default_ytdlp_path(),
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
        }
    }
}

fn default_ytdlp_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

/// External beat detector command.
///
/// The command receives the percussive track path as its last argument and
/// prints `{"beats": [...], "downbeats": [...]}` on stdout. Without a
/// command, detection is reported as unavailable.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DetectionConfig {
    #[serde(default)]
    pub command: Option<PathBuf>,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Waveform image settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VisualizationConfig {
    #[serde(default = "default_image_width")]
    pub width: u32,
    #[serde(default = "default_image_height")]
    pub height: u32,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            width: default_image_width(),
            height: default_image_height(),
        }
    }
}

fn default_image_width() -> u32 {
    1600
}

fn default_image_height() -> u32 {
    400
}

/// Click track synthesis settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClickTrackConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_beat_freq")]
    pub beat_freq_hz: f32,
    #[serde(default = "default_downbeat_freq")]
    pub downbeat_freq_hz: f32,
    #[serde(default = "default_click_duration")]
    pub click_duration_ms: u32,
}

impl Default for ClickTrackConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            beat_freq_hz: default_beat_freq(),
            downbeat_freq_hz: default_downbeat_freq(),
            click_duration_ms: default_click_duration(),
        }
    }
}

fn default_sample_rate() -> u32 {
    44_100
}

fn default_beat_freq() -> f32 {
    1000.0
}

fn default_downbeat_freq() -> f32 {
    1500.0
}

fn default_click_duration() -> u32 {
    100
}
