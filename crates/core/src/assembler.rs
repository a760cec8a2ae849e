//! Result assembly and artifact publishing.
//!
//! Artifacts are copied into `<static_dir>/<job_id>/` under fixed names and
//! referenced as `<public_prefix>/<job_id>/<name>`. The result record always
//! carries every artifact key; anything missing becomes an empty string.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::clicks::ClickTracks;
use crate::config::StorageConfig;
use crate::detect::DetectedEvents;
use crate::job::AnalysisResult;
use crate::separate::SeparatedTracks;
use crate::steps::StepAnnotation;

/// Duration used when no stage reported one, in seconds.
pub const DEFAULT_DURATION_SECS: f64 = 180.0;

/// Published file names, one per artifact key.
pub mod names {
    pub const AUDIO_WITH_CLICKS: &str = "audio_with_clicks.wav";
    pub const HARMONIC_WITH_CLICKS: &str = "harmonic_with_clicks.wav";
    pub const PERCUSSIVE_WITH_CLICKS: &str = "percussive_with_clicks.wav";
    pub const HARMONIC: &str = "harmonic.wav";
    pub const PERCUSSIVE: &str = "percussive.wav";
    pub const CLICKS_ONLY: &str = "clicks_only.wav";
    pub const VIDEO: &str = "video.mp4";
    pub const THUMBNAIL_STEM: &str = "thumbnail";
}

/// Everything the pipeline produced for one job.
#[derive(Debug, Clone)]
pub struct AssemblyInput {
    pub job_id: String,
    pub events: DetectedEvents,
    pub steps: Vec<StepAnnotation>,
    /// Base64 PNG, empty when rendering failed.
    pub waveform_image: String,
    pub click_tracks: ClickTracks,
    pub separated: Option<SeparatedTracks>,
    pub video_path: Option<PathBuf>,
    pub probed_duration: Option<f64>,
    pub source_duration: Option<f64>,
}

/// Builds result records and publishes their artifacts.
#[derive(Debug, Clone)]
pub struct ResultAssembler {
    static_dir: PathBuf,
    public_prefix: String,
}

impl ResultAssembler {
    /// Creates an assembler publishing under `static_dir`.
    pub fn new(static_dir: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            static_dir: static_dir.into(),
            public_prefix: public_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    /// Creates an assembler from storage configuration.
    pub fn from_config(storage: &StorageConfig) -> Self {
        Self::new(&storage.static_dir, &storage.public_prefix)
    }

    /// Directory holding a job's published artifacts.
    pub fn job_dir(&self, job_id: &str) -> PathBuf {
        self.static_dir.join(job_id)
    }

    /// Public reference for a published file.
    pub fn url_for(&self, job_id: &str, name: &str) -> String {
        format!("{}/{}/{}", self.public_prefix, job_id, name)
    }

    /// Copies `source` to the job directory as `name` and returns its URL.
    ///
    /// Returns an empty string when there is no source, it does not exist, or
    /// the copy fails. Publishing a file already in place is a no-op.
    pub async fn publish(&self, job_id: &str, source: Option<&Path>, name: &str) -> String {
        let Some(source) = source else {
            return String::new();
        };
        if !source.is_file() {
            debug!(job_id = %job_id, path = %source.display(), "Artifact missing");
            return String::new();
        }

        let dir = self.job_dir(job_id);
        let dest = dir.join(name);
        if dest.as_path() != source {
            if let Err(e) = tokio::fs::create_dir_all(&dir).await {
                warn!(job_id = %job_id, error = %e, "Failed to create artifact directory");
                return String::new();
            }
            if let Err(e) = tokio::fs::copy(source, &dest).await {
                warn!(job_id = %job_id, artifact = name, error = %e, "Failed to publish artifact");
                return String::new();
            }
        }

        self.url_for(job_id, name)
    }

    /// Publishes a thumbnail as `thumbnail.<ext>`, keeping its extension.
    pub async fn publish_thumbnail(&self, job_id: &str, source: &Path) -> String {
        let ext = source
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .map(|e| if e == "jpeg" { "jpg".to_string() } else { e })
            .unwrap_or_else(|| "jpg".to_string());
        let name = format!("{}.{}", names::THUMBNAIL_STEM, ext);
        self.publish(job_id, Some(source), &name).await
    }

    /// Builds the result record, publishing every artifact that exists.
    pub async fn assemble(&self, input: AssemblyInput) -> AnalysisResult {
        let id = input.job_id.as_str();
        let clicks = &input.click_tracks;
        let separated = input.separated.as_ref();

        let audio_with_clicks_url = self
            .publish(id, clicks.with_original.as_deref(), names::AUDIO_WITH_CLICKS)
            .await;
        let harmonic_audio_url = self
            .publish(id, clicks.with_harmonic.as_deref(), names::HARMONIC_WITH_CLICKS)
            .await;
        let percussive_audio_url = self
            .publish(id, clicks.with_percussive.as_deref(), names::PERCUSSIVE_WITH_CLICKS)
            .await;
        let harmonic_original_url = self
            .publish(id, separated.map(|s| s.harmonic.as_path()), names::HARMONIC)
            .await;
        let percussive_original_url = self
            .publish(id, separated.map(|s| s.percussive.as_path()), names::PERCUSSIVE)
            .await;
        let clicks_only_url = self
            .publish(id, clicks.clicks_only.as_deref(), names::CLICKS_ONLY)
            .await;
        let video_url = self
            .publish(id, input.video_path.as_deref(), names::VIDEO)
            .await;

        let duration = input
            .events
            .duration_secs
            .or(input.probed_duration)
            .or(input.source_duration)
            .filter(|d| d.is_finite() && *d > 0.0)
            .unwrap_or(DEFAULT_DURATION_SECS);

        AnalysisResult {
            video_id: input.job_id.clone(),
            duration,
            beats: input.events.beats,
            downbeats: input.events.downbeats,
            steps: input.steps,
            tempo: input.events.tempo_bpm,
            audio_with_clicks_url,
            harmonic_audio_url,
            percussive_audio_url,
            harmonic_original_url,
            percussive_original_url,
            clicks_only_url,
            waveform_image: input.waveform_image,
            video_url,
            completed: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn input(job_id: &str) -> AssemblyInput {
        AssemblyInput {
            job_id: job_id.to_string(),
            events: DetectedEvents::empty(),
            steps: Vec::new(),
            waveform_image: String::new(),
            click_tracks: ClickTracks::default(),
            separated: None,
            video_path: None,
            probed_duration: None,
            source_duration: None,
        }
    }

    #[tokio::test]
    async fn test_missing_artifacts_are_empty_strings() {
        let dir = TempDir::new().unwrap();
        let assembler = ResultAssembler::new(dir.path(), "/static");

        let mut input = input("abc");
        input.click_tracks.with_original = Some(PathBuf::from("/nonexistent/a.wav"));
        let result = assembler.assemble(input).await;

        let json = serde_json::to_value(&result).unwrap();
        for key in [
            "audio_with_clicks_url",
            "harmonic_audio_url",
            "percussive_audio_url",
            "harmonic_original_url",
            "percussive_original_url",
            "clicks_only_url",
            "waveform_image",
            "video_url",
        ] {
            assert_eq!(json[key], "", "{}", key);
        }
        assert_eq!(result.tempo, 120.0);
        assert_eq!(result.duration, DEFAULT_DURATION_SECS);
        assert!(result.completed);
    }

    #[tokio::test]
    async fn test_publishes_existing_files() {
        let dir = TempDir::new().unwrap();
        let work = dir.path().join("work");
        std::fs::create_dir_all(&work).unwrap();
        for name in ["a.wav", "h.wav", "p.wav", "c.wav", "harm.wav", "perc.wav", "v.mp4"] {
            std::fs::write(work.join(name), b"data").unwrap();
        }

        let assembler = ResultAssembler::new(dir.path().join("static"), "/static/");
        let mut input = input("abc");
        input.click_tracks = ClickTracks {
            with_original: Some(work.join("a.wav")),
            with_harmonic: Some(work.join("h.wav")),
            with_percussive: Some(work.join("p.wav")),
            clicks_only: Some(work.join("c.wav")),
        };
        input.separated = Some(SeparatedTracks {
            harmonic: work.join("harm.wav"),
            percussive: work.join("perc.wav"),
        });
        input.video_path = Some(work.join("v.mp4"));

        let result = assembler.assemble(input).await;
        assert_eq!(result.audio_with_clicks_url, "/static/abc/audio_with_clicks.wav");
        assert_eq!(result.harmonic_audio_url, "/static/abc/harmonic_with_clicks.wav");
        assert_eq!(result.percussive_audio_url, "/static/abc/percussive_with_clicks.wav");
        assert_eq!(result.harmonic_original_url, "/static/abc/harmonic.wav");
        assert_eq!(result.percussive_original_url, "/static/abc/percussive.wav");
        assert_eq!(result.clicks_only_url, "/static/abc/clicks_only.wav");
        assert_eq!(result.video_url, "/static/abc/video.mp4");
        assert!(dir.path().join("static/abc/clicks_only.wav").is_file());
        assert!(dir.path().join("static/abc/video.mp4").is_file());
    }

    #[tokio::test]
    async fn test_publish_in_place_is_noop() {
        let dir = TempDir::new().unwrap();
        let assembler = ResultAssembler::new(dir.path(), "/static");
        let job_dir = assembler.job_dir("abc");
        std::fs::create_dir_all(&job_dir).unwrap();
        let video = job_dir.join(names::VIDEO);
        std::fs::write(&video, b"mp4").unwrap();

        let url = assembler.publish("abc", Some(video.as_path()), names::VIDEO).await;
        assert_eq!(url, "/static/abc/video.mp4");
        assert_eq!(std::fs::read(&video).unwrap(), b"mp4");
    }

    #[tokio::test]
    async fn test_publish_thumbnail_keeps_extension() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("video.jpeg");
        std::fs::write(&src, b"img").unwrap();
        let assembler = ResultAssembler::new(dir.path().join("static"), "/static");

        let url = assembler.publish_thumbnail("abc", &src).await;
        assert_eq!(url, "/static/abc/thumbnail.jpg");
        assert!(dir.path().join("static/abc/thumbnail.jpg").is_file());
    }

    #[tokio::test]
    async fn test_duration_fallback_order() {
        let dir = TempDir::new().unwrap();
        let assembler = ResultAssembler::new(dir.path(), "/static");

        let mut with_source = input("a");
        with_source.source_duration = Some(200.0);
        assert_eq!(assembler.assemble(with_source).await.duration, 200.0);

        let mut with_probe = input("b");
        with_probe.source_duration = Some(200.0);
        with_probe.probed_duration = Some(199.5);
        assert_eq!(assembler.assemble(with_probe).await.duration, 199.5);

        let mut with_detector = input("c");
        with_detector.probed_duration = Some(199.5);
        with_detector.events = DetectedEvents::empty().with_duration(42.0);
        assert_eq!(assembler.assemble(with_detector).await.duration, 42.0);
    }

    #[tokio::test]
    async fn test_carries_events_and_steps() {
        let dir = TempDir::new().unwrap();
        let assembler = ResultAssembler::new(dir.path(), "/static");
        let mut input = input("abc");
        input.events = DetectedEvents::from_events(vec![0.0, 0.5, 1.0], vec![0.0]);
        input.steps = vec![StepAnnotation {
            start: 0.0,
            end: 1.0,
            label: "Basic Step".to_string(),
        }];
        input.waveform_image = "iVBORw0KGgo=".to_string();

        let result = assembler.assemble(input).await;
        assert_eq!(result.beats.len(), 3);
        assert_eq!(result.downbeats, vec![0.0]);
        assert_eq!(result.steps.len(), 1);
        assert_eq!(result.waveform_image, "iVBORw0KGgo=");
        assert!((result.tempo - 120.0).abs() < 1e-9);
    }
}
