//! Analysis lifecycle integration tests.
//!
//! These tests drive whole jobs through the orchestrator with mock stages:
//! submit -> acquire -> prepare -> separate -> detect -> steps ->
//! visualize -> click tracks -> assemble

use std::sync::Arc;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use stepbeat_core::{
    acquisition::AcquisitionError,
    audio::AudioError,
    clicks::ClickTrackError,
    detect::{DetectedEvents, DetectionError},
    probe::ProbeError,
    separate::SeparationError,
    steps::{StepAnnotation, StepStrategy},
    testing::{fixtures, MockCollaborators, MOCK_IMAGE},
    visualize::VisualizationError,
    Config, Job, JobRegistry, PipelineOrchestrator, StorageConfig, SubmitError,
    NOT_STARTED_MESSAGE,
};

const VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
const VIDEO_ID: &str = "dQw4w9WgXcQ";

/// Test helper wiring an orchestrator to mock stages.
struct TestHarness {
    orchestrator: PipelineOrchestrator,
    registry: Arc<JobRegistry>,
    mocks: MockCollaborators,
    temp_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_timeout(2)
    }

    fn with_timeout(timeout_secs: u64) -> Self {
        Self::build(timeout_secs, None)
    }

    fn with_steps(steps: Arc<dyn StepStrategy>) -> Self {
        Self::build(2, Some(steps))
    }

    fn build(timeout_secs: u64, steps: Option<Arc<dyn StepStrategy>>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut config = Config::default();
        config.storage = StorageConfig::under(temp_dir.path());
        config.acquisition.timeout_secs = timeout_secs;
        config.acquisition.progress_interval_secs = 1;

        let registry = Arc::new(JobRegistry::new());
        let mocks = MockCollaborators::new();
        let collaborators = match steps {
            Some(steps) => mocks.collaborators().with_steps(steps),
            None => mocks.collaborators(),
        };
        let orchestrator = PipelineOrchestrator::new(&config, registry.clone(), collaborators);

        Self {
            orchestrator,
            registry,
            mocks,
            temp_dir,
        }
    }

    /// Poll until the job completes, returning every progress value seen.
    async fn wait_for_completion(&self, id: &str, timeout: Duration) -> (Job, Vec<u8>) {
        let started = Instant::now();
        let mut seen = Vec::new();
        loop {
            let job = self.registry.get(id).await;
            seen.push(job.progress);
            if job.completed {
                return (job, seen);
            }
            if started.elapsed() > timeout {
                panic!("Timeout waiting for job {} (last: {:?})", id, job);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    async fn run_to_completion(&self) -> Job {
        self.orchestrator
            .submit(VIDEO_URL)
            .await
            .expect("submit failed");
        self.wait_for_completion(VIDEO_ID, Duration::from_secs(10))
            .await
            .0
    }

    fn static_file(&self, name: &str) -> std::path::PathBuf {
        self.temp_dir.path().join("static").join(VIDEO_ID).join(name)
    }
}

// ============================================================================
// Happy path
// ============================================================================

#[tokio::test]
async fn test_full_analysis_succeeds() {
    let harness = TestHarness::new();

    let job = harness.orchestrator.submit(VIDEO_URL).await.unwrap();
    assert_eq!(job.id, VIDEO_ID);
    assert_eq!(job.progress, 0);
    assert!(!job.completed);

    let (job, _) = harness
        .wait_for_completion(VIDEO_ID, Duration::from_secs(10))
        .await;
    assert_eq!(job.progress, 100);
    assert!(job.error.is_none());
    assert_eq!(job.status_message, "Analysis complete");

    let data = job.data.expect("result missing");
    assert_eq!(data.video_id, VIDEO_ID);
    assert_eq!(data.beats, fixtures::beats(16));
    assert_eq!(data.downbeats.len(), 4);
    assert!((data.tempo - 120.0).abs() < 1e-6);
    assert_eq!(data.steps.len(), 3);
    assert_eq!(data.steps[0].label, "Basic Step");
    assert_eq!(data.waveform_image, MOCK_IMAGE);
    assert_eq!(data.duration, 210.5);
    assert!(data.completed);

    let prefix = format!("/static/{}", VIDEO_ID);
    assert_eq!(data.audio_with_clicks_url, format!("{}/audio_with_clicks.wav", prefix));
    assert_eq!(data.harmonic_audio_url, format!("{}/harmonic_with_clicks.wav", prefix));
    assert_eq!(data.percussive_audio_url, format!("{}/percussive_with_clicks.wav", prefix));
    assert_eq!(data.clicks_only_url, format!("{}/clicks_only.wav", prefix));
    assert_eq!(data.harmonic_original_url, format!("{}/harmonic.wav", prefix));
    assert_eq!(data.percussive_original_url, format!("{}/percussive.wav", prefix));
    assert_eq!(data.video_url, format!("{}/video.mp4", prefix));

    assert!(harness.static_file("clicks_only.wav").is_file());
    assert!(harness.static_file("video.mp4").is_file());
    assert!(harness.static_file("thumbnail.jpg").is_file());
    assert_eq!(harness.mocks.fallback_acquirer.call_count().await, 0);
}

#[tokio::test]
async fn test_tempo_from_median_interval() {
    let harness = TestHarness::new();
    let beats: Vec<f64> = (0..10).map(|i| i as f64 * 0.6).collect();
    harness
        .mocks
        .detector
        .set_events(beats, vec![0.0, 2.4, 4.8])
        .await;

    let data = harness.run_to_completion().await.data.unwrap();
    assert_eq!(data.beats.len(), 10);
    assert_eq!(data.downbeats, vec![0.0, 2.4, 4.8]);
    assert!((data.tempo - 100.0).abs() < 1e-6, "tempo {}", data.tempo);
    assert_eq!(data.steps.len(), 2);
}

#[tokio::test]
async fn test_progress_is_monotonic() {
    let harness = TestHarness::new();
    harness
        .mocks
        .acquirer
        .set_delay(Duration::from_millis(100))
        .await;

    harness.orchestrator.submit(VIDEO_URL).await.unwrap();
    let (job, seen) = harness
        .wait_for_completion(VIDEO_ID, Duration::from_secs(10))
        .await;

    assert!(job.completed);
    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "progress regressed: {:?}", seen);
    assert_eq!(seen.last(), Some(&100));
}

// ============================================================================
// Fatal failures
// ============================================================================

#[tokio::test]
async fn test_separation_failure_fails_job() {
    let harness = TestHarness::new();
    harness
        .mocks
        .separator
        .set_next_error(SeparationError::failed("model crashed"))
        .await;

    let job = harness.run_to_completion().await;
    assert!(job.completed);
    assert_eq!(job.progress, 100);
    assert!(job.data.is_none());
    let error = job.error.expect("error missing");
    assert!(error.contains("Failed to separate audio components"), "{}", error);
    assert!(job.status_message.starts_with("Error: "));
}

#[tokio::test]
async fn test_both_acquisition_paths_fail() {
    let harness = TestHarness::new();
    harness
        .mocks
        .acquirer
        .set_next_error(AcquisitionError::not_found("Video unavailable"))
        .await;
    harness
        .mocks
        .fallback_acquirer
        .set_next_error(AcquisitionError::not_found("Video unavailable"))
        .await;

    let job = harness.run_to_completion().await;
    assert!(job.data.is_none());
    assert!(job
        .error
        .unwrap()
        .starts_with("Failed to download media"));
    assert_eq!(harness.mocks.separator.call_count().await, 0);
}

#[tokio::test]
async fn test_panicking_stage_becomes_internal_error() {
    let harness = TestHarness::new();
    harness.mocks.separator.set_panic(true).await;

    let job = harness.run_to_completion().await;
    assert!(job.completed);
    assert!(job.error.unwrap().starts_with("Internal error"));
}

// ============================================================================
// Fallback acquisition
// ============================================================================

#[tokio::test]
async fn test_primary_failure_uses_fallback() {
    let harness = TestHarness::new();
    harness
        .mocks
        .acquirer
        .set_next_error(AcquisitionError::network("connection reset"))
        .await;

    let data = harness.run_to_completion().await.data.unwrap();
    assert_eq!(harness.mocks.acquirer.call_count().await, 1);
    assert_eq!(harness.mocks.fallback_acquirer.call_count().await, 1);
    // Audio-only fallback has no video
    assert_eq!(data.video_url, "");
    assert!(!data.audio_with_clicks_url.is_empty());
}

#[tokio::test]
async fn test_primary_timeout_uses_fallback() {
    let harness = TestHarness::with_timeout(1);
    harness.mocks.acquirer.set_never_complete(true).await;

    let started = Instant::now();
    let job = harness.run_to_completion().await;
    assert!(job.data.is_some(), "job failed: {:?}", job.error);
    assert!(started.elapsed() >= Duration::from_secs(1));
    assert_eq!(harness.mocks.fallback_acquirer.completed_count().await, 1);
}

#[tokio::test]
async fn test_fallback_is_bounded_too() {
    let harness = TestHarness::with_timeout(1);
    harness.mocks.acquirer.set_never_complete(true).await;
    harness.mocks.fallback_acquirer.set_never_complete(true).await;

    let job = harness.run_to_completion().await;
    assert!(job.data.is_none());
    assert_eq!(
        job.error.as_deref(),
        Some("Failed to download media: Download timed out after 1 seconds")
    );
}

#[tokio::test]
async fn test_unreadable_audio_reacquires_once() {
    let harness = TestHarness::new();
    harness
        .mocks
        .prober
        .set_next_error(ProbeError::ParseError {
            reason: "garbage".to_string(),
        })
        .await;

    let data = harness.run_to_completion().await.data.unwrap();
    assert_eq!(harness.mocks.fallback_acquirer.call_count().await, 1);
    assert_eq!(harness.mocks.prober.probed_paths().await.len(), 2);
    // Video from the primary download is still published
    assert!(!data.video_url.is_empty());
}

// ============================================================================
// Degraded stages
// ============================================================================

#[tokio::test]
async fn test_detection_unavailable_degrades() {
    let harness = TestHarness::new();
    harness
        .mocks
        .detector
        .set_next_error(DetectionError::unavailable("no detector configured"))
        .await;

    let job = harness.run_to_completion().await;
    assert!(job.error.is_none());
    let data = job.data.unwrap();
    assert!(data.beats.is_empty());
    assert!(data.downbeats.is_empty());
    assert!(data.steps.is_empty());
    assert_eq!(data.tempo, 120.0);
}

#[tokio::test]
async fn test_visualization_failure_leaves_empty_image() {
    let harness = TestHarness::new();
    harness
        .mocks
        .visualizer
        .set_next_error(VisualizationError::Task("boom".to_string()))
        .await;

    let data = harness.run_to_completion().await.data.unwrap();
    assert_eq!(data.waveform_image, "");
    assert_eq!(data.beats.len(), 16);
    assert!(!data.clicks_only_url.is_empty());
}

#[tokio::test]
async fn test_click_failure_leaves_empty_urls() {
    let harness = TestHarness::new();
    harness
        .mocks
        .click_tracks
        .set_next_error(ClickTrackError::Audio(AudioError::Task("boom".to_string())))
        .await;

    let data = harness.run_to_completion().await.data.unwrap();
    assert_eq!(data.audio_with_clicks_url, "");
    assert_eq!(data.harmonic_audio_url, "");
    assert_eq!(data.percussive_audio_url, "");
    assert_eq!(data.clicks_only_url, "");
    assert!(!data.harmonic_original_url.is_empty());
    assert_eq!(data.waveform_image, MOCK_IMAGE);
}

// ============================================================================
// Steps
// ============================================================================

/// One step spanning every beat.
struct WholeSongStep;

impl StepStrategy for WholeSongStep {
    fn name(&self) -> &str {
        "whole-song"
    }

    fn synthesize(&self, beats: &[f64]) -> Vec<StepAnnotation> {
        match (beats.first(), beats.last()) {
            (Some(&start), Some(&end)) if start < end => vec![step(start, end, "Freestyle")],
            _ => Vec::new(),
        }
    }
}

fn step(start: f64, end: f64, label: &str) -> StepAnnotation {
    StepAnnotation {
        start,
        end,
        label: label.to_string(),
    }
}

#[tokio::test]
async fn test_custom_step_strategy() {
    let harness = TestHarness::with_steps(Arc::new(WholeSongStep));

    let data = harness.run_to_completion().await.data.unwrap();
    assert_eq!(data.steps, vec![step(0.0, 7.5, "Freestyle")]);
}

#[tokio::test]
async fn test_detector_steps_are_sanitized() {
    let harness = TestHarness::new();
    let events = DetectedEvents::from_events(fixtures::beats(8), vec![0.0, 2.0]).with_steps(vec![
        step(3.0, 1.0, "Backwards"),
        step(0.0, 2.0, "Box Step"),
        step(1.0, 3.0, "Overlapping"),
    ]);
    harness.mocks.detector.set_detected(events).await;

    let data = harness.run_to_completion().await.data.unwrap();
    assert_eq!(data.steps, vec![step(0.0, 2.0, "Box Step")]);
}

#[tokio::test]
async fn test_unusable_detector_steps_fall_back_to_strategy() {
    let harness = TestHarness::new();
    let events = DetectedEvents::from_events(fixtures::beats(16), vec![])
        .with_steps(vec![step(5.0, 1.0, "Backwards"), step(2.0, 2.0, "Empty")]);
    harness.mocks.detector.set_detected(events).await;

    let data = harness.run_to_completion().await.data.unwrap();
    assert_eq!(data.steps.len(), 3);
    assert_eq!(data.steps[0].label, "Basic Step");
    assert!(data.steps.iter().all(|s| s.start < s.end));
}

// ============================================================================
// Submission
// ============================================================================

#[tokio::test]
async fn test_duplicate_submit_while_running() {
    let harness = TestHarness::new();
    harness
        .mocks
        .acquirer
        .set_delay(Duration::from_millis(300))
        .await;

    harness.orchestrator.submit(VIDEO_URL).await.unwrap();
    let second = harness
        .orchestrator
        .submit("https://youtu.be/dQw4w9WgXcQ")
        .await
        .unwrap();
    assert_eq!(second.id, VIDEO_ID);
    assert!(!second.completed);

    harness
        .wait_for_completion(VIDEO_ID, Duration::from_secs(10))
        .await;
    assert_eq!(harness.mocks.acquirer.call_count().await, 1);

    // Wait for the task handle to finish, then a resubmit starts a new run
    let started = Instant::now();
    while harness.registry.is_active(VIDEO_ID).await {
        assert!(started.elapsed() < Duration::from_secs(5));
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let rerun = harness.orchestrator.submit(VIDEO_URL).await.unwrap();
    assert_eq!(rerun.progress, 0);
    harness
        .wait_for_completion(VIDEO_ID, Duration::from_secs(10))
        .await;
    assert_eq!(harness.mocks.acquirer.call_count().await, 2);
}

#[tokio::test]
async fn test_invalid_locators_rejected() {
    let harness = TestHarness::new();

    for url in [
        "https://vimeo.com/12345",
        "not a url",
        "https://www.youtube.com/playlist?list=PL123",
    ] {
        let err = harness.orchestrator.submit(url).await.unwrap_err();
        assert!(matches!(err, SubmitError::InvalidLocator(_)), "{}", url);
    }
    assert!(harness.registry.is_empty().await);
}

#[tokio::test]
async fn test_unknown_job_is_not_started() {
    let harness = TestHarness::new();

    let job = harness.registry.get("nope").await;
    assert_eq!(job.progress, 0);
    assert!(!job.completed);
    assert_eq!(job.status_message, NOT_STARTED_MESSAGE);
}
