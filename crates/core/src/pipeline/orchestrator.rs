//! Pipeline orchestrator implementation.
//!
//! Drives one analysis job per video id through the stages in sequence,
//! publishing progress to the job registry as it goes:
//! - Acquisition: bounded by a deadline, with one fallback attempt
//! - Separation: fatal on failure
//! - Detection, visualization, click tracks: degrade to placeholders

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::acquisition::{
    AcquiredMedia, AcquisitionError, AcquisitionObserver, BoundedAcquisition, MediaAcquirer,
};
use crate::assembler::{names, AssemblyInput, ResultAssembler};
use crate::clicks::{ClickSources, ClickTracks};
use crate::config::{Config, StorageConfig};
use crate::detect::DetectedEvents;
use crate::job::{AnalysisResult, Job, JobRegistry};
use crate::locator::SourceLocator;
use crate::metrics;

use super::bands::{Stage, StageBand};
use super::collaborators::Collaborators;
use super::error::{PipelineError, SubmitError};

/// Reports acquisition wait time as progress within part of a stage band.
struct WaitingObserver {
    registry: Arc<JobRegistry>,
    job_id: String,
    band: StageBand,
    from: f64,
    to: f64,
    message: &'static str,
}

#[async_trait]
impl AcquisitionObserver for WaitingObserver {
    async fn on_waiting(&self, elapsed: Duration, timeout: Duration) {
        let fraction = if timeout.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f64() / timeout.as_secs_f64()).min(1.0)
        };
        let progress = self.band.at(self.from + (self.to - self.from) * fraction);
        self.registry
            .update(
                &self.job_id,
                progress,
                format!("{} ({}s elapsed)", self.message, elapsed.as_secs()),
                None,
            )
            .await;
    }
}

/// Outcome of a successful run.
struct RunOutcome {
    result: AnalysisResult,
    degraded: Vec<Stage>,
}

struct Inner {
    storage: StorageConfig,
    bounded: BoundedAcquisition,
    registry: Arc<JobRegistry>,
    collaborators: Collaborators,
    assembler: ResultAssembler,
}

/// Starts analysis jobs and runs them in the background.
#[derive(Clone)]
pub struct PipelineOrchestrator {
    inner: Arc<Inner>,
}

impl PipelineOrchestrator {
    /// Create a new orchestrator.
    pub fn new(config: &Config, registry: Arc<JobRegistry>, collaborators: Collaborators) -> Self {
        Self {
            inner: Arc::new(Inner {
                storage: config.storage.clone(),
                bounded: BoundedAcquisition::from_config(&config.acquisition),
                registry,
                assembler: ResultAssembler::from_config(&config.storage),
                collaborators,
            }),
        }
    }

    /// The registry jobs report into.
    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.inner.registry
    }

    /// Validates `url` and starts analysing it in the background.
    ///
    /// The job id is the video id. When a job for the same video is still
    /// running, no new job starts and its current snapshot is returned.
    pub async fn submit(&self, url: &str) -> Result<Job, SubmitError> {
        let locator = SourceLocator::parse(url)?;
        let job_id = locator.video_id().to_string();

        let this = self.clone();
        let task_id = job_id.clone();
        let launched = self
            .inner
            .registry
            .launch(&job_id, move || {
                tokio::spawn(async move { this.run(&task_id, locator).await })
            })
            .await;

        match launched {
            Ok(job) => {
                metrics::JOBS_SUBMITTED.inc();
                info!(job_id = %job_id, url = %url, "Analysis job submitted");
                Ok(job)
            }
            Err(existing) => {
                info!(
                    job_id = %job_id,
                    progress = existing.progress,
                    "Analysis already running, returning current status"
                );
                Ok(existing)
            }
        }
    }

    /// Runs every stage for `job_id` and records the outcome.
    ///
    /// Never panics and never returns an error: a fatal stage failure or a
    /// panic inside a stage becomes the job's error.
    pub async fn run(&self, job_id: &str, locator: SourceLocator) {
        metrics::JOBS_RUNNING.inc();
        let started = Instant::now();

        let this = self.clone();
        let id = job_id.to_string();
        let joined = tokio::spawn(async move { this.run_stages(&id, &locator).await }).await;

        let outcome = match joined {
            Ok(Ok(RunOutcome { result, degraded })) => {
                self.inner
                    .registry
                    .update(job_id, 100, "Analysis complete", Some(result))
                    .await;
                if degraded.is_empty() {
                    info!(job_id = %job_id, elapsed_secs = started.elapsed().as_secs(), "Analysis complete");
                    "success"
                } else {
                    let stages: Vec<&str> = degraded.iter().map(Stage::as_str).collect();
                    warn!(
                        job_id = %job_id,
                        degraded = ?stages,
                        elapsed_secs = started.elapsed().as_secs(),
                        "Analysis complete with degraded stages"
                    );
                    "degraded"
                }
            }
            Ok(Err(e)) => {
                error!(job_id = %job_id, stage = e.stage(), error = %e, "Analysis failed");
                self.inner.registry.fail(job_id, e.to_string()).await;
                "failed"
            }
            Err(e) => {
                let e = PipelineError::Internal(e.to_string());
                error!(job_id = %job_id, error = %e, "Analysis task panicked");
                self.inner.registry.fail(job_id, e.to_string()).await;
                "failed"
            }
        };

        self.cleanup(job_id).await;

        metrics::JOBS_RUNNING.dec();
        metrics::JOBS_FINISHED.with_label_values(&[outcome]).inc();
        metrics::JOB_DURATION
            .with_label_values(&[outcome])
            .observe(started.elapsed().as_secs_f64());
    }

    async fn run_stages(
        &self,
        job_id: &str,
        locator: &SourceLocator,
    ) -> Result<RunOutcome, PipelineError> {
        let inner = &self.inner;
        let c = &inner.collaborators;
        let download_dir = inner.storage.videos_dir.join(job_id);
        let work_dir = self.work_dir(job_id);
        let mut degraded = Vec::new();

        // Acquire
        let timer = Instant::now();
        let (mut media, mut used_fallback) = self.acquire(job_id, locator, &download_dir).await?;
        observe(Stage::Acquire, timer);

        // Prepare
        let timer = Instant::now();
        self.report(job_id, Stage::Prepare, 0.0, "Preparing audio...").await;
        let probed = c.prober.probe(&media.audio_path).await;
        let info = match probed {
            Ok(info) => info,
            Err(e) if !used_fallback => {
                warn!(
                    job_id = %job_id,
                    error = %e,
                    "Acquired audio is unreadable, retrying with audio-only source"
                );
                self.report(job_id, Stage::Prepare, 0.2, "Audio unreadable, downloading audio only...")
                    .await;
                let fallback = self
                    .acquire_fallback(job_id, locator, &download_dir, Stage::Prepare.band(), (0.2, 0.8))
                    .await?;
                used_fallback = true;
                media = carry_over(media, fallback);
                c.prober.probe(&media.audio_path).await?
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(thumbnail) = media.thumbnail_path.as_deref() {
            inner.assembler.publish_thumbnail(job_id, thumbnail).await;
        }
        let video_url = inner
            .assembler
            .publish(job_id, media.video_path.as_deref(), names::VIDEO)
            .await;
        let video_path = (!video_url.is_empty()).then(|| inner.assembler.job_dir(job_id).join(names::VIDEO));
        self.report(job_id, Stage::Prepare, 1.0, "Audio ready").await;
        observe(Stage::Prepare, timer);
        info!(
            job_id = %job_id,
            fallback = used_fallback,
            duration_secs = info.duration_secs,
            has_video = video_path.is_some(),
            "Media prepared"
        );

        // Separate
        let timer = Instant::now();
        self.report(job_id, Stage::Separate, 0.0, "Separating harmonic and percussive components...")
            .await;
        let separated = c.separator.separate(&media.audio_path, &work_dir).await?;
        self.report(job_id, Stage::Separate, 1.0, "Components separated").await;
        observe(Stage::Separate, timer);

        // Detect
        let timer = Instant::now();
        self.report(job_id, Stage::Detect, 0.0, "Detecting beats and downbeats...")
            .await;
        let events = match c.detector.detect(&separated.percussive).await {
            Ok(events) => events,
            Err(e) => {
                if e.is_unavailable() {
                    warn!(job_id = %job_id, error = %e, "Beat detection unavailable, continuing without beats");
                } else {
                    warn!(job_id = %job_id, error = %e, "Beat detection failed, continuing without beats");
                }
                degrade(&mut degraded, Stage::Detect);
                DetectedEvents::empty()
            }
        };
        self.report(
            job_id,
            Stage::Detect,
            0.9,
            format!(
                "Found {} beats at {:.1} BPM",
                events.beats.len(),
                events.tempo_bpm
            ),
        )
        .await;
        observe(Stage::Detect, timer);

        // Steps
        let timer = Instant::now();
        self.report(job_id, Stage::Steps, 0.0, "Generating dance steps...").await;
        let steps = if events.steps.is_empty() {
            c.steps.synthesize(&events.beats)
        } else {
            events.steps.clone()
        };
        observe(Stage::Steps, timer);

        // Visualize
        let timer = Instant::now();
        self.report(job_id, Stage::Visualize, 0.0, "Rendering waveform...").await;
        let waveform_image = match c
            .visualizer
            .render(&media.audio_path, &events.beats, &events.downbeats)
            .await
        {
            Ok(image) => image,
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "Waveform rendering failed");
                degrade(&mut degraded, Stage::Visualize);
                String::new()
            }
        };
        observe(Stage::Visualize, timer);

        // Click tracks
        let timer = Instant::now();
        self.report(job_id, Stage::ClickTracks, 0.0, "Creating click tracks...").await;
        let sources = ClickSources {
            original: media.audio_path.clone(),
            harmonic: separated.harmonic.clone(),
            percussive: separated.percussive.clone(),
        };
        let click_tracks = match c
            .click_tracks
            .render(&sources, &events.beats, &events.downbeats, &work_dir.join("clicks"))
            .await
        {
            Ok(tracks) => tracks,
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "Click track rendering failed");
                degrade(&mut degraded, Stage::ClickTracks);
                ClickTracks::default()
            }
        };
        observe(Stage::ClickTracks, timer);

        // Assemble
        let timer = Instant::now();
        self.report(job_id, Stage::Assemble, 0.0, "Finalizing results...").await;
        let result = inner
            .assembler
            .assemble(AssemblyInput {
                job_id: job_id.to_string(),
                events,
                steps,
                waveform_image,
                click_tracks,
                separated: Some(separated),
                video_path,
                probed_duration: (info.duration_secs > 0.0).then_some(info.duration_secs),
                source_duration: media.duration_secs,
            })
            .await;
        observe(Stage::Assemble, timer);

        Ok(RunOutcome { result, degraded })
    }

    /// Primary acquisition, then one fallback attempt.
    async fn acquire(
        &self,
        job_id: &str,
        locator: &SourceLocator,
        download_dir: &Path,
    ) -> Result<(AcquiredMedia, bool), PipelineError> {
        let inner = &self.inner;
        let primary = inner.collaborators.acquirer.clone();
        self.report(job_id, Stage::Acquire, 0.0, "Downloading video...").await;

        let observer = self.observer(job_id, Stage::Acquire.band(), (0.0, 0.5), "Downloading video...");
        match inner
            .bounded
            .run(primary.clone(), locator, download_dir.to_path_buf(), &observer)
            .await
        {
            Ok(media) => {
                record_attempt("primary", None);
                return Ok((media, false));
            }
            Err(e) => {
                record_attempt("primary", Some(&e));
                warn!(
                    job_id = %job_id,
                    acquirer = primary.name(),
                    error = %e,
                    retryable = e.is_retryable(),
                    "Primary acquisition failed, trying fallback"
                );
            }
        }

        self.report(job_id, Stage::Acquire, 0.5, "Download failed, trying audio only...")
            .await;
        let media = self
            .acquire_fallback(job_id, locator, download_dir, Stage::Acquire.band(), (0.5, 1.0))
            .await?;
        Ok((media, true))
    }

    async fn acquire_fallback(
        &self,
        job_id: &str,
        locator: &SourceLocator,
        download_dir: &Path,
        band: StageBand,
        range: (f64, f64),
    ) -> Result<AcquiredMedia, PipelineError> {
        let inner = &self.inner;
        let fallback = inner.collaborators.fallback_acquirer.clone();
        let observer = self.observer(job_id, band, range, "Downloading audio...");

        match inner
            .bounded
            .run(fallback.clone(), locator, download_dir.join("fallback"), &observer)
            .await
        {
            Ok(media) => {
                record_attempt("fallback", None);
                info!(job_id = %job_id, acquirer = fallback.name(), "Fallback acquisition succeeded");
                Ok(media)
            }
            Err(e) => {
                record_attempt("fallback", Some(&e));
                Err(e.into())
            }
        }
    }

    fn observer(
        &self,
        job_id: &str,
        band: StageBand,
        (from, to): (f64, f64),
        message: &'static str,
    ) -> WaitingObserver {
        WaitingObserver {
            registry: self.inner.registry.clone(),
            job_id: job_id.to_string(),
            band,
            from,
            to,
            message,
        }
    }

    async fn report(&self, job_id: &str, stage: Stage, fraction: f64, message: impl Into<String>) {
        let message = message.into();
        let progress = stage.progress(fraction);
        info!(job_id = %job_id, stage = %stage, progress, "{}", message);
        self.inner
            .registry
            .update(job_id, progress, message, None)
            .await;
    }

    fn work_dir(&self, job_id: &str) -> PathBuf {
        self.inner.storage.work_dir.join(job_id)
    }

    /// Removes intermediate files. Published artifacts are kept.
    async fn cleanup(&self, job_id: &str) {
        let work_dir = self.work_dir(job_id);
        if work_dir.exists() {
            if let Err(e) = tokio::fs::remove_dir_all(&work_dir).await {
                warn!(job_id = %job_id, path = %work_dir.display(), error = %e, "Failed to remove work directory");
            }
        }
    }
}

/// Keeps the primary's video and thumbnail when the fallback lacks them.
fn carry_over(primary: AcquiredMedia, fallback: AcquiredMedia) -> AcquiredMedia {
    AcquiredMedia {
        video_path: fallback.video_path.or(primary.video_path),
        thumbnail_path: fallback.thumbnail_path.or(primary.thumbnail_path),
        duration_secs: fallback.duration_secs.or(primary.duration_secs),
        title: if fallback.title.is_empty() {
            primary.title
        } else {
            fallback.title
        },
        audio_path: fallback.audio_path,
    }
}

fn degrade(degraded: &mut Vec<Stage>, stage: Stage) {
    metrics::STAGES_DEGRADED
        .with_label_values(&[stage.as_str()])
        .inc();
    degraded.push(stage);
}

fn observe(stage: Stage, started: Instant) {
    metrics::STAGE_DURATION
        .with_label_values(&[stage.as_str()])
        .observe(started.elapsed().as_secs_f64());
}

fn record_attempt(path: &str, error: Option<&AcquisitionError>) {
    let result = error.map(AcquisitionError::kind).unwrap_or("success");
    metrics::ACQUISITION_ATTEMPTS
        .with_label_values(&[path, result])
        .inc();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::beats;
    use crate::testing::MockCollaborators;
    use tempfile::TempDir;

    fn config(root: &Path) -> Config {
        let mut config = Config::default();
        config.storage = StorageConfig::under(root);
        config.acquisition.timeout_secs = 2;
        config.acquisition.progress_interval_secs = 1;
        config
    }

    #[test]
    fn test_carry_over_keeps_primary_video() {
        let primary = AcquiredMedia::audio("/a/audio.wav", "Song")
            .with_video("/a/video.mp4")
            .with_thumbnail("/a/video.jpg")
            .with_duration(200.0);
        let fallback = AcquiredMedia::audio("/b/audio.wav", "");

        let merged = carry_over(primary, fallback);
        assert_eq!(merged.audio_path, PathBuf::from("/b/audio.wav"));
        assert_eq!(merged.video_path, Some(PathBuf::from("/a/video.mp4")));
        assert_eq!(merged.thumbnail_path, Some(PathBuf::from("/a/video.jpg")));
        assert_eq!(merged.duration_secs, Some(200.0));
        assert_eq!(merged.title, "Song");
    }

    #[tokio::test]
    async fn test_waiting_observer_stays_in_band() {
        let registry = Arc::new(JobRegistry::new());
        registry.create("abc").await;
        let observer = WaitingObserver {
            registry: registry.clone(),
            job_id: "abc".to_string(),
            band: Stage::Acquire.band(),
            from: 0.0,
            to: 0.5,
            message: "Downloading video...",
        };

        observer
            .on_waiting(Duration::from_secs(90), Duration::from_secs(180))
            .await;
        let job = registry.get("abc").await;
        assert_eq!(job.progress, 7);
        assert_eq!(job.status_message, "Downloading video... (90s elapsed)");

        observer
            .on_waiting(Duration::from_secs(400), Duration::from_secs(180))
            .await;
        assert_eq!(registry.get("abc").await.progress, 10);
        assert!(!registry.get("abc").await.completed);
    }

    #[tokio::test]
    async fn test_run_direct() {
        let dir = TempDir::new().unwrap();
        let mocks = MockCollaborators::new();
        mocks.detector.set_events(beats(8), vec![0.0, 2.0]).await;
        let registry = Arc::new(JobRegistry::new());
        let orchestrator =
            PipelineOrchestrator::new(&config(dir.path()), registry.clone(), mocks.collaborators());

        let locator = SourceLocator::parse("https://youtu.be/dQw4w9WgXcQ").unwrap();
        orchestrator.run("dQw4w9WgXcQ", locator).await;

        let job = registry.get("dQw4w9WgXcQ").await;
        assert!(job.completed);
        assert_eq!(job.progress, 100);
        let data = job.data.unwrap();
        assert_eq!(data.beats.len(), 8);
        assert_eq!(data.downbeats, vec![0.0, 2.0]);
        assert_eq!(data.steps.len(), 1);
        assert!(!dir.path().join("work/dQw4w9WgXcQ").exists());
    }

    #[tokio::test]
    async fn test_run_records_internal_error_on_panic() {
        let dir = TempDir::new().unwrap();
        let mocks = MockCollaborators::new();
        mocks.separator.set_panic(true).await;
        let registry = Arc::new(JobRegistry::new());
        let orchestrator =
            PipelineOrchestrator::new(&config(dir.path()), registry.clone(), mocks.collaborators());

        let locator = SourceLocator::parse("https://youtu.be/dQw4w9WgXcQ").unwrap();
        orchestrator.run("dQw4w9WgXcQ", locator).await;

        let job = registry.get("dQw4w9WgXcQ").await;
        assert!(job.completed);
        assert!(job.data.is_none());
        assert!(job.error.unwrap().starts_with("Internal error"));
    }
}
