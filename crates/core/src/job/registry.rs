//! In-memory job registry.

use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::debug;

use super::types::{AnalysisResult, Job};

/// A job and the task writing to it.
struct JobEntry {
    job: Job,
    task: Option<JoinHandle<()>>,
}

impl JobEntry {
    fn new(id: &str) -> Self {
        Self {
            job: Job::new(id),
            task: None,
        }
    }

    fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

/// Concurrent store of job state keyed by job id.
///
/// All writes for one id go through a single write lock, so a reader sees
/// either the previous snapshot or the new one. State lives only as long as
/// the process.
///
/// Beyond plain overwrites, the registry keeps the job invariants intact:
/// progress never goes backwards, a completed job is frozen, and a completed
/// job carries exactly one of `data` or `error`.
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, JobEntry>>,
}

impl JobRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fresh job at progress 0, replacing any previous run.
    pub async fn create(&self, id: &str) -> Job {
        let mut jobs = self.jobs.write().await;
        let entry = JobEntry::new(id);
        let snapshot = entry.job.clone();
        jobs.insert(id.to_string(), entry);
        debug!(job_id = %id, "Job created");
        snapshot
    }

    /// Creates a job and spawns its task under one lock.
    ///
    /// If a task for `id` is still running, nothing is spawned and the
    /// current snapshot is returned as `Err`.
    pub async fn launch<F>(&self, id: &str, spawn: F) -> Result<Job, Job>
    where
        F: FnOnce() -> JoinHandle<()>,
    {
        let mut jobs = self.jobs.write().await;
        if let Some(existing) = jobs.get(id) {
            if existing.is_active() {
                debug!(job_id = %id, "Job already running");
                return Err(existing.job.clone());
            }
        }

        let mut entry = JobEntry::new(id);
        let snapshot = entry.job.clone();
        entry.task = Some(spawn());
        jobs.insert(id.to_string(), entry);
        debug!(job_id = %id, "Job launched");
        Ok(snapshot)
    }

    /// Records progress for a job.
    ///
    /// Passing `data` or reaching progress 100 completes the job. Unknown
    /// ids are created on first write.
    pub async fn update(
        &self,
        id: &str,
        progress: u8,
        message: impl Into<String>,
        data: Option<AnalysisResult>,
    ) -> Job {
        let message = message.into();
        let mut jobs = self.jobs.write().await;
        let entry = jobs
            .entry(id.to_string())
            .or_insert_with(|| JobEntry::new(id));
        let job = &mut entry.job;

        if job.completed {
            debug!(job_id = %id, progress, "Ignoring update to completed job");
            return job.clone();
        }

        job.progress = job.progress.max(progress.min(100));
        job.status_message = message;
        job.updated_at = Utc::now();

        if data.is_some() || job.progress == 100 {
            job.completed = true;
            job.progress = 100;
            if data.is_some() {
                job.data = data;
            }
            if job.data.is_none() {
                job.error = Some(job.status_message.clone());
            }
        }

        debug!(
            job_id = %id,
            progress = job.progress,
            completed = job.completed,
            "Job updated"
        );
        job.clone()
    }

    /// Records a terminal failure.
    pub async fn fail(&self, id: &str, error: impl Into<String>) -> Job {
        let error = error.into();
        let mut jobs = self.jobs.write().await;
        let entry = jobs
            .entry(id.to_string())
            .or_insert_with(|| JobEntry::new(id));
        let job = &mut entry.job;

        if job.completed {
            debug!(job_id = %id, "Ignoring failure of completed job");
            return job.clone();
        }

        job.progress = 100;
        job.status_message = format!("Error: {}", error);
        job.completed = true;
        job.data = None;
        job.error = Some(error);
        job.updated_at = Utc::now();
        debug!(job_id = %id, "Job failed");
        job.clone()
    }

    /// Current snapshot, or a "not started" placeholder for unknown ids.
    pub async fn get(&self, id: &str) -> Job {
        let jobs = self.jobs.read().await;
        jobs.get(id)
            .map(|e| e.job.clone())
            .unwrap_or_else(|| Job::not_started(id))
    }

    /// Whether the registry has seen `id`.
    pub async fn contains(&self, id: &str) -> bool {
        self.jobs.read().await.contains_key(id)
    }

    /// Whether the task driving `id` is still running.
    pub async fn is_active(&self, id: &str) -> bool {
        let jobs = self.jobs.read().await;
        jobs.get(id).is_some_and(JobEntry::is_active)
    }

    /// Number of jobs whose task is still running.
    pub async fn active_count(&self) -> usize {
        let jobs = self.jobs.read().await;
        jobs.values().filter(|e| e.is_active()).count()
    }

    /// Number of tracked jobs.
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Whether no jobs are tracked.
    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}
