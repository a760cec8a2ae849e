//! Deadline-bounded acquisition.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::error::AcquisitionError;
use super::traits::{AcquisitionObserver, MediaAcquirer};
use super::types::AcquiredMedia;
use crate::config::AcquisitionConfig;
use crate::locator::SourceLocator;

/// Runs an acquirer on a separate task with a deadline.
///
/// While the task runs, the observer is called once per progress interval.
/// When the deadline passes first, [`AcquisitionError::Timeout`] is returned
/// immediately. By default the underlying task is left running and its
/// result discarded; with `abort_on_timeout` it is aborted instead, which
/// also kills any child process it owns.
#[derive(Debug, Clone)]
pub struct BoundedAcquisition {
    timeout: Duration,
    progress_interval: Duration,
    abort_on_timeout: bool,
}

impl BoundedAcquisition {
    /// Creates a bounded acquisition with the given deadline and interval.
    pub fn new(timeout: Duration, progress_interval: Duration) -> Self {
        Self {
            timeout,
            progress_interval: progress_interval.max(Duration::from_millis(10)),
            abort_on_timeout: false,
        }
    }

    /// Creates a bounded acquisition from configuration.
    pub fn from_config(config: &AcquisitionConfig) -> Self {
        Self::new(
            Duration::from_secs(config.timeout_secs),
            Duration::from_secs(config.progress_interval_secs),
        )
        .with_abort_on_timeout(config.abort_on_timeout)
    }

    /// Abort the underlying task on timeout instead of abandoning it.
    pub fn with_abort_on_timeout(mut self, abort: bool) -> Self {
        self.abort_on_timeout = abort;
        self
    }

    /// Deadline for one attempt.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Acquires `locator` into `dest_dir`, waiting at most the deadline.
    pub async fn run(
        &self,
        acquirer: Arc<dyn MediaAcquirer>,
        locator: &SourceLocator,
        dest_dir: PathBuf,
        observer: &dyn AcquisitionObserver,
    ) -> Result<AcquiredMedia, AcquisitionError> {
        let started = Instant::now();
        let name = acquirer.name().to_string();
        let task_locator = locator.clone();

        let mut handle =
            tokio::spawn(async move { acquirer.acquire(&task_locator, &dest_dir).await });

        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        let mut ticker = tokio::time::interval(self.progress_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick fires immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;

                joined = &mut handle => {
                    debug!(
                        acquirer = %name,
                        video_id = %locator.video_id(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Acquisition task finished"
                    );
                    return match joined {
                        Ok(result) => result,
                        Err(e) => Err(AcquisitionError::TaskFailed(e.to_string())),
                    };
                }

                _ = &mut deadline => {
                    warn!(
                        acquirer = %name,
                        video_id = %locator.video_id(),
                        timeout_secs = self.timeout.as_secs(),
                        aborted = self.abort_on_timeout,
                        "Acquisition timed out"
                    );
                    if self.abort_on_timeout {
                        handle.abort();
                    }
                    return Err(AcquisitionError::Timeout {
                        timeout_secs: self.timeout.as_secs(),
                    });
                }

                _ = ticker.tick() => {
                    observer.on_waiting(started.elapsed(), self.timeout).await;
                }
            }
        }
    }
}
