use std::path::PathBuf;
use std::sync::Arc;

use stepbeat_core::{Config, JobRegistry, PipelineOrchestrator};

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: PipelineOrchestrator,
}

impl AppState {
    pub fn new(config: Config, orchestrator: PipelineOrchestrator) -> Self {
        Self {
            config,
            orchestrator,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn orchestrator(&self) -> &PipelineOrchestrator {
        &self.orchestrator
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        self.orchestrator.registry()
    }

    /// Directory holding a job's published artifacts.
    pub fn job_dir(&self, job_id: &str) -> PathBuf {
        self.config.storage.static_dir.join(job_id)
    }
}
