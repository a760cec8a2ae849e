//! Job snapshot and result record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::steps::StepAnnotation;

/// Message reported for ids the registry has never seen.
pub const NOT_STARTED_MESSAGE: &str = "Not started or ID not found";

/// Point-in-time view of one analysis job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Job id (the source video id).
    pub id: String,
    /// Overall progress, 0-100.
    pub progress: u8,
    /// Human-readable description of the current stage.
    pub status_message: String,
    /// Set once, when the job reaches a terminal state.
    pub completed: bool,
    /// Result record of a successful job.
    pub data: Option<AnalysisResult>,
    /// Failure message of a failed job.
    pub error: Option<String>,
    /// When this snapshot was last written.
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Fresh job at progress 0.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            progress: 0,
            status_message: "Starting analysis...".to_string(),
            completed: false,
            data: None,
            error: None,
            updated_at: Utc::now(),
        }
    }

    /// Placeholder snapshot for an unknown id.
    pub fn not_started(id: impl Into<String>) -> Self {
        Self {
            status_message: NOT_STARTED_MESSAGE.to_string(),
            ..Self::new(id)
        }
    }

    /// Whether the job completed with a result record.
    pub fn succeeded(&self) -> bool {
        self.completed && self.data.is_some()
    }

    /// Whether the job completed with an error.
    pub fn failed(&self) -> bool {
        self.completed && self.error.is_some()
    }
}

/// Final record of a successful analysis.
///
/// Field names match the JSON the web client reads. Every artifact key is
/// always present; a missing artifact is an empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(rename = "videoId")]
    pub video_id: String,
    /// Media duration in seconds.
    pub duration: f64,
    pub beats: Vec<f64>,
    pub downbeats: Vec<f64>,
    pub steps: Vec<StepAnnotation>,
    /// Tempo in BPM.
    pub tempo: f64,
    pub audio_with_clicks_url: String,
    pub harmonic_audio_url: String,
    pub percussive_audio_url: String,
    pub harmonic_original_url: String,
    pub percussive_original_url: String,
    pub clicks_only_url: String,
    /// Base64-encoded PNG waveform.
    pub waveform_image: String,
    pub video_url: String,
    pub completed: bool,
}
