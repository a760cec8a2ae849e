//! Analysis submission and progress polling.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use stepbeat_core::{AnalysisResult, Job};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for submitting a video
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub url: String,
}

/// Progress of a job that has not finished
#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    #[serde(rename = "videoId")]
    pub video_id: String,
    pub progress: u8,
    pub status_message: String,
}

/// A job that finished with an error
#[derive(Debug, Serialize)]
pub struct FailureResponse {
    #[serde(rename = "videoId")]
    pub video_id: String,
    pub error: String,
    pub completed: bool,
}

/// Body of a poll response, shaped by the job's state
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PollResponse {
    Complete(Box<AnalysisResult>),
    Failed(FailureResponse),
    Pending(ProgressResponse),
}

impl From<Job> for PollResponse {
    fn from(job: Job) -> Self {
        match job {
            Job {
                completed: true,
                data: Some(data),
                ..
            } => Self::Complete(Box::new(data)),
            Job {
                completed: true,
                id,
                error,
                status_message,
                ..
            } => Self::Failed(FailureResponse {
                video_id: id,
                error: error.unwrap_or(status_message),
                completed: true,
            }),
            Job {
                id,
                progress,
                status_message,
                ..
            } => Self::Pending(ProgressResponse {
                video_id: id,
                progress,
                status_message,
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub detail: String,
}

const NO_CACHE: [(header::HeaderName, &str); 3] = [
    (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
    (header::PRAGMA, "no-cache"),
    (header::EXPIRES, "0"),
];

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/analyze-video
///
/// Validates the URL and starts analysis in the background.
pub async fn analyze_video(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AnalyzeRequest>,
) -> Result<Json<ProgressResponse>, (StatusCode, Json<ErrorDetail>)> {
    info!("Received request to analyze video: {}", body.url);

    match state.orchestrator().submit(&body.url).await {
        Ok(job) => Ok(Json(ProgressResponse {
            video_id: job.id,
            progress: job.progress,
            status_message: job.status_message,
        })),
        Err(e) => {
            warn!("Rejected video URL {}: {}", body.url, e);
            Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorDetail {
                    detail: e.to_string(),
                }),
            ))
        }
    }
}

/// GET /api/progress/{id} and GET /progress/{id}
///
/// Unknown ids report progress 0 rather than 404.
pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let job = state.registry().get(&id).await;
    (NO_CACHE, Json(PollResponse::from(job)))
}
