//! Published media for a job.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::error;

use stepbeat_core::assembler::names;

use super::analysis::ErrorDetail;
use crate::state::AppState;

/// Thumbnail extensions, in lookup order.
const THUMBNAIL_EXTENSIONS: [&str; 3] = ["jpg", "png", "webp"];

static JOB_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").unwrap());

fn not_found(detail: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorDetail {
            detail: detail.to_string(),
        }),
    )
        .into_response()
}

/// Resolves `name` inside the job directory, rejecting ids that are not
/// plain path segments.
fn job_file(state: &AppState, id: &str, name: &str) -> Option<PathBuf> {
    if !JOB_ID.is_match(id) {
        return None;
    }
    let path = state.job_dir(id).join(name);
    path.is_file().then_some(path)
}

async fn serve(path: PathBuf, request: Request<Body>) -> Response {
    match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

/// GET /api/audio/{id}
pub async fn get_audio(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    request: Request<Body>,
) -> Response {
    match job_file(&state, &id, names::AUDIO_WITH_CLICKS) {
        Some(path) => serve(path, request).await,
        None => {
            error!("Audio file not found for video ID: {}", id);
            not_found("Audio file not found")
        }
    }
}

/// GET /api/video/{id}
pub async fn get_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    request: Request<Body>,
) -> Response {
    match job_file(&state, &id, names::VIDEO) {
        Some(path) => serve(path, request).await,
        None => {
            error!("Video file not found for video ID: {}", id);
            not_found("Video file not found")
        }
    }
}

/// GET /api/thumbnail/{id}
pub async fn get_thumbnail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    request: Request<Body>,
) -> Response {
    let found = THUMBNAIL_EXTENSIONS.iter().find_map(|ext| {
        job_file(&state, &id, &format!("{}.{}", names::THUMBNAIL_STEM, ext))
    });
    match found {
        Some(path) => serve(path, request).await,
        None => {
            error!("Thumbnail not found for video ID: {}", id);
            not_found("Thumbnail not found")
        }
    }
}
