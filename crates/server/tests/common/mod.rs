//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock pipeline stages injected, so whole analyses run against a temp
//! directory without yt-dlp or ffmpeg installed.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use stepbeat_core::{
    testing::MockCollaborators, Config, JobRegistry, PipelineOrchestrator, StorageConfig,
};

/// Re-export fixtures for test convenience
pub use stepbeat_core::testing::fixtures;

pub const VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
pub const VIDEO_ID: &str = "dQw4w9WgXcQ";

/// Test fixture for E2E testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_submit() {
///     let fixture = TestFixture::new();
///
///     let response = fixture.post("/api/analyze-video", json!({
///         "url": "https://youtu.be/dQw4w9WgXcQ"
///     })).await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock stages - configure failures and outputs
    pub mocks: MockCollaborators,
    /// Registry shared with the orchestrator
    pub registry: Arc<JobRegistry>,
    /// Temporary directory for downloads and published artifacts
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub bytes: Vec<u8>,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let mut config = Config::default();
        config.storage = StorageConfig::under(temp_dir.path());
        config.acquisition.timeout_secs = 2;
        config.acquisition.progress_interval_secs = 1;

        let mocks = MockCollaborators::new();
        let registry = Arc::new(JobRegistry::new());
        let orchestrator =
            PipelineOrchestrator::new(&config, registry.clone(), mocks.collaborators());

        let state = Arc::new(stepbeat_server::state::AppState::new(config, orchestrator));
        let router = stepbeat_server::api::create_router(state);

        Self {
            router,
            mocks,
            registry,
            temp_dir,
        }
    }

    /// Path of a published artifact.
    pub fn static_path(&self, id: &str, name: &str) -> PathBuf {
        self.temp_dir.path().join("static").join(id).join(name)
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Poll a job until it completes, returning every response body.
    pub async fn poll_until_complete(&self, id: &str, timeout: Duration) -> Vec<Value> {
        let started = Instant::now();
        let mut bodies = Vec::new();
        loop {
            let response = self.get(&format!("/api/progress/{}", id)).await;
            assert_eq!(response.status, StatusCode::OK);
            let done = response.body["completed"] == Value::Bool(true);
            bodies.push(response.body);
            if done {
                return bodies;
            }
            if started.elapsed() > timeout {
                panic!("Timeout waiting for job {}: {:?}", id, bodies.last());
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
            bytes: body_bytes.to_vec(),
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
