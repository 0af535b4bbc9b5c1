//! Common test utilities for API testing with mocks.
//!
//! Builds the real router over a SQLite track store in a temp directory, a
//! mock resolver and a mock media tool, so requests run the full download
//! path without yt-dlp or network access.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use trackfetch_core::{
    orchestrator::LogHub,
    testing::{MemoryLogSink, MockMediaTool, MockResolver},
    Config, DirectDownloads, DownloadExecutor, ExecutorSettings, Orchestrator, SqliteTrackStore,
    TrackStore,
};
use trackfetch_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use trackfetch_core::testing::fixtures;

/// In-process server with controllable collaborators.
pub struct TestFixture {
    pub router: Router,
    pub store: Arc<SqliteTrackStore>,
    pub media: Arc<MockMediaTool>,
    pub resolver: Arc<MockResolver>,
    pub sink: Arc<MemoryLogSink>,
    pub orchestrator: Orchestrator,
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Create a fixture after letting `customize` adjust the default config.
    pub fn with_config(customize: impl FnOnce(&mut Config)) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let mut config = Config::default();
        config.storage.db_path = temp_dir.path().join("tracks.db");
        config.storage.downloads_dir = temp_dir.path().join("downloads");
        config.download.log_file = temp_dir.path().join("jobs.log");
        customize(&mut config);

        let store = Arc::new(
            SqliteTrackStore::new(&config.storage.db_path).expect("Failed to create track store"),
        );
        let media = Arc::new(MockMediaTool::new());
        let resolver = Arc::new(MockResolver::succeeding("resolved1"));
        let sink = Arc::new(MemoryLogSink::new());

        let executor = DownloadExecutor::new(
            store.clone(),
            resolver.clone(),
            media.clone(),
            ExecutorSettings {
                downloads_dir: config.storage.downloads_dir.clone(),
                audio_format: config.media.audio_format.clone(),
            },
        );
        let logs = Arc::new(LogHub::new(sink.clone(), config.download.max_recent_logs));
        let orchestrator = Orchestrator::new(&config.download, Arc::new(executor), logs);

        let direct_downloads = DirectDownloads::new(
            store.clone(),
            media.clone(),
            orchestrator.clone(),
            config.youtube.direct_download_max_items,
        );

        let state = Arc::new(AppState::new(
            config,
            store.clone() as Arc<dyn TrackStore>,
            orchestrator.clone(),
            direct_downloads,
        ));

        Self {
            router: create_router(state),
            store,
            media,
            resolver,
            sink,
            orchestrator,
            temp_dir,
        }
    }

    pub fn downloads_dir(&self) -> PathBuf {
        self.temp_dir.path().join("downloads")
    }

    /// Seed a catalog track `Artist - Song <id>`.
    pub fn add_catalog_track(&self, id: &str) {
        self.store
            .insert(&fixtures::catalog_track(id, "Artist", &format!("Song {}", id)))
            .expect("Failed to insert track");
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a GET request and return the raw body text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = match body {
            Some(json) => {
                request_builder = request_builder.header("Content-Type", "application/json");
                Body::from(serde_json::to_string(&json).unwrap())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request_builder.body(body).unwrap())
            .await
            .expect("Failed to send request");

        let status = response.status();
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

        TestResponse { status, body }
    }

    /// Poll the job endpoint until the job is completed or failed.
    pub async fn wait_for_job(&self, job_id: &str) -> Value {
        for _ in 0..400 {
            let response = self.get(&format!("/api/downloads/jobs/{}", job_id)).await;
            if response.status == StatusCode::OK {
                let status = response.body["status"].as_str().unwrap_or_default();
                if status == "completed" || status == "failed" {
                    return response.body;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} did not finish in time", job_id);
    }
}
