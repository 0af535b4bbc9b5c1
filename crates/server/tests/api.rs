//! API tests against an in-process router.

mod common;

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt;

use common::{fixtures, TestFixture};

// =============================================================================
// Health & config
// =============================================================================

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_hides_secrets() {
    let fixture = TestFixture::with_config(|config| {
        config.youtube.api_key = "yt-secret".to_string();
        config.ai.api_key = Some("ai-secret".to_string());
    });

    let response = fixture.get("/api/config").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["youtube"]["api_key_configured"], true);
    assert_eq!(response.body["ai"]["api_key_configured"], true);

    let raw = response.body.to_string();
    assert!(!raw.contains("yt-secret"));
    assert!(!raw.contains("ai-secret"));
}

// =============================================================================
// Download jobs
// =============================================================================

#[tokio::test]
async fn test_enqueue_unknown_track_is_not_found() {
    let fixture = TestFixture::new();
    let response = fixture
        .post("/api/downloads", json!({ "trackId": "missing" }))
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "Track not found");
    assert_eq!(fixture.orchestrator.stats().jobs.len(), 0);
}

#[tokio::test]
async fn test_enqueue_with_video_id_downloads_track() {
    let fixture = TestFixture::new();
    fixture.add_catalog_track("t1");

    let response = fixture
        .post("/api/downloads", json!({ "trackId": "t1", "videoId": "abc" }))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["videoId"], "abc");
    let job_id = response.body["jobId"].as_str().unwrap().to_string();
    assert_eq!(job_id, "job-1");

    let job = fixture.wait_for_job(&job_id).await;
    assert_eq!(job["status"], "completed");
    assert_eq!(job["trackId"], "t1");
    assert_eq!(job["filePath"], "downloads/Artist_Song_t1_t1.m4a");
    assert_eq!(fixture.resolver.call_count(), 0);

    let track = fixture.get("/api/tracks/t1").await;
    assert_eq!(track.status, StatusCode::OK);
    assert_eq!(track.body["downloadStatus"], "downloaded");
    assert_eq!(track.body["filePath"], "downloads/Artist_Song_t1_t1.m4a");
    assert_eq!(track.body["youtubeVideoId"], "abc");
}

#[tokio::test]
async fn test_enqueue_without_video_id_resolves() {
    let fixture = TestFixture::new();
    fixture.add_catalog_track("t2");

    let response = fixture
        .post("/api/downloads", json!({ "trackId": "t2" }))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.get("videoId").is_none());

    let job_id = response.body["jobId"].as_str().unwrap().to_string();
    let job = fixture.wait_for_job(&job_id).await;
    assert_eq!(job["status"], "completed");
    assert_eq!(job["videoId"], "resolved1");
    assert_eq!(fixture.resolver.call_count(), 1);
}

#[tokio::test]
async fn test_failed_download_is_reported_on_job_and_track() {
    let fixture = TestFixture::new();
    fixture.add_catalog_track("t3");
    fixture.media.fail_extract("ERROR: Video unavailable").await;

    let response = fixture
        .post("/api/downloads", json!({ "trackId": "t3", "videoId": "gone" }))
        .await;
    let job_id = response.body["jobId"].as_str().unwrap().to_string();

    let job = fixture.wait_for_job(&job_id).await;
    assert_eq!(job["status"], "failed");
    assert!(job["error"].as_str().unwrap().contains("Video unavailable"));

    let track = fixture.get("/api/tracks/t3").await;
    assert_eq!(track.body["downloadStatus"], "download_failed");
    assert!(track.body["lastDownloadError"]
        .as_str()
        .unwrap()
        .contains("Video unavailable"));
}

#[tokio::test]
async fn test_list_jobs() {
    let fixture = TestFixture::new();
    fixture.add_catalog_track("t1");
    fixture.add_catalog_track("t2");

    for id in ["t1", "t2"] {
        let response = fixture
            .post("/api/downloads", json!({ "trackId": id, "videoId": format!("v{}", id) }))
            .await;
        assert_eq!(response.status, StatusCode::OK);
    }
    fixture.wait_for_job("job-1").await;
    fixture.wait_for_job("job-2").await;

    let response = fixture.get("/api/downloads/jobs").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["queueLength"], 0);
    assert_eq!(response.body["activeJobs"], 0);
    assert_eq!(response.body["maxConcurrentJobs"], 1);

    let jobs = response.body["jobs"].as_array().unwrap();
    assert_eq!(jobs.len(), 2);
    // Newest first
    assert_eq!(jobs[0]["id"], "job-2");
    assert_eq!(jobs[1]["id"], "job-1");
}

#[tokio::test]
async fn test_get_unknown_job_is_not_found() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/downloads/jobs/job-404").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "Job not found");
}

#[tokio::test]
async fn test_bulk_enqueue_reports_each_track() {
    let fixture = TestFixture::new();
    fixture.add_catalog_track("t1");

    let response = fixture
        .post("/api/downloads/bulk", json!({ "trackIds": ["t1", "missing"] }))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let results = response.body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["id"], "t1");
    assert_eq!(results[0]["status"], "ok");
    assert_eq!(results[0]["jobId"], "job-1");
    assert_eq!(results[1]["id"], "missing");
    assert_eq!(results[1]["status"], "error");
    assert_eq!(results[1]["error"], "Track not found");
}

#[tokio::test]
async fn test_bulk_enqueue_requires_ids() {
    let fixture = TestFixture::new();
    let response = fixture
        .post("/api/downloads/bulk", json!({ "trackIds": [] }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "trackIds array is required");
}

#[tokio::test]
async fn test_unknown_track_is_not_found() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/tracks/nope").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Direct downloads
// =============================================================================

#[tokio::test]
async fn test_direct_download_rejects_non_youtube_url() {
    let fixture = TestFixture::new();
    let response = fixture
        .post(
            "/api/youtube/direct-download",
            json!({ "url": "https://vimeo.com/12345" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body["error"],
        "A valid YouTube video or playlist URL is required."
    );
}

#[tokio::test]
async fn test_direct_download_requires_url() {
    let fixture = TestFixture::new();
    let response = fixture.post("/api/youtube/direct-download", json!({})).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_direct_download_video() {
    let fixture = TestFixture::new();
    fixture
        .media
        .set_inspect_result(fixtures::video_info("vid1", "Great Song", "Great Band"))
        .await;

    let response = fixture
        .post(
            "/api/youtube/direct-download",
            json!({ "url": "https://www.youtube.com/watch?v=vid1" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["type"], "video");
    assert_eq!(response.body["message"], "Video download scheduled.");
    assert_eq!(response.body["video"]["id"], "vid1");

    let jobs = response.body["jobs"].as_array().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["trackId"], "youtube_vid1");
    assert_eq!(jobs[0]["videoId"], "vid1");

    let job_id = jobs[0]["jobId"].as_str().unwrap().to_string();
    let job = fixture.wait_for_job(&job_id).await;
    assert_eq!(job["status"], "completed");

    let track = fixture.get("/api/tracks/youtube_vid1").await;
    assert_eq!(track.status, StatusCode::OK);
    assert_eq!(track.body["downloadStatus"], "downloaded");
}

#[tokio::test]
async fn test_direct_download_playlist() {
    let fixture = TestFixture::new();
    fixture
        .media
        .set_inspect_result(fixtures::playlist_info(
            "PL1",
            "Mix",
            &[("a1", "First"), ("a2", "Second")],
        ))
        .await;

    let response = fixture
        .post(
            "/api/youtube/direct-download",
            json!({ "url": "https://www.youtube.com/playlist?list=PL1" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["type"], "playlist");
    assert_eq!(response.body["playlist"]["totalEntries"], 2);
    assert_eq!(response.body["jobs"].as_array().unwrap().len(), 2);
    assert!(response.body["failures"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_direct_download_inspect_failure_is_bad_request() {
    let fixture = TestFixture::new();
    let response = fixture
        .post(
            "/api/youtube/direct-download",
            json!({ "url": "https://youtu.be/broken" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].is_string());
}

// =============================================================================
// Files & metrics
// =============================================================================

#[tokio::test]
async fn test_downloaded_files_are_served() {
    let fixture = TestFixture::new();
    std::fs::create_dir_all(fixture.downloads_dir()).unwrap();
    std::fs::write(fixture.downloads_dir().join("song.m4a"), b"audio").unwrap();

    let (status, body) = fixture.get_text("/downloads/song.m4a").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "audio");

    let (status, _) = fixture.get_text("/downloads/missing.m4a").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new();
    fixture.get("/api/health").await;

    let (status, body) = fixture.get_text("/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("trackfetch_http_requests_total"));
    assert!(body.contains("trackfetch_jobs_tracked"));
}

#[tokio::test]
async fn test_metrics_fold_ids_into_route_templates() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/downloads/jobs/job-9999").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let (_, body) = fixture.get_text("/metrics").await;
    assert!(body.contains(r#"method="GET",path="/api/downloads/jobs/{id}",status="404""#));
    assert!(!body.contains("job-9999"));
}

// =============================================================================
// Log stream
// =============================================================================

/// Read SSE frames until one contains `needle`.
async fn read_until(body: &mut Body, needle: &str) -> String {
    let mut seen = String::new();
    let result = tokio::time::timeout(Duration::from_secs(2), async {
        while let Some(frame) = body.frame().await {
            let frame = frame.expect("Failed to read frame");
            if let Some(data) = frame.data_ref() {
                seen.push_str(&String::from_utf8_lossy(data));
                if seen.contains(needle) {
                    return;
                }
            }
        }
    })
    .await;
    assert!(result.is_ok(), "timed out waiting for {:?}; got {:?}", needle, seen);
    seen
}

#[tokio::test]
async fn test_log_stream_replays_backlog_then_live_entries() {
    let fixture = TestFixture::new();
    fixture.orchestrator.log("job-7", "before connect");

    let request = Request::builder()
        .uri("/api/downloads/logs/stream")
        .body(Body::empty())
        .unwrap();
    let response = fixture.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/event-stream"
    );
    assert_eq!(fixture.orchestrator.logs().subscriber_count(), 1);

    let mut body = response.into_body();
    let backlog = read_until(&mut body, "before connect").await;
    assert!(backlog.starts_with("data: "));
    assert!(backlog.contains("\"jobId\":\"job-7\""));

    fixture.orchestrator.log("job-7", "after connect");
    let live = read_until(&mut body, "after connect").await;
    assert!(!live.contains("before connect"));

    drop(body);
    assert_eq!(fixture.orchestrator.logs().subscriber_count(), 0);
}
