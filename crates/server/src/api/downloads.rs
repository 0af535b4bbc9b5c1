//! Download job API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, warn};
use trackfetch_core::orchestrator::SubscriberId;
use trackfetch_core::track::StatusDetails;
use trackfetch_core::{DownloadStatus, Job, JobSpec, JobStats, LogEntry, Orchestrator};

use super::handlers::{api_error, ApiError};
use crate::metrics::{LOG_STREAMS_ACTIVE, LOG_STREAMS_TOTAL};
use crate::state::AppState;

/// Interval between SSE keep-alive comments.
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(30);

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueRequest {
    pub track_id: String,
    #[serde(default)]
    pub video_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueResponse {
    pub message: String,
    pub job_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkEnqueueRequest {
    #[serde(default)]
    pub track_ids: Vec<String>,
}

/// Outcome for one track of a bulk request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkEnqueueResult {
    pub id: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BulkEnqueueResponse {
    pub results: Vec<BulkEnqueueResult>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Queue a download for a catalog track.
pub async fn enqueue_download(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EnqueueRequest>,
) -> Result<Json<EnqueueResponse>, ApiError> {
    let job = enqueue_track(&state, &request.track_id, request.video_id)?;
    Ok(Json(EnqueueResponse {
        message: "Download started".to_string(),
        job_id: job.id,
        video_id: job.video_id,
    }))
}

/// Queue downloads for several tracks. Failures are reported per track.
pub async fn enqueue_bulk(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BulkEnqueueRequest>,
) -> Result<Json<BulkEnqueueResponse>, ApiError> {
    if request.track_ids.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "trackIds array is required",
        ));
    }

    let results = request
        .track_ids
        .into_iter()
        .map(|id| match enqueue_track(&state, &id, None) {
            Ok(job) => BulkEnqueueResult {
                id,
                status: "ok",
                job_id: Some(job.id),
                error: None,
            },
            Err((_, Json(body))) => BulkEnqueueResult {
                id,
                status: "error",
                job_id: None,
                error: Some(body.error),
            },
        })
        .collect();

    Ok(Json(BulkEnqueueResponse { results }))
}

fn enqueue_track(
    state: &AppState,
    track_id: &str,
    video_id: Option<String>,
) -> Result<Job, ApiError> {
    let track = state
        .store()
        .get(track_id)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Track not found"))?;

    state
        .store()
        .set_download_status(
            &track.id,
            DownloadStatus::DownloadPending,
            StatusDetails::default(),
        )
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let spec = JobSpec {
        job_id: None,
        track_id: track.id,
        video_id: video_id.filter(|id| !id.trim().is_empty()),
        track_name: Some(track.name),
        artists: track.artists,
    };

    state
        .orchestrator()
        .enqueue(spec)
        .map_err(|e| api_error(StatusCode::CONFLICT, e.to_string()))
}

/// Queue depth, concurrency and every tracked job, newest first.
pub async fn list_jobs(State(state): State<Arc<AppState>>) -> Json<JobStats> {
    Json(state.orchestrator().stats())
}

pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Job>, ApiError> {
    state
        .orchestrator()
        .job(&id)
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Job not found"))
}

/// Stream job log entries as server-sent events.
///
/// Replays the recent-log buffer, then forwards live entries. Entries are
/// handed over through an unbounded channel so a slow client never holds
/// up the jobs producing them.
pub async fn stream_logs(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::unbounded_channel::<LogEntry>();
    let orchestrator = state.orchestrator().clone();
    let (subscriber, backlog) = orchestrator.subscribe_with_backlog(move |entry| {
        // Closed receiver means the client is gone; the guard unsubscribes.
        let _ = tx.send(entry.clone());
    });

    LOG_STREAMS_ACTIVE.inc();
    LOG_STREAMS_TOTAL.inc();
    debug!(subscriber, backlog = backlog.len(), "Log stream client connected");

    let entries = stream::iter(backlog).chain(UnboundedReceiverStream::new(rx));
    let stream = LogEventStream {
        entries,
        _subscription: Subscription {
            orchestrator,
            id: subscriber,
        },
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    )
}

/// Unregisters a log subscriber when the client's stream is dropped.
struct Subscription {
    orchestrator: Orchestrator,
    id: SubscriberId,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.orchestrator.unsubscribe(self.id);
        LOG_STREAMS_ACTIVE.dec();
        debug!(subscriber = self.id, "Log stream client disconnected");
    }
}

struct LogEventStream<S> {
    entries: S,
    _subscription: Subscription,
}

impl<S> Stream for LogEventStream<S>
where
    S: Stream<Item = LogEntry> + Unpin,
{
    type Item = Result<Event, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.entries).poll_next(cx) {
                Poll::Ready(Some(entry)) => match serde_json::to_string(&entry) {
                    Ok(json) => return Poll::Ready(Some(Ok(Event::default().data(json)))),
                    Err(e) => warn!("Failed to serialize log entry: {}", e),
                },
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
