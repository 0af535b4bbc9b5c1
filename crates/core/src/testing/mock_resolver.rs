//! Mock resolver for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::resolver::{ResolutionFailure, ResolutionLog, ResolutionResult, Resolver};
use crate::track::Track;

/// Resolver returning a configurable result and counting its calls.
pub struct MockResolver {
    result: Arc<RwLock<ResolutionResult>>,
    log_lines: Arc<RwLock<Vec<String>>>,
    resolved: Arc<RwLock<Vec<String>>>,
    calls: Arc<AtomicUsize>,
}

impl MockResolver {
    pub fn new(result: ResolutionResult) -> Self {
        Self {
            result: Arc::new(RwLock::new(result)),
            log_lines: Arc::new(RwLock::new(Vec::new())),
            resolved: Arc::new(RwLock::new(Vec::new())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always matches `video_id` after one attempt.
    pub fn succeeding(video_id: &str) -> Self {
        Self::new(ResolutionResult::success(video_id, 1, "mock match"))
    }

    /// Always fails with `error`.
    pub fn failing(error: &str) -> Self {
        Self::new(ResolutionResult::failure(
            ResolutionFailure::NoResults,
            1,
            "mock failure",
            Some(error.to_string()),
        ))
    }

    pub async fn set_result(&self, result: ResolutionResult) {
        *self.result.write().await = result;
    }

    /// Lines written to the caller's log on every call.
    pub async fn set_log_lines(&self, lines: Vec<String>) {
        *self.log_lines.write().await = lines;
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Ids of the tracks resolved so far.
    pub async fn resolved_tracks(&self) -> Vec<String> {
        self.resolved.read().await.clone()
    }
}

#[async_trait]
impl Resolver for MockResolver {
    fn name(&self) -> &str {
        "mock"
    }

    async fn resolve(&self, track: &Track, log: &ResolutionLog<'_>) -> ResolutionResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.resolved.write().await.push(track.id.clone());
        for line in self.log_lines.read().await.iter() {
            log(line.as_str());
        }
        self.result.read().await.clone()
    }
}
