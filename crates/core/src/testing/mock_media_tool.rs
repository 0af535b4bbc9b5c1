//! Mock media tool for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::media::{LineSink, MediaError, MediaTool, MetadataContext, VideoMetadata};
use crate::process::{ProcessError, ProcessLine};

/// A recorded extraction for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedExtraction {
    pub url: String,
    pub output_path: PathBuf,
    pub timestamp: Instant,
}

/// Mock implementation of the MediaTool trait.
///
/// By default probing synthesizes metadata from the `v=` parameter of the
/// URL, inspection fails, and extraction writes an empty file at the output
/// path after emitting the configured lines.
pub struct MockMediaTool {
    metadata: Arc<RwLock<Option<VideoMetadata>>>,
    inspect_result: Arc<RwLock<Option<serde_json::Value>>>,
    probe_error: Arc<RwLock<Option<String>>>,
    extract_error: Arc<RwLock<Option<String>>>,
    extract_delay: Arc<RwLock<Duration>>,
    output_lines: Arc<RwLock<Vec<ProcessLine>>>,
    probes: Arc<RwLock<Vec<String>>>,
    extractions: Arc<RwLock<Vec<RecordedExtraction>>>,
    running: Arc<AtomicUsize>,
    peak_running: Arc<AtomicUsize>,
}

impl Default for MockMediaTool {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMediaTool {
    pub fn new() -> Self {
        Self {
            metadata: Arc::new(RwLock::new(None)),
            inspect_result: Arc::new(RwLock::new(None)),
            probe_error: Arc::new(RwLock::new(None)),
            extract_error: Arc::new(RwLock::new(None)),
            extract_delay: Arc::new(RwLock::new(Duration::ZERO)),
            output_lines: Arc::new(RwLock::new(Vec::new())),
            probes: Arc::new(RwLock::new(Vec::new())),
            extractions: Arc::new(RwLock::new(Vec::new())),
            running: Arc::new(AtomicUsize::new(0)),
            peak_running: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Metadata returned by every probe.
    pub async fn set_metadata(&self, metadata: VideoMetadata) {
        *self.metadata.write().await = Some(metadata);
    }

    /// Info document returned by every inspection.
    pub async fn set_inspect_result(&self, info: serde_json::Value) {
        *self.inspect_result.write().await = Some(info);
    }

    /// Make every probe fail with `message` as yt-dlp's stderr.
    pub async fn fail_probe(&self, message: &str) {
        *self.probe_error.write().await = Some(message.to_string());
    }

    /// Make every extraction fail with `message` as yt-dlp's stderr.
    pub async fn fail_extract(&self, message: &str) {
        *self.extract_error.write().await = Some(message.to_string());
    }

    /// How long each extraction takes.
    pub async fn set_extract_delay(&self, delay: Duration) {
        *self.extract_delay.write().await = delay;
    }

    /// Lines emitted during each extraction.
    pub async fn set_output_lines(&self, lines: Vec<ProcessLine>) {
        *self.output_lines.write().await = lines;
    }

    pub async fn probed_urls(&self) -> Vec<String> {
        self.probes.read().await.clone()
    }

    pub async fn recorded_extractions(&self) -> Vec<RecordedExtraction> {
        self.extractions.read().await.clone()
    }

    pub async fn extract_count(&self) -> usize {
        self.extractions.read().await.len()
    }

    /// Most extractions that were ever running at the same time.
    pub fn peak_concurrent_extractions(&self) -> usize {
        self.peak_running.load(Ordering::SeqCst)
    }

    fn exit_error(message: &str) -> MediaError {
        MediaError::Process(ProcessError::Exit {
            program: "yt-dlp".to_string(),
            code: Some(1),
            detail: Some(message.to_string()),
        })
    }
}

fn video_id_from_url(url: &str) -> Option<String> {
    url.split(['?', '&'])
        .find_map(|part| part.strip_prefix("v="))
        .map(str::to_string)
}

#[async_trait]
impl MediaTool for MockMediaTool {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn probe(&self, url: &str) -> Result<VideoMetadata, MediaError> {
        self.probes.write().await.push(url.to_string());

        if let Some(message) = self.probe_error.read().await.as_deref() {
            return Err(Self::exit_error(message));
        }
        if let Some(metadata) = self.metadata.read().await.clone() {
            return Ok(metadata);
        }

        let video_id = video_id_from_url(url);
        let info = serde_json::json!({
            "id": video_id,
            "title": format!("Mock Video {}", video_id.as_deref().unwrap_or("?")),
            "channel": "Mock Channel",
            "duration": 180,
        });
        let ctx = MetadataContext {
            url: Some(url.to_string()),
            ..Default::default()
        };
        Ok(VideoMetadata::from_info(&info, &ctx))
    }

    async fn inspect(&self, url: &str) -> Result<serde_json::Value, MediaError> {
        match self.inspect_result.read().await.clone() {
            Some(info) => Ok(info),
            None => Err(Self::exit_error(&format!("ERROR: Unsupported URL: {}", url))),
        }
    }

    async fn extract(
        &self,
        url: &str,
        output_path: &Path,
        on_line: &LineSink<'_>,
    ) -> Result<(), MediaError> {
        self.extractions.write().await.push(RecordedExtraction {
            url: url.to_string(),
            output_path: output_path.to_path_buf(),
            timestamp: Instant::now(),
        });

        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_running.fetch_max(now, Ordering::SeqCst);

        for line in self.output_lines.read().await.iter() {
            on_line(line.clone());
        }
        let delay = *self.extract_delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let result = match self.extract_error.read().await.as_deref() {
            Some(message) => Err(Self::exit_error(message)),
            None => {
                let _ = tokio::fs::write(output_path, b"").await;
                Ok(())
            }
        };

        self.running.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
