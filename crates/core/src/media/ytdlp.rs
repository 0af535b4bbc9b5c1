//! yt-dlp implementation of [`MediaTool`].

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use super::config::MediaConfig;
use super::error::MediaError;
use super::traits::{LineSink, MediaTool};
use super::types::{MetadataContext, VideoMetadata};
use crate::process::ProcessRunner;

/// Arguments for fetching single-video metadata without downloading.
pub fn probe_args(url: &str) -> Vec<String> {
    [
        "--dump-single-json",
        "--skip-download",
        "--no-warnings",
        "--no-playlist",
        url,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Arguments for listing a video or playlist without resolving entries.
pub fn inspect_args(url: &str) -> Vec<String> {
    [
        "--dump-single-json",
        "--skip-download",
        "--no-warnings",
        "--flat-playlist",
        url,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Arguments for extracting audio into `output_path`.
pub fn extract_args(url: &str, audio_format: &str, output_path: &Path) -> Vec<String> {
    vec![
        url.to_string(),
        "-x".to_string(),
        "--audio-format".to_string(),
        audio_format.to_string(),
        "-o".to_string(),
        output_path.display().to_string(),
    ]
}

/// yt-dlp wrapper.
pub struct YtDlp {
    config: MediaConfig,
    runner: ProcessRunner,
}

impl YtDlp {
    pub fn new(config: MediaConfig) -> Self {
        let runner = match config.process_timeout_secs {
            Some(secs) => ProcessRunner::new().with_timeout(Duration::from_secs(secs)),
            None => ProcessRunner::new(),
        };
        Self { config, runner }
    }

    pub fn config(&self) -> &MediaConfig {
        &self.config
    }
}

#[async_trait]
impl MediaTool for YtDlp {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn probe(&self, url: &str) -> Result<VideoMetadata, MediaError> {
        debug!(url, "Probing media");
        let info = self
            .runner
            .run_json(&self.config.ytdlp_path, &probe_args(url))
            .await?;
        let ctx = MetadataContext {
            url: Some(url.to_string()),
            ..Default::default()
        };
        Ok(VideoMetadata::from_info(&info, &ctx))
    }

    async fn inspect(&self, url: &str) -> Result<serde_json::Value, MediaError> {
        debug!(url, "Inspecting media URL");
        Ok(self
            .runner
            .run_json(&self.config.ytdlp_path, &inspect_args(url))
            .await?)
    }

    async fn extract(
        &self,
        url: &str,
        output_path: &Path,
        on_line: &LineSink<'_>,
    ) -> Result<(), MediaError> {
        let args = extract_args(url, &self.config.audio_format, output_path);
        self.runner
            .run(&self.config.ytdlp_path, &args, |line| on_line(line))
            .await?;
        Ok(())
    }
}
