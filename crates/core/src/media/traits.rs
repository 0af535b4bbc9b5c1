//! Trait definitions for the media module.

use async_trait::async_trait;
use std::path::Path;

use super::error::MediaError;
use super::types::VideoMetadata;
use crate::process::ProcessLine;

/// Receives output lines while an extraction runs.
pub type LineSink<'a> = dyn Fn(ProcessLine) + Send + Sync + 'a;

/// A tool that can inspect media URLs and extract their audio.
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Returns the name of this implementation.
    fn name(&self) -> &str;

    /// Fetches metadata for a single video.
    async fn probe(&self, url: &str) -> Result<VideoMetadata, MediaError>;

    /// Fetches the raw info document for a video or playlist. Playlist
    /// entries are listed without being resolved.
    async fn inspect(&self, url: &str) -> Result<serde_json::Value, MediaError>;

    /// Extracts audio from `url` into `output_path`, streaming tool output.
    async fn extract(
        &self,
        url: &str,
        output_path: &Path,
        on_line: &LineSink<'_>,
    ) -> Result<(), MediaError>;
}
