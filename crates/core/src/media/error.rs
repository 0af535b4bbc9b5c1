//! Error types for the media module.

use thiserror::Error;

use crate::process::ProcessError;

/// Errors from media inspection and extraction.
#[derive(Debug, Error)]
pub enum MediaError {
    /// yt-dlp could not be run or failed.
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// The inspected media carried no video id.
    #[error("Unable to determine the YouTube video id for {0}")]
    MissingVideoId(String),
}
