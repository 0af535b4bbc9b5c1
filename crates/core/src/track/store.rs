//! Track storage trait.

use thiserror::Error;

use super::{DownloadStatus, Track, TrackPatch};

/// Errors from track storage.
#[derive(Debug, Error)]
pub enum TrackError {
    #[error("Track not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Corrupt track record {id}: {reason}")]
    Corrupt { id: String, reason: String },
}

/// Extra fields written alongside a status change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusDetails {
    /// Replaces the last download error; `None` clears it.
    pub error: Option<String>,
    /// Replaces the file path; `None` keeps the existing one.
    pub file_path: Option<String>,
}

impl StatusDetails {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            file_path: None,
        }
    }

    pub fn file_path(path: impl Into<String>) -> Self {
        Self {
            error: None,
            file_path: Some(path.into()),
        }
    }
}

/// Trait for track storage backends.
///
/// Every method is atomic with respect to other calls on the same store.
pub trait TrackStore: Send + Sync {
    /// Get a track by id. A missing track is `Ok(None)`.
    fn get(&self, id: &str) -> Result<Option<Track>, TrackError>;

    /// Find the track bound to a media video id.
    fn find_by_video_id(&self, video_id: &str) -> Result<Option<Track>, TrackError>;

    /// Create or merge a track. Unset patch fields keep their stored values.
    fn upsert(&self, patch: TrackPatch) -> Result<Track, TrackError>;

    /// Write a new download status.
    fn set_download_status(
        &self,
        id: &str,
        status: DownloadStatus,
        details: StatusDetails,
    ) -> Result<Track, TrackError>;
}
