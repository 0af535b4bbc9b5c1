//! Per-job download procedure.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::media::{watch_url, MediaError, MediaTool, VideoMetadata, DEFAULT_SINGLE_ALBUM};
use crate::orchestrator::{Job, JobHandler, JobLogger, JobOutcome};
use crate::process::ProcessLine;
use crate::resolver::{ResolutionFailure, Resolver};
use crate::track::{
    DownloadStatus, StatusDetails, Track, TrackError, TrackPatch, TrackSource, TrackStore,
};

use super::sanitize::sanitize_filename;

/// Prefix of the relative paths recorded on tracks.
pub const DOWNLOADS_PREFIX: &str = "downloads";

/// Why a download job failed. The display text is what gets recorded on the
/// job and the track.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Track not found")]
    TrackNotFound(String),

    #[error("{message}")]
    Resolution {
        kind: Option<ResolutionFailure>,
        message: String,
    },

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("Track store error: {0}")]
    Store(#[from] TrackError),

    #[error("Failed to prepare downloads directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Settings the executor needs beyond its collaborators.
#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    /// Where extracted files are written.
    pub downloads_dir: PathBuf,
    /// Audio container/codec passed to the media tool, also the file extension.
    pub audio_format: String,
}

/// Resolves, probes and extracts one track per job, persisting every status
/// transition on the track.
pub struct DownloadExecutor {
    store: Arc<dyn TrackStore>,
    resolver: Arc<dyn Resolver>,
    media: Arc<dyn MediaTool>,
    settings: ExecutorSettings,
}

impl DownloadExecutor {
    pub fn new(
        store: Arc<dyn TrackStore>,
        resolver: Arc<dyn Resolver>,
        media: Arc<dyn MediaTool>,
        settings: ExecutorSettings,
    ) -> Self {
        Self {
            store,
            resolver,
            media,
            settings,
        }
    }

    /// Runs the full procedure for `job`.
    pub async fn download(&self, job: &Job, log: &JobLogger) -> Result<JobOutcome, DownloadError> {
        let Some(track) = self.store.get(&job.track_id)? else {
            self.mark_failed(&job.track_id, "Track not found");
            return Err(DownloadError::TrackNotFound(job.track_id.clone()));
        };

        let known = job
            .video_id
            .as_deref()
            .or(track.youtube_video_id.as_deref())
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        let video_id = match known {
            Some(id) => {
                log.log(&format!("Using provided YouTube video id {}", id));
                id
            }
            None => self.resolve(&track, log).await?,
        };

        match self.fetch(&track, &video_id, log).await {
            Ok(file_path) => Ok(JobOutcome {
                video_id,
                file_path,
            }),
            Err(e) => {
                self.mark_failed(&track.id, &e.to_string());
                Err(e)
            }
        }
    }

    async fn resolve(&self, track: &Track, log: &JobLogger) -> Result<String, DownloadError> {
        log.log(&format!(
            "Resolving YouTube video via {} resolver",
            self.resolver.name()
        ));

        let resolver_log = log.clone();
        let on_log = move |message: &str| resolver_log.log(&format!("[ai] {}", message));
        let result = self.resolver.resolve(track, &on_log).await;

        match result.matched_video() {
            Some(video_id) => {
                let attempts = if result.attempts > 0 {
                    format!(" after {} attempt(s)", result.attempts)
                } else {
                    String::new()
                };
                let reason = if result.reason.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", result.reason)
                };
                log.log(&format!(
                    "Matched YouTube video {}{}{}",
                    video_id, attempts, reason
                ));
                Ok(video_id.to_string())
            }
            None => {
                let message = result.failure_message();
                self.mark_failed(&track.id, &message);
                Err(DownloadError::Resolution {
                    kind: result.failure,
                    message,
                })
            }
        }
    }

    /// Everything after resolution. Any error here is recorded on the track
    /// by the caller.
    async fn fetch(
        &self,
        track: &Track,
        video_id: &str,
        log: &JobLogger,
    ) -> Result<String, DownloadError> {
        self.store.set_download_status(
            &track.id,
            DownloadStatus::DownloadInProgress,
            StatusDetails::default(),
        )?;

        let url = track
            .youtube_url
            .clone()
            .filter(|_| track.youtube_video_id.as_deref() == Some(video_id))
            .unwrap_or_else(|| watch_url(video_id));

        let metadata = match self.media.probe(&url).await {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                log.log(&format!("[metadata] Failed to fetch metadata: {}", e));
                None
            }
        };

        let patch = metadata_patch(track, video_id, &url, metadata.as_ref());
        let file_name = target_file_name(track, &patch, &self.settings.audio_format);
        self.store.upsert(patch)?;

        tokio::fs::create_dir_all(&self.settings.downloads_dir).await?;
        let output_path = self.settings.downloads_dir.join(&file_name);
        debug!(track_id = %track.id, path = %output_path.display(), "Extracting audio");

        let tag = self.media.name();
        let on_line = |line: ProcessLine| log.log(&line.tagged(tag));
        self.media.extract(&url, &output_path, &on_line).await?;

        let relative = format!("{}/{}", DOWNLOADS_PREFIX, file_name);
        self.store.set_download_status(
            &track.id,
            DownloadStatus::Downloaded,
            StatusDetails::file_path(relative.clone()),
        )?;
        Ok(relative)
    }

    fn mark_failed(&self, track_id: &str, message: &str) {
        if let Err(e) = self.store.set_download_status(
            track_id,
            DownloadStatus::DownloadFailed,
            StatusDetails::error(message),
        ) {
            match e {
                TrackError::NotFound(_) => debug!(track_id, "No track to mark as failed"),
                e => warn!(track_id, "Failed to record download failure: {}", e),
            }
        }
    }
}

#[async_trait]
impl JobHandler for DownloadExecutor {
    async fn execute(&self, job: &Job, log: &JobLogger) -> Result<JobOutcome, DownloadError> {
        self.download(job, log).await
    }
}

/// Builds the track update for a download.
///
/// Media-side fields are refreshed from the probe whenever it succeeded.
/// Title, artists, album, duration and release date are only replaced for
/// tracks that came from the media provider; catalog tracks keep theirs.
pub fn metadata_patch(
    track: &Track,
    video_id: &str,
    url: &str,
    metadata: Option<&VideoMetadata>,
) -> TrackPatch {
    let mut patch = TrackPatch::new(track.id.clone());
    patch.youtube_video_id = Some(video_id.to_string());
    patch.youtube_url = Some(url.to_string());

    let Some(meta) = metadata else {
        return patch;
    };

    patch.youtube_channel = Some(meta.channel_name.clone());
    patch.youtube_channel_id = meta.channel_id.clone();
    patch.youtube_description = meta.description.clone();
    patch.youtube_tags = Some(meta.tags.clone()).filter(|tags| !tags.is_empty());
    patch.playlist_name = meta.playlist_title.clone();

    if track.source == TrackSource::DirectMedia {
        patch.name = Some(meta.title.clone());
        patch.artists = Some(vec![meta.channel_name.clone()]);
        patch.album = Some(
            meta.playlist_title
                .clone()
                .or_else(|| track.album.clone())
                .unwrap_or_else(|| DEFAULT_SINGLE_ALBUM.to_string()),
        );
        patch.duration_ms = meta.duration_ms;
        patch.release_date = meta.upload_date.clone();
    }

    patch
}

/// `<artist>_<title>_<track id>.<format>`, sanitized.
///
/// The stored artist and title win; the patch only fills in missing ones.
pub fn target_file_name(track: &Track, patch: &TrackPatch, audio_format: &str) -> String {
    let artist = track
        .first_artist()
        .filter(|a| !a.is_empty())
        .or_else(|| patch.artists.as_ref().and_then(|a| a.first()).map(String::as_str))
        .unwrap_or("unknown");
    let title = Some(track.name.as_str())
        .filter(|n| !n.is_empty())
        .or(patch.name.as_deref())
        .unwrap_or(track.id.as_str());

    format!(
        "{}_{}.{}",
        sanitize_filename(&format!("{}_{}", artist, title)),
        sanitize_filename(&track.id),
        audio_format
    )
}
