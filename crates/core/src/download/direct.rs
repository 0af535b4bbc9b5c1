//! Scheduling downloads straight from a YouTube video or playlist URL.
//!
//! Tracks created here have [`TrackSource::DirectMedia`] provenance, so the
//! executor later refreshes their title and artist from the media probe.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::media::{MediaError, MediaTool, MetadataContext, PlaylistInfo, VideoMetadata};
use crate::orchestrator::{JobSpec, Orchestrator, OrchestratorError};
use crate::track::{DownloadStatus, StatusDetails, TrackError, TrackPatch, TrackSource, TrackStore};

/// Track id given to a video that is not yet in the catalog.
pub fn direct_track_id(video_id: &str) -> String {
    format!("youtube_{}", video_id)
}

/// Accepts `http(s)` URLs whose host looks like `youtube` or `youtu.be`.
pub fn is_youtube_url(value: &str) -> bool {
    let Ok(url) = reqwest::Url::parse(value) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    url.host_str()
        .map(|host| host.contains("youtube") || host.contains("youtu.be"))
        .unwrap_or(false)
}

#[derive(Debug, Error)]
pub enum DirectDownloadError {
    #[error("A valid YouTube video or playlist URL is required.")]
    InvalidUrl,

    #[error("Unable to determine the YouTube video id for the provided URL.")]
    MissingVideoId,

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("Track store error: {0}")]
    Store(#[from] TrackError),

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectDownloadKind {
    Video,
    Playlist,
}

/// A job created for one video.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledJob {
    pub job_id: String,
    pub track_id: String,
    pub video_id: String,
    /// The video was already bound to a track, which was updated in place.
    pub reused_existing: bool,
}

/// A playlist entry that could not be scheduled.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryFailure {
    pub video_id: Option<String>,
    pub title: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummary {
    pub id: String,
    pub title: String,
    pub channel: String,
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSummary {
    pub id: Option<String>,
    pub title: String,
    pub total_entries: usize,
    pub processed_entries: usize,
    pub skipped_entries: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectDownloadResult {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: DirectDownloadKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playlist: Option<PlaylistSummary>,
    pub jobs: Vec<ScheduledJob>,
    pub failures: Vec<EntryFailure>,
}

/// Turns media URLs into catalog tracks and queued jobs.
pub struct DirectDownloads {
    store: Arc<dyn TrackStore>,
    media: Arc<dyn MediaTool>,
    orchestrator: Orchestrator,
    max_items: usize,
}

impl DirectDownloads {
    /// `max_items` caps how many playlist entries are scheduled (minimum 1).
    pub fn new(
        store: Arc<dyn TrackStore>,
        media: Arc<dyn MediaTool>,
        orchestrator: Orchestrator,
        max_items: usize,
    ) -> Self {
        Self {
            store,
            media,
            orchestrator,
            max_items: max_items.max(1),
        }
    }

    /// Inspects `url` and schedules one job per video.
    ///
    /// For playlists, entries that fail are reported in `failures` and do not
    /// stop the rest of the batch.
    pub async fn schedule(&self, url: &str) -> Result<DirectDownloadResult, DirectDownloadError> {
        if !is_youtube_url(url) {
            return Err(DirectDownloadError::InvalidUrl);
        }

        let info = self.media.inspect(url).await?;
        match PlaylistInfo::from_info(&info) {
            Some(playlist) => Ok(self.schedule_playlist(playlist)),
            None => self.schedule_video(&info),
        }
    }

    fn schedule_video(&self, info: &Value) -> Result<DirectDownloadResult, DirectDownloadError> {
        let metadata = VideoMetadata::from_info(info, &MetadataContext::default());
        let job = self.ensure_track_and_enqueue(&metadata)?;
        info!(video_id = %job.video_id, job_id = %job.job_id, "Scheduled direct video download");

        Ok(DirectDownloadResult {
            message: "Video download scheduled.".to_string(),
            kind: DirectDownloadKind::Video,
            video: Some(VideoSummary {
                id: job.video_id.clone(),
                title: metadata.title,
                channel: metadata.channel_name,
                duration_ms: metadata.duration_ms,
            }),
            playlist: None,
            jobs: vec![job],
            failures: Vec::new(),
        })
    }

    fn schedule_playlist(&self, playlist: PlaylistInfo) -> DirectDownloadResult {
        let total = playlist.entries.len();
        let processed = total.min(self.max_items);
        let mut jobs = Vec::new();
        let mut failures = Vec::new();

        for entry in playlist.entries.iter().take(processed) {
            let field = |key: &str| entry.get(key).and_then(Value::as_str).map(str::to_string);
            let ctx = MetadataContext {
                video_id: field("id"),
                url: field("url"),
                title: field("title"),
                channel_name: field("channel"),
                playlist_title: Some(playlist.title.clone()),
                ..Default::default()
            };
            let metadata = VideoMetadata::from_info(entry, &ctx);

            let scheduled = if metadata.video_id.is_none() {
                Err("Entry did not include a video id.".to_string())
            } else {
                self.ensure_track_and_enqueue(&metadata)
                    .map_err(|e| e.to_string())
            };

            match scheduled {
                Ok(job) => jobs.push(job),
                Err(error) => {
                    warn!(video_id = ?ctx.video_id, "Skipping playlist entry: {}", error);
                    failures.push(EntryFailure {
                        video_id: ctx.video_id,
                        title: ctx.title,
                        error,
                    });
                }
            }
        }

        info!(
            playlist = %playlist.title,
            scheduled = jobs.len(),
            failed = failures.len(),
            skipped = total - processed,
            "Scheduled direct playlist download"
        );

        DirectDownloadResult {
            message: "Playlist download scheduled.".to_string(),
            kind: DirectDownloadKind::Playlist,
            video: None,
            playlist: Some(PlaylistSummary {
                id: playlist.id,
                title: playlist.title,
                total_entries: total,
                processed_entries: processed,
                skipped_entries: total - processed,
            }),
            jobs,
            failures,
        }
    }

    fn ensure_track_and_enqueue(
        &self,
        metadata: &VideoMetadata,
    ) -> Result<ScheduledJob, DirectDownloadError> {
        let video_id = metadata
            .video_id
            .clone()
            .ok_or(DirectDownloadError::MissingVideoId)?;
        let existing = self.store.find_by_video_id(&video_id)?;
        let track_id = existing
            .as_ref()
            .map(|t| t.id.clone())
            .unwrap_or_else(|| direct_track_id(&video_id));

        let track = self.store.upsert(TrackPatch {
            name: Some(metadata.title.clone()),
            artists: Some(vec![metadata.channel_name.clone()]),
            album: Some(metadata.album_name.clone()),
            duration_ms: metadata.duration_ms,
            release_date: metadata.upload_date.clone(),
            youtube_video_id: Some(video_id.clone()),
            youtube_url: metadata.url.clone(),
            youtube_channel: Some(metadata.channel_name.clone()),
            youtube_channel_id: metadata.channel_id.clone(),
            youtube_description: metadata.description.clone(),
            youtube_tags: Some(metadata.tags.clone()).filter(|tags| !tags.is_empty()),
            playlist_name: metadata.playlist_title.clone(),
            source: Some(TrackSource::DirectMedia),
            ..TrackPatch::new(track_id)
        })?;
        self.store.set_download_status(
            &track.id,
            DownloadStatus::DownloadPending,
            StatusDetails::default(),
        )?;

        let job = self.orchestrator.enqueue(JobSpec {
            track_name: Some(track.name.clone()),
            artists: track.artists.clone(),
            ..JobSpec::new(track.id.clone()).with_video_id(video_id.clone())
        })?;

        Ok(ScheduledJob {
            job_id: job.id,
            track_id: track.id,
            video_id,
            reused_existing: existing.is_some(),
        })
    }
}
