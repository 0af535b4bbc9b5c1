//! Download execution.
//!
//! [`DownloadExecutor`] is the orchestrator's [`JobHandler`](crate::orchestrator::JobHandler):
//! it resolves a media id when the job has none, probes the source, merges
//! metadata onto the track according to its provenance, and extracts audio
//! into the downloads directory. [`DirectDownloads`] creates tracks and jobs
//! straight from a video or playlist URL.

mod direct;
mod executor;
mod sanitize;

pub use direct::{
    direct_track_id, is_youtube_url, DirectDownloadError, DirectDownloadKind,
    DirectDownloadResult, DirectDownloads, EntryFailure, PlaylistSummary, ScheduledJob,
    VideoSummary,
};
pub use executor::{
    metadata_patch, target_file_name, DownloadError, DownloadExecutor, ExecutorSettings,
    DOWNLOADS_PREFIX,
};
pub use sanitize::{sanitize_filename, FALLBACK_FILENAME, MAX_FILENAME_LEN};
