//! Media extraction through yt-dlp.
//!
//! [`MediaTool`] is the seam the download executor and the direct-download
//! scheduler use; [`YtDlp`] implements it on top of the
//! [`ProcessRunner`](crate::process::ProcessRunner).

mod config;
mod error;
mod traits;
mod types;
mod ytdlp;

pub use config::MediaConfig;
pub use error::MediaError;
pub use traits::{LineSink, MediaTool};
pub use types::{
    normalize_upload_date, watch_url, MetadataContext, PlaylistInfo, VideoMetadata,
    DEFAULT_SINGLE_ALBUM, UNKNOWN_ARTIST, UNKNOWN_TITLE,
};
pub use ytdlp::{extract_args, inspect_args, probe_args, YtDlp};
