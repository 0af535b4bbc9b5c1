//! Track records and their persistence.
//!
//! Tracks are owned by the catalog; the download pipeline only reads them and
//! writes back status, file path and media metadata through [`TrackStore`].

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteTrackStore;
pub use store::{StatusDetails, TrackError, TrackStore};
pub use types::{DownloadStatus, Track, TrackPatch, TrackSource};
