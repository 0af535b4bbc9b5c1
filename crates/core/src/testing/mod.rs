//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the collaborator traits
//! (search provider, chat model, media tool, resolver, log sink), allowing
//! the orchestrator and resolvers to be exercised without network access or
//! a yt-dlp binary.
//!
//! # Example
//!
//! ```rust,ignore
//! use trackfetch_core::testing::{fixtures, MockMediaTool, MockResolver};
//!
//! let media = MockMediaTool::new();
//! let resolver = MockResolver::succeeding("dQw4w9WgXcQ");
//!
//! media.fail_extract("ERROR: Video unavailable").await;
//! ```

mod memory_log_sink;
mod mock_chat_client;
mod mock_media_tool;
mod mock_resolver;
mod mock_searcher;

pub use memory_log_sink::MemoryLogSink;
pub use mock_chat_client::ScriptedChatClient;
pub use mock_media_tool::{MockMediaTool, RecordedExtraction};
pub use mock_resolver::MockResolver;
pub use mock_searcher::{MockSearcher, RecordedSearch};

/// Test fixtures and helper functions.
pub mod fixtures {
    use serde_json::{json, Value};

    use crate::searcher::VideoResult;
    use crate::track::{Track, TrackSource};

    /// A catalog track with one artist.
    pub fn catalog_track(id: &str, artist: &str, name: &str) -> Track {
        let mut track = Track::new(id, name, vec![artist.to_string()]);
        track.album = Some(format!("{} Album", artist));
        track.duration_ms = Some(210_000);
        track
    }

    /// A track created from a media URL.
    pub fn direct_track(video_id: &str) -> Track {
        let mut track = Track::new(
            format!("youtube_{}", video_id),
            crate::media::UNKNOWN_TITLE,
            vec![crate::media::UNKNOWN_ARTIST.to_string()],
        );
        track.source = TrackSource::DirectMedia;
        track.youtube_video_id = Some(video_id.to_string());
        track
    }

    /// A search hit.
    pub fn video_result(video_id: &str, title: &str) -> VideoResult {
        VideoResult {
            video_id: video_id.to_string(),
            title: title.to_string(),
            channel_title: "Mock Channel".to_string(),
            published_at: None,
            description: String::new(),
        }
    }

    /// A yt-dlp info document for a single video.
    pub fn video_info(video_id: &str, title: &str, channel: &str) -> Value {
        json!({
            "id": video_id,
            "title": title,
            "channel": channel,
            "channel_id": format!("UC_{}", channel.to_lowercase().replace(' ', "_")),
            "duration": 200,
            "upload_date": "20210102",
            "webpage_url": format!("https://www.youtube.com/watch?v={}", video_id),
            "tags": ["music"],
        })
    }

    /// A flat yt-dlp playlist document with `(video id, title)` entries.
    pub fn playlist_info(id: &str, title: &str, entries: &[(&str, &str)]) -> Value {
        let entries: Vec<Value> = entries
            .iter()
            .map(|(video_id, title)| {
                json!({
                    "id": video_id,
                    "title": title,
                    "channel": "Playlist Channel",
                    "url": format!("https://www.youtube.com/watch?v={}", video_id),
                })
            })
            .collect();
        json!({
            "_type": "playlist",
            "id": id,
            "title": title,
            "entries": entries,
        })
    }
}
