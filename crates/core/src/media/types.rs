//! Media metadata types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

const YOUTUBE_WATCH_URL: &str = "https://www.youtube.com/watch?v=";

pub const UNKNOWN_TITLE: &str = "Unknown Track from YouTube";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const DEFAULT_SINGLE_ALBUM: &str = "YouTube Single";

/// Watch page URL for a video id.
pub fn watch_url(video_id: &str) -> String {
    format!("{}{}", YOUTUBE_WATCH_URL, video_id)
}

/// Converts yt-dlp's `YYYYMMDD` into `YYYY-MM-DD`. Anything else is dropped.
pub fn normalize_upload_date(value: &str) -> Option<String> {
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(format!("{}-{}-{}", &value[0..4], &value[4..6], &value[6..8]))
}

/// Values known from outside the info document, used as fallbacks.
#[derive(Debug, Clone, Default)]
pub struct MetadataContext {
    pub video_id: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub channel_name: Option<String>,
    pub playlist_title: Option<String>,
    pub description: Option<String>,
    pub upload_date: Option<String>,
}

/// Normalized metadata for one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    pub video_id: Option<String>,
    pub url: Option<String>,
    pub title: String,
    pub channel_name: String,
    pub album_name: String,
    pub duration_ms: Option<u64>,
    /// `YYYY-MM-DD`.
    pub upload_date: Option<String>,
    pub playlist_title: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub channel_id: Option<String>,
}

fn text<'a>(info: &'a Value, key: &str) -> Option<&'a str> {
    info.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn first_text(info: &Value, keys: &[&str], fallback: Option<&str>) -> Option<String> {
    keys.iter()
        .find_map(|key| text(info, key))
        .or(fallback)
        .map(str::to_string)
}

impl VideoMetadata {
    /// Placeholder metadata when no info document is available.
    pub fn unknown(ctx: &MetadataContext) -> Self {
        Self {
            video_id: None,
            url: ctx.url.clone(),
            title: UNKNOWN_TITLE.to_string(),
            channel_name: UNKNOWN_ARTIST.to_string(),
            album_name: ctx
                .playlist_title
                .clone()
                .unwrap_or_else(|| DEFAULT_SINGLE_ALBUM.to_string()),
            duration_ms: None,
            upload_date: None,
            playlist_title: ctx.playlist_title.clone(),
            description: None,
            tags: Vec::new(),
            channel_id: None,
        }
    }

    /// Normalizes a yt-dlp info document (a full video or a flat playlist entry).
    pub fn from_info(info: &Value, ctx: &MetadataContext) -> Self {
        let video_id = first_text(info, &["id", "video_id"], ctx.video_id.as_deref());
        let url = first_text(info, &["webpage_url", "url"], ctx.url.as_deref())
            .or_else(|| video_id.as_deref().map(watch_url));
        let playlist_title = ctx
            .playlist_title
            .clone()
            .or_else(|| first_text(info, &["playlist_title", "playlist"], None));

        let duration_ms = info
            .get("duration")
            .and_then(Value::as_f64)
            .filter(|d| *d > 0.0)
            .map(|secs| (secs * 1000.0).round() as u64)
            .or_else(|| info.get("duration_ms").and_then(Value::as_u64));

        let upload_date = first_text(
            info,
            &["upload_date", "release_date"],
            ctx.upload_date.as_deref(),
        )
        .and_then(|d| normalize_upload_date(&d));

        let tags = info
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            video_id,
            url,
            title: first_text(info, &["title", "fulltitle"], ctx.title.as_deref())
                .unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            channel_name: first_text(info, &["channel", "uploader"], ctx.channel_name.as_deref())
                .unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
            album_name: playlist_title
                .clone()
                .unwrap_or_else(|| DEFAULT_SINGLE_ALBUM.to_string()),
            duration_ms,
            upload_date,
            playlist_title,
            description: first_text(info, &["description"], ctx.description.as_deref()),
            tags,
            channel_id: first_text(info, &["channel_id", "uploader_id"], None),
        }
    }
}

/// A flat playlist listing.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistInfo {
    pub id: Option<String>,
    pub title: String,
    pub entries: Vec<Value>,
}

impl PlaylistInfo {
    /// Returns `Some` when `info` describes a playlist with an entry list.
    pub fn from_info(info: &Value) -> Option<Self> {
        if text(info, "_type") != Some("playlist") {
            return None;
        }
        let entries = info.get("entries")?.as_array()?.clone();
        Some(Self {
            id: text(info, "id").map(str::to_string),
            title: text(info, "title").unwrap_or("YouTube Playlist").to_string(),
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_upload_date() {
        assert_eq!(normalize_upload_date("20230415").as_deref(), Some("2023-04-15"));
        assert_eq!(normalize_upload_date("2023-04-15"), None);
        assert_eq!(normalize_upload_date("2023041"), None);
        assert_eq!(normalize_upload_date("2023x415"), None);
    }

    #[test]
    fn test_from_full_info() {
        let info = json!({
            "id": "abc123",
            "title": "Song (Official Video)",
            "channel": "Artist",
            "channel_id": "UC1",
            "duration": 212.4,
            "upload_date": "20200131",
            "description": "desc",
            "tags": ["pop", 3, "live"],
            "webpage_url": "https://www.youtube.com/watch?v=abc123"
        });
        let meta = VideoMetadata::from_info(&info, &MetadataContext::default());

        assert_eq!(meta.video_id.as_deref(), Some("abc123"));
        assert_eq!(meta.title, "Song (Official Video)");
        assert_eq!(meta.channel_name, "Artist");
        assert_eq!(meta.album_name, DEFAULT_SINGLE_ALBUM);
        assert_eq!(meta.duration_ms, Some(212_400));
        assert_eq!(meta.upload_date.as_deref(), Some("2020-01-31"));
        assert_eq!(meta.tags, vec!["pop", "live"]);
        assert_eq!(meta.channel_id.as_deref(), Some("UC1"));
    }

    #[test]
    fn test_fallbacks() {
        let info = json!({ "video_id": "xyz", "uploader": "Uploader" });
        let ctx = MetadataContext {
            playlist_title: Some("Mix".into()),
            ..Default::default()
        };
        let meta = VideoMetadata::from_info(&info, &ctx);

        assert_eq!(meta.url.as_deref(), Some("https://www.youtube.com/watch?v=xyz"));
        assert_eq!(meta.title, UNKNOWN_TITLE);
        assert_eq!(meta.channel_name, "Uploader");
        assert_eq!(meta.album_name, "Mix");
        assert!(meta.duration_ms.is_none());
    }

    #[test]
    fn test_unknown() {
        let meta = VideoMetadata::unknown(&MetadataContext::default());
        assert_eq!(meta.title, UNKNOWN_TITLE);
        assert_eq!(meta.channel_name, UNKNOWN_ARTIST);
        assert!(meta.video_id.is_none());
    }

    #[test]
    fn test_playlist_detection() {
        let playlist = json!({
            "_type": "playlist",
            "id": "PL1",
            "title": "Road Trip",
            "entries": [{"id": "a"}, {"id": "b"}]
        });
        let info = PlaylistInfo::from_info(&playlist).unwrap();
        assert_eq!(info.title, "Road Trip");
        assert_eq!(info.entries.len(), 2);

        assert!(PlaylistInfo::from_info(&json!({"id": "a"})).is_none());
    }
}
