//! Track types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a track's canonical metadata came from.
///
/// Controls which fields a media probe may overwrite: catalog metadata is
/// authoritative, metadata derived from a media source is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrackSource {
    /// Imported from the streaming catalog.
    #[default]
    #[serde(rename = "spotify")]
    Catalog,
    /// Created from a media URL submitted directly.
    #[serde(rename = "youtube_direct")]
    DirectMedia,
}

impl TrackSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackSource::Catalog => "spotify",
            TrackSource::DirectMedia => "youtube_direct",
        }
    }
}

/// Download state persisted on the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    #[default]
    NotDownloaded,
    DownloadPending,
    DownloadInProgress,
    Downloaded,
    DownloadFailed,
}

impl DownloadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadStatus::NotDownloaded => "not_downloaded",
            DownloadStatus::DownloadPending => "download_pending",
            DownloadStatus::DownloadInProgress => "download_in_progress",
            DownloadStatus::Downloaded => "downloaded",
            DownloadStatus::DownloadFailed => "download_failed",
        }
    }
}

impl std::fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catalog track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub explicit: Option<bool>,
    #[serde(default)]
    pub popularity: Option<u32>,
    #[serde(default)]
    pub track_number: Option<u32>,
    #[serde(default)]
    pub disc_number: Option<u32>,
    /// Link to the track on the catalog's site.
    #[serde(default)]
    pub external_url: Option<String>,

    #[serde(default)]
    pub youtube_video_id: Option<String>,
    #[serde(default)]
    pub youtube_url: Option<String>,
    #[serde(default)]
    pub youtube_channel: Option<String>,
    #[serde(default)]
    pub youtube_channel_id: Option<String>,
    #[serde(default)]
    pub youtube_description: Option<String>,
    #[serde(default)]
    pub youtube_tags: Option<Vec<String>>,
    #[serde(default)]
    pub playlist_name: Option<String>,

    #[serde(default)]
    pub source: TrackSource,
    #[serde(default)]
    pub download_status: DownloadStatus,
    #[serde(default)]
    pub last_download_error: Option<String>,
    /// Relative path (`downloads/<file>`) of the extracted audio.
    #[serde(default)]
    pub file_path: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Track {
    /// A fresh track with only the required fields set.
    pub fn new(id: impl Into<String>, name: impl Into<String>, artists: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            artists,
            album: None,
            release_date: None,
            duration_ms: None,
            explicit: None,
            popularity: None,
            track_number: None,
            disc_number: None,
            external_url: None,
            youtube_video_id: None,
            youtube_url: None,
            youtube_channel: None,
            youtube_channel_id: None,
            youtube_description: None,
            youtube_tags: None,
            playlist_name: None,
            source: TrackSource::default(),
            download_status: DownloadStatus::default(),
            last_download_error: None,
            file_path: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn first_artist(&self) -> Option<&str> {
        self.artists.first().map(String::as_str)
    }
}

/// Field-by-field update for [`TrackStore::upsert`](super::TrackStore::upsert).
///
/// `None` leaves the stored value untouched. A patch for an unknown id creates
/// the track, falling back to empty values for anything unset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackPatch {
    pub id: String,
    pub name: Option<String>,
    pub artists: Option<Vec<String>>,
    pub album: Option<String>,
    pub release_date: Option<String>,
    pub duration_ms: Option<u64>,
    pub explicit: Option<bool>,
    pub youtube_video_id: Option<String>,
    pub youtube_url: Option<String>,
    pub youtube_channel: Option<String>,
    pub youtube_channel_id: Option<String>,
    pub youtube_description: Option<String>,
    pub youtube_tags: Option<Vec<String>>,
    pub playlist_name: Option<String>,
    pub source: Option<TrackSource>,
    pub download_status: Option<DownloadStatus>,
}

impl TrackPatch {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Applies the patch on top of `track`, leaving timestamps alone.
    pub fn apply(self, track: &mut Track) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *slot = value;
            }
        }
        fn set_opt<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        set(&mut track.name, self.name);
        set(&mut track.artists, self.artists);
        set_opt(&mut track.album, self.album);
        set_opt(&mut track.release_date, self.release_date);
        set_opt(&mut track.duration_ms, self.duration_ms);
        set_opt(&mut track.explicit, self.explicit);
        set_opt(&mut track.youtube_video_id, self.youtube_video_id);
        set_opt(&mut track.youtube_url, self.youtube_url);
        set_opt(&mut track.youtube_channel, self.youtube_channel);
        set_opt(&mut track.youtube_channel_id, self.youtube_channel_id);
        set_opt(&mut track.youtube_description, self.youtube_description);
        set_opt(&mut track.youtube_tags, self.youtube_tags);
        set_opt(&mut track.playlist_name, self.playlist_name);
        set(&mut track.source, self.source);
        set(&mut track.download_status, self.download_status);
    }

    /// Builds a new track from the patch.
    pub fn into_track(self) -> Track {
        let mut track = Track::new(self.id.clone(), String::new(), Vec::new());
        self.apply(&mut track);
        track
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&DownloadStatus::DownloadInProgress).unwrap(),
            "\"download_in_progress\""
        );
        assert_eq!(
            serde_json::from_str::<DownloadStatus>("\"download_failed\"").unwrap(),
            DownloadStatus::DownloadFailed
        );
        assert_eq!(DownloadStatus::Downloaded.to_string(), "downloaded");
    }

    #[test]
    fn test_source_wire_names() {
        assert_eq!(
            serde_json::to_string(&TrackSource::DirectMedia).unwrap(),
            "\"youtube_direct\""
        );
        assert_eq!(
            serde_json::from_str::<TrackSource>("\"spotify\"").unwrap(),
            TrackSource::Catalog
        );
    }

    #[test]
    fn test_track_deserializes_with_missing_optionals() {
        let json = r#"{
            "id": "t1",
            "name": "Song",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        }"#;
        let track: Track = serde_json::from_str(json).unwrap();
        assert!(track.artists.is_empty());
        assert_eq!(track.source, TrackSource::Catalog);
        assert_eq!(track.download_status, DownloadStatus::NotDownloaded);
    }

    #[test]
    fn test_patch_keeps_unset_fields() {
        let mut track = Track::new("t1", "Song", vec!["Artist".into()]);
        track.album = Some("Album".into());

        let patch = TrackPatch {
            youtube_channel: Some("Channel".into()),
            ..TrackPatch::new("t1")
        };
        patch.apply(&mut track);

        assert_eq!(track.name, "Song");
        assert_eq!(track.album.as_deref(), Some("Album"));
        assert_eq!(track.youtube_channel.as_deref(), Some("Channel"));
    }

    #[test]
    fn test_patch_into_track() {
        let patch = TrackPatch {
            name: Some("Clip".into()),
            source: Some(TrackSource::DirectMedia),
            ..TrackPatch::new("youtube_abc")
        };
        let track = patch.into_track();
        assert_eq!(track.id, "youtube_abc");
        assert_eq!(track.name, "Clip");
        assert_eq!(track.source, TrackSource::DirectMedia);
        assert_eq!(track.download_status, DownloadStatus::NotDownloaded);
    }
}
