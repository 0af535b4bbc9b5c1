//! SQLite-backed track store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::{DownloadStatus, StatusDetails, Track, TrackError, TrackPatch, TrackStore};

/// SQLite-backed track store.
///
/// Records are stored as JSON documents keyed by track id, with the bound
/// video id mirrored into its own indexed column.
pub struct SqliteTrackStore {
    conn: Mutex<Connection>,
}

impl SqliteTrackStore {
    /// Open (or create) the database at `path`.
    pub fn new(path: &Path) -> Result<Self, TrackError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| TrackError::Database(e.to_string()))?;
        }
        let conn = Connection::open(path).map_err(db_err)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store for tests.
    pub fn in_memory() -> Result<Self, TrackError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Stores `track` as-is, replacing any record with the same id.
    pub fn insert(&self, track: &Track) -> Result<(), TrackError> {
        let conn = self.lock()?;
        Self::save(&conn, track)
    }

    fn initialize_schema(conn: &Connection) -> Result<(), TrackError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tracks (
                id TEXT PRIMARY KEY,
                video_id TEXT,
                record TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tracks_video_id ON tracks(video_id);
            "#,
        )
        .map_err(db_err)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, TrackError> {
        self.conn
            .lock()
            .map_err(|_| TrackError::Database("track store lock poisoned".to_string()))
    }

    fn load(conn: &Connection, id: &str) -> Result<Option<Track>, TrackError> {
        let record: Option<String> = conn
            .query_row(
                "SELECT record FROM tracks WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)?;

        record.map(|json| decode(id, &json)).transpose()
    }

    fn save(conn: &Connection, track: &Track) -> Result<(), TrackError> {
        let json = serde_json::to_string(track).map_err(|e| TrackError::Corrupt {
            id: track.id.clone(),
            reason: e.to_string(),
        })?;
        conn.execute(
            r#"
            INSERT INTO tracks (id, video_id, record, updated_at) VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                video_id = excluded.video_id,
                record = excluded.record,
                updated_at = excluded.updated_at
            "#,
            params![
                track.id,
                track.youtube_video_id,
                json,
                track.updated_at.to_rfc3339()
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }
}

fn db_err(e: rusqlite::Error) -> TrackError {
    TrackError::Database(e.to_string())
}

fn decode(id: &str, json: &str) -> Result<Track, TrackError> {
    serde_json::from_str(json).map_err(|e| TrackError::Corrupt {
        id: id.to_string(),
        reason: e.to_string(),
    })
}

impl TrackStore for SqliteTrackStore {
    fn get(&self, id: &str) -> Result<Option<Track>, TrackError> {
        let conn = self.lock()?;
        Self::load(&conn, id)
    }

    fn find_by_video_id(&self, video_id: &str) -> Result<Option<Track>, TrackError> {
        let conn = self.lock()?;
        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT id, record FROM tracks WHERE video_id = ?1 ORDER BY updated_at ASC LIMIT 1",
                params![video_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(db_err)?;

        row.map(|(id, json)| decode(&id, &json)).transpose()
    }

    fn upsert(&self, patch: TrackPatch) -> Result<Track, TrackError> {
        let conn = self.lock()?;
        let track = match Self::load(&conn, &patch.id)? {
            Some(mut existing) => {
                patch.apply(&mut existing);
                existing.updated_at = Utc::now();
                existing
            }
            None => patch.into_track(),
        };
        Self::save(&conn, &track)?;
        Ok(track)
    }

    fn set_download_status(
        &self,
        id: &str,
        status: DownloadStatus,
        details: StatusDetails,
    ) -> Result<Track, TrackError> {
        let conn = self.lock()?;
        let mut track = Self::load(&conn, id)?.ok_or_else(|| TrackError::NotFound(id.to_string()))?;

        track.download_status = status;
        track.last_download_error = details.error;
        if details.file_path.is_some() {
            track.file_path = details.file_path;
        }
        track.updated_at = Utc::now();

        Self::save(&conn, &track)?;
        Ok(track)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::TrackSource;
    use tempfile::TempDir;

    fn store_with(track: Track) -> SqliteTrackStore {
        let store = SqliteTrackStore::in_memory().unwrap();
        store
            .upsert(TrackPatch {
                name: Some(track.name),
                artists: Some(track.artists),
                youtube_video_id: track.youtube_video_id,
                ..TrackPatch::new(track.id)
            })
            .unwrap();
        store
    }

    #[test]
    fn test_insert_replaces_whole_record() {
        let store = SqliteTrackStore::in_memory().unwrap();
        let mut track = Track::new("t1", "Song", vec!["Artist".into()]);
        track.album = Some("Album".into());
        store.insert(&track).unwrap();

        track.album = None;
        store.insert(&track).unwrap();
        assert!(store.get("t1").unwrap().unwrap().album.is_none());
    }

    #[test]
    fn test_get_missing_track() {
        let store = SqliteTrackStore::in_memory().unwrap();
        assert!(store.get("nope").unwrap().is_none());
    }

    #[test]
    fn test_upsert_creates_then_merges() {
        let store = SqliteTrackStore::in_memory().unwrap();

        let created = store
            .upsert(TrackPatch {
                name: Some("Song".into()),
                artists: Some(vec!["Artist".into()]),
                album: Some("Album".into()),
                ..TrackPatch::new("t1")
            })
            .unwrap();
        assert_eq!(created.download_status, DownloadStatus::NotDownloaded);

        let merged = store
            .upsert(TrackPatch {
                youtube_video_id: Some("vid".into()),
                ..TrackPatch::new("t1")
            })
            .unwrap();

        assert_eq!(merged.name, "Song");
        assert_eq!(merged.album.as_deref(), Some("Album"));
        assert_eq!(merged.youtube_video_id.as_deref(), Some("vid"));
        assert_eq!(merged.created_at, created.created_at);
        assert!(merged.updated_at >= created.updated_at);
    }

    #[test]
    fn test_set_download_status_error_and_path_rules() {
        let store = store_with(Track::new("t1", "Song", vec!["A".into()]));

        let done = store
            .set_download_status(
                "t1",
                DownloadStatus::Downloaded,
                StatusDetails::file_path("downloads/a.m4a"),
            )
            .unwrap();
        assert_eq!(done.file_path.as_deref(), Some("downloads/a.m4a"));

        let failed = store
            .set_download_status(
                "t1",
                DownloadStatus::DownloadFailed,
                StatusDetails::error("boom"),
            )
            .unwrap();
        assert_eq!(failed.last_download_error.as_deref(), Some("boom"));
        // Previous path survives a status change without a new one.
        assert_eq!(failed.file_path.as_deref(), Some("downloads/a.m4a"));

        let pending = store
            .set_download_status(
                "t1",
                DownloadStatus::DownloadPending,
                StatusDetails::default(),
            )
            .unwrap();
        assert!(pending.last_download_error.is_none());
    }

    #[test]
    fn test_set_download_status_missing_track() {
        let store = SqliteTrackStore::in_memory().unwrap();
        let err = store
            .set_download_status("ghost", DownloadStatus::Downloaded, StatusDetails::default())
            .unwrap_err();
        assert!(matches!(err, TrackError::NotFound(id) if id == "ghost"));
    }

    #[test]
    fn test_find_by_video_id() {
        let mut track = Track::new("t1", "Song", vec![]);
        track.youtube_video_id = Some("abc".into());
        let store = store_with(track);

        let found = store.find_by_video_id("abc").unwrap().unwrap();
        assert_eq!(found.id, "t1");
        assert!(store.find_by_video_id("zzz").unwrap().is_none());
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("tracks.db");

        {
            let store = SqliteTrackStore::new(&path).unwrap();
            store
                .upsert(TrackPatch {
                    name: Some("Clip".into()),
                    source: Some(TrackSource::DirectMedia),
                    ..TrackPatch::new("youtube_abc")
                })
                .unwrap();
        }

        let store = SqliteTrackStore::new(&path).unwrap();
        let track = store.get("youtube_abc").unwrap().unwrap();
        assert_eq!(track.source, TrackSource::DirectMedia);
    }
}
