//! Configuration for the media tool.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// yt-dlp configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to the yt-dlp binary.
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: PathBuf,

    /// Audio format passed to `--audio-format` and used as file extension.
    #[serde(default = "default_audio_format")]
    pub audio_format: String,

    /// Kill a yt-dlp run after this many seconds. Unset means no limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_timeout_secs: Option<u64>,
}

fn default_ytdlp_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_audio_format() -> String {
    "m4a".to_string()
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: default_ytdlp_path(),
            audio_format: default_audio_format(),
            process_timeout_secs: None,
        }
    }
}
