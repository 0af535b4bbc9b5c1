use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::media::MediaConfig;
use crate::orchestrator::OrchestratorConfig;
use crate::resolver::{AiConfig, LlmProvider};
use crate::searcher::YoutubeConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub youtube: YoutubeConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub download: OrchestratorConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    4000
}

/// Where the catalog database and downloaded audio live.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    /// Directory extracted audio is written to. Tracks only record
    /// `downloads/<file name>`, resolved against this directory when served.
    #[serde(default = "default_downloads_dir")]
    pub downloads_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            downloads_dir: default_downloads_dir(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/trackfetch.db")
}

fn default_downloads_dir() -> PathBuf {
    PathBuf::from("downloads")
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub youtube: SanitizedYoutubeConfig,
    pub ai: SanitizedAiConfig,
    pub media: MediaConfig,
    pub download: OrchestratorConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedYoutubeConfig {
    pub api_key_configured: bool,
    pub max_results: u32,
    pub direct_download_max_items: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAiConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub api_key_configured: bool,
    pub max_attempts: u32,
    pub custom_system_prompt: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            storage: config.storage.clone(),
            youtube: SanitizedYoutubeConfig {
                api_key_configured: config.youtube.is_configured(),
                max_results: config.youtube.max_results,
                direct_download_max_items: config.youtube.direct_download_max_items,
            },
            ai: SanitizedAiConfig {
                provider: config.ai.provider,
                model: config.ai.model.clone(),
                api_key_configured: config.ai.is_configured(),
                max_attempts: config.ai.max_attempts,
                custom_system_prompt: config.ai.custom_system_prompt().is_some(),
            },
            media: config.media.clone(),
            download: config.download.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000

[storage]
db_path = "/data/tracks.db"
downloads_dir = "/data/downloads"

[youtube]
api_key = "yt-key"
max_results = 5

[ai]
provider = "openai"
api_key = "sk-test"
model = "gpt-4o"
max_attempts = 4

[media]
ytdlp_path = "/usr/local/bin/yt-dlp"
audio_format = "mp3"

[download]
max_concurrent_jobs = 2
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.storage.downloads_dir, PathBuf::from("/data/downloads"));
        assert_eq!(config.youtube.max_results, 5);
        assert_eq!(config.ai.provider, LlmProvider::OpenAi);
        assert_eq!(config.ai.max_attempts, 4);
        assert_eq!(config.media.audio_format, "mp3");
        assert_eq!(config.download.max_concurrent_jobs, 2);
        assert_eq!(config.download.max_tracked_jobs, 200);
    }

    #[test]
    fn test_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.storage.db_path, PathBuf::from("data/trackfetch.db"));
        assert!(!config.youtube.is_configured());
        assert!(!config.ai.is_configured());
        assert_eq!(config.ai.max_attempts, 3);
    }

    #[test]
    fn test_sanitized_config_hides_secrets() {
        let mut config = Config::default();
        config.youtube.api_key = "secret-yt".to_string();
        config.ai.api_key = Some("secret-ai".to_string());

        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.youtube.api_key_configured);
        assert!(sanitized.ai.api_key_configured);
        assert!(!sanitized.ai.custom_system_prompt);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("secret-yt"));
        assert!(!json.contains("secret-ai"));
    }
}
