use serde::{Deserialize, Serialize};

/// YouTube Data API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct YoutubeConfig {
    /// API key. Empty disables search.
    #[serde(default)]
    pub api_key: String,
    /// Results requested when a query does not say.
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    /// Cap on playlist entries scheduled by one direct download.
    #[serde(default = "default_direct_download_max_items")]
    pub direct_download_max_items: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Overridable for tests.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            max_results: default_max_results(),
            direct_download_max_items: default_direct_download_max_items(),
            timeout_secs: default_timeout_secs(),
            base_url: default_base_url(),
        }
    }
}

impl YoutubeConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

fn default_max_results() -> u32 {
    3
}

fn default_direct_download_max_items() -> usize {
    50
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_base_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}
