//! YouTube Data API v3 search backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{SearchError, SearchQuery, Searcher, VideoResult, YoutubeConfig};
use crate::metrics::SEARCH_REQUESTS;

/// Provider-side maximum for a single page of results.
const MAX_RESULTS_CAP: u32 = 10;

/// Searches YouTube videos through the Data API `search` endpoint.
pub struct YoutubeSearcher {
    client: Client,
    config: YoutubeConfig,
}

impl YoutubeSearcher {
    pub fn new(config: YoutubeConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self { client, config }
    }

    /// Number of results to request: the query's value, else the configured
    /// default, clamped to what the API accepts.
    fn result_limit(&self, query: &SearchQuery) -> u32 {
        query
            .max_results
            .filter(|n| *n > 0)
            .unwrap_or(self.config.max_results)
            .clamp(1, MAX_RESULTS_CAP)
    }

    fn build_params(&self, query: &SearchQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("key", self.config.api_key.clone()),
            ("part", "snippet".to_string()),
            ("type", "video".to_string()),
            ("q", query.query.trim().to_string()),
            ("maxResults", self.result_limit(query).to_string()),
        ];
        if let Some(order) = query.order {
            params.push(("order", order.as_str().to_string()));
        }
        if let Some(duration) = query.video_duration {
            params.push(("videoDuration", duration.as_str().to_string()));
        }
        if let Some(ref after) = query.published_after {
            params.push(("publishedAfter", after.clone()));
        }
        if let Some(ref channel) = query.channel_id {
            params.push(("channelId", channel.clone()));
        }
        params
    }

    async fn execute(&self, query: &SearchQuery) -> Result<Vec<VideoResult>, SearchError> {
        if query.query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        if !self.config.is_configured() {
            return Err(SearchError::NotConfigured(
                "YouTube API key missing. Set TRACKFETCH_YOUTUBE__API_KEY.".to_string(),
            ));
        }

        let url = format!("{}/search", self.config.base_url.trim_end_matches('/'));
        debug!(query = %query.query, "Searching YouTube");

        let response = self
            .client
            .get(&url)
            .query(&self.build_params(query))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Timeout
                } else if e.is_connect() {
                    SearchError::ConnectionFailed(e.to_string())
                } else {
                    SearchError::ApiError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .ok()
                .map(|envelope| envelope.error.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("YouTube search failed")
                        .to_string()
                });
            return Err(SearchError::ApiError(message));
        }

        let payload: SearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::ApiError(format!("Failed to parse response: {}", e)))?;

        Ok(payload
            .items
            .into_iter()
            .filter_map(SearchItem::into_result)
            .collect())
    }
}

#[async_trait]
impl Searcher for YoutubeSearcher {
    fn name(&self) -> &str {
        "youtube"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<VideoResult>, SearchError> {
        let result = self.execute(query).await;
        let label = if result.is_ok() { "success" } else { "error" };
        SEARCH_REQUESTS.with_label_values(&[label]).inc();
        result
    }
}

// YouTube API response types

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: ItemId,
    #[serde(default)]
    snippet: Snippet,
}

/// `id` is an object for search results but a bare string elsewhere.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ItemId {
    Resource {
        #[serde(rename = "videoId")]
        video_id: Option<String>,
    },
    Plain(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    channel_title: String,
    published_at: Option<String>,
    #[serde(default)]
    description: String,
}

impl SearchItem {
    fn into_result(self) -> Option<VideoResult> {
        let video_id = match self.id {
            ItemId::Resource { video_id } => video_id?,
            ItemId::Plain(id) => id,
        };
        Some(VideoResult {
            video_id,
            title: self.snippet.title,
            channel_title: self.snippet.channel_title,
            published_at: self.snippet.published_at,
            description: self.snippet.description,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}
