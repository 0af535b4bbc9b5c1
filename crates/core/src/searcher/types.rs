//! Search types and the `Searcher` trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ranking applied by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchOrder {
    Date,
    Rating,
    Relevance,
    Title,
    ViewCount,
}

impl SearchOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchOrder::Date => "date",
            SearchOrder::Rating => "rating",
            SearchOrder::Relevance => "relevance",
            SearchOrder::Title => "title",
            SearchOrder::ViewCount => "viewCount",
        }
    }
}

/// YouTube duration buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoDuration {
    Any,
    Short,
    Medium,
    Long,
}

impl VideoDuration {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoDuration::Any => "any",
            VideoDuration::Short => "short",
            VideoDuration::Medium => "medium",
            VideoDuration::Long => "long",
        }
    }
}

/// A search request.
///
/// Deserializes from the arguments the language model passes to the search
/// tool, so field names follow that schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<SearchOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_duration: Option<VideoDuration>,
    /// RFC 3339 timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_after: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Human-readable summary of the optional filters, e.g.
    /// ` (options: order=date, duration=medium)`. Empty when none are set.
    pub fn describe_options(&self) -> String {
        let mut extras = Vec::new();
        if let Some(order) = self.order {
            extras.push(format!("order={}", order.as_str()));
        }
        if let Some(max) = self.max_results {
            extras.push(format!("maxResults={}", max));
        }
        if let Some(duration) = self.video_duration {
            extras.push(format!("duration={}", duration.as_str()));
        }
        if let Some(ref after) = self.published_after {
            extras.push(format!("publishedAfter={}", after));
        }
        if let Some(ref channel) = self.channel_id {
            extras.push(format!("channelId={}", channel));
        }

        if extras.is_empty() {
            String::new()
        } else {
            format!(" (options: {})", extras.join(", "))
        }
    }
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResult {
    pub video_id: String,
    pub title: String,
    pub channel_title: String,
    pub published_at: Option<String>,
    #[serde(default)]
    pub description: String,
}

/// Errors from search providers.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{0}")]
    NotConfigured(String),

    #[error("YouTube query is required")]
    EmptyQuery,

    #[error("YouTube API error: {0}")]
    ApiError(String),

    #[error("Search backend connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,
}

/// Trait for video search providers.
#[async_trait]
pub trait Searcher: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Run one search. Results are in provider ranking order.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<VideoResult>, SearchError>;
}
