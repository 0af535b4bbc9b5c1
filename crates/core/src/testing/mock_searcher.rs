//! Mock searcher for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use crate::searcher::{SearchError, SearchQuery, Searcher, VideoResult};

/// A recorded search for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedSearch {
    /// The query that was searched.
    pub query: SearchQuery,
    /// When the search was made.
    pub timestamp: Instant,
}

/// A query handler that produces results dynamically based on the query.
type QueryHandler = Box<dyn Fn(&SearchQuery) -> Option<Vec<VideoResult>> + Send + Sync>;

/// Mock implementation of the Searcher trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable search results
/// - Track search queries for assertions
/// - Simulate failures
///
/// # Example
///
/// ```rust,ignore
/// use trackfetch_core::testing::{fixtures, MockSearcher};
///
/// let searcher = MockSearcher::new();
/// searcher.set_results(vec![fixtures::video_result("abc", "Song (Official Audio)")]).await;
///
/// let hits = searcher.search(&SearchQuery::new("artist song")).await?;
/// assert_eq!(hits.len(), 1);
///
/// let searches = searcher.recorded_searches().await;
/// assert_eq!(searches[0].query.query, "artist song");
/// ```
pub struct MockSearcher {
    /// Configured results to return.
    results: Arc<RwLock<Vec<VideoResult>>>,
    /// Recorded search queries.
    searches: Arc<RwLock<Vec<RecordedSearch>>>,
    /// If set, the next search will fail with this error.
    next_error: Arc<RwLock<Option<SearchError>>>,
    /// Query handler for dynamic result generation.
    query_handler: Arc<RwLock<Option<QueryHandler>>>,
}

impl std::fmt::Debug for MockSearcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSearcher")
            .field("results", &"<results>")
            .field("searches", &"<searches>")
            .field("next_error", &"<next_error>")
            .field("query_handler", &"<handler>")
            .finish()
    }
}

impl Default for MockSearcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSearcher {
    /// Create a new mock searcher with empty results.
    pub fn new() -> Self {
        Self {
            results: Arc::new(RwLock::new(Vec::new())),
            searches: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            query_handler: Arc::new(RwLock::new(None)),
        }
    }

    /// Create a mock searcher with predefined results.
    pub fn with_results(results: Vec<VideoResult>) -> Self {
        let searcher = Self::new();
        // Use blocking approach for constructor
        *searcher.results.blocking_write() = results;
        searcher
    }

    /// Set the results to return for subsequent searches.
    pub async fn set_results(&self, results: Vec<VideoResult>) {
        *self.results.write().await = results;
    }

    /// Get recorded search queries.
    pub async fn recorded_searches(&self) -> Vec<RecordedSearch> {
        self.searches.read().await.clone()
    }

    /// Get the number of searches performed.
    pub async fn search_count(&self) -> usize {
        self.searches.read().await.len()
    }

    /// Configure the next search to fail with the given error.
    pub async fn set_next_error(&self, error: SearchError) {
        *self.next_error.write().await = Some(error);
    }

    /// Set a query handler that dynamically generates results based on the query.
    ///
    /// Returning `None` falls back to the configured results.
    pub async fn set_query_handler<F>(&self, handler: F)
    where
        F: Fn(&SearchQuery) -> Option<Vec<VideoResult>> + Send + Sync + 'static,
    {
        *self.query_handler.write().await = Some(Box::new(handler));
    }

    /// Take the next error if set.
    async fn take_error(&self) -> Option<SearchError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl Searcher for MockSearcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<VideoResult>, SearchError> {
        // Record the search
        self.searches.write().await.push(RecordedSearch {
            query: query.clone(),
            timestamp: Instant::now(),
        });

        // Check for injected error
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        let handled = match self.query_handler.read().await.as_ref() {
            Some(handler) => handler(query),
            None => None,
        };
        let results = match handled {
            Some(results) => results,
            None => self.results.read().await.clone(),
        };

        // Apply limit if specified
        Ok(match query.max_results {
            Some(limit) => results.into_iter().take(limit as usize).collect(),
            None => results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_basic_search() {
        let searcher = MockSearcher::new();
        searcher
            .set_results(vec![
                fixtures::video_result("abc", "Song (Official Audio)"),
                fixtures::video_result("def", "Song (Live)"),
            ])
            .await;

        let results = searcher.search(&SearchQuery::new("song")).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_limit_and_handler() {
        let searcher = MockSearcher::new();
        searcher
            .set_query_handler(|query| {
                (query.query == "special").then(|| vec![fixtures::video_result("sp", "Special")])
            })
            .await;
        searcher
            .set_results(vec![
                fixtures::video_result("a", "A"),
                fixtures::video_result("b", "B"),
            ])
            .await;

        let special = searcher.search(&SearchQuery::new("special")).await.unwrap();
        assert_eq!(special[0].video_id, "sp");

        let mut limited = SearchQuery::new("other");
        limited.max_results = Some(1);
        assert_eq!(searcher.search(&limited).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_recorded_searches_and_errors() {
        let searcher = MockSearcher::new();
        searcher.set_next_error(SearchError::Timeout).await;

        assert!(searcher.search(&SearchQuery::new("first")).await.is_err());
        assert!(searcher.search(&SearchQuery::new("second")).await.is_ok());

        let searches = searcher.recorded_searches().await;
        assert_eq!(searches.len(), 2);
        assert_eq!(searches[0].query.query, "first");
        assert_eq!(searches[1].query.query, "second");
    }
}
