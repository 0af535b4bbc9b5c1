//! Deterministic resolution: one search, first hit wins.

use async_trait::async_trait;
use std::sync::Arc;

use super::{ResolutionFailure, ResolutionLog, ResolutionResult, Resolver};
use crate::metrics::RESOLUTIONS;
use crate::searcher::{SearchQuery, Searcher};
use crate::track::Track;

/// Builds `"<first artist> <track name>"`, trimmed. Either part may be empty.
pub fn build_track_query(track: &Track) -> String {
    let artist = track.first_artist().unwrap_or_default();
    format!("{} {}", artist, track.name).trim().to_string()
}

/// Resolver that takes the top result of a single search.
pub struct SimpleResolver {
    searcher: Arc<dyn Searcher>,
    /// Tell the job log that the AI strategy was skipped.
    fallback_notice: bool,
}

impl SimpleResolver {
    pub fn new(searcher: Arc<dyn Searcher>) -> Self {
        Self {
            searcher,
            fallback_notice: false,
        }
    }

    /// Resolver standing in for an unconfigured AI strategy.
    pub fn as_fallback(searcher: Arc<dyn Searcher>) -> Self {
        Self {
            searcher,
            fallback_notice: true,
        }
    }
}

#[async_trait]
impl Resolver for SimpleResolver {
    fn name(&self) -> &str {
        "simple"
    }

    async fn resolve(&self, track: &Track, log: &ResolutionLog<'_>) -> ResolutionResult {
        if self.fallback_notice {
            log("AI configuration missing. Falling back to simple YouTube search.");
        }
        let result = self.search_first_hit(track, log).await;
        let label = match result.matched_video() {
            Some(_) => "success",
            None => "failure",
        };
        RESOLUTIONS.with_label_values(&["simple", label]).inc();
        result
    }
}

impl SimpleResolver {
    async fn search_first_hit(&self, track: &Track, log: &ResolutionLog<'_>) -> ResolutionResult {
        let query = build_track_query(track);
        if query.is_empty() {
            return ResolutionResult::failure(
                ResolutionFailure::QueryUnavailable,
                0,
                "Cannot build YouTube query from track metadata",
                Some("Missing artist or track name".to_string()),
            );
        }

        log(&format!("Fallback simple YouTube search for \"{}\".", query));

        let (results, error) = match self.searcher.search(&SearchQuery::new(&query)).await {
            Ok(results) => (results, None),
            Err(e) => (Vec::new(), Some(e.to_string())),
        };

        match results.into_iter().next() {
            Some(first) => {
                log(&format!(
                    "Fallback search picked \"{}\" ({}).",
                    first.title, first.video_id
                ));
                ResolutionResult::success(
                    first.video_id,
                    1,
                    format!("Selected top YouTube hit for \"{}\"", query),
                )
            }
            None => {
                log(&format!(
                    "Fallback search found no results. Error: {}.",
                    error.as_deref().unwrap_or("none")
                ));
                let kind = if error.is_some() {
                    ResolutionFailure::Provider
                } else {
                    ResolutionFailure::NoResults
                };
                ResolutionResult::failure(
                    kind,
                    0,
                    format!("No YouTube results for \"{}\"", query),
                    Some(error.unwrap_or_else(|| "No YouTube results".to_string())),
                )
            }
        }
    }
}
