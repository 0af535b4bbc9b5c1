//! Agentic resolution: a bounded tool-calling negotiation with a chat model.
//!
//! The model receives the track description and one search tool. It may call
//! the tool up to `max_attempts` times and must then answer with a JSON
//! verdict. The conversation is capped at `max_attempts + 3` model turns.
//! Every provider error is folded into a failed [`ResolutionResult`].

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use super::config::AiConfig;
use super::conversation::{ChatRequest, ToolCall, ToolSpec, Turn};
use super::llm::{ChatClient, LlmError};
use super::verdict::{extract_json_object, parse_verdict};
use super::{ResolutionFailure, ResolutionLog, ResolutionResult, Resolver};
use crate::metrics::RESOLUTIONS;
use crate::searcher::{SearchQuery, Searcher};
use crate::track::Track;

/// Name of the search tool offered to the model.
pub const SEARCH_TOOL_NAME: &str = "youtubeSearch";

/// Model turns allowed beyond the search attempts.
const TURN_SLACK: u32 = 3;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an assistant that maps Spotify tracks to the exact YouTube video that best represents the same song. \
You may call the youtubeSearch tool up to the configured limit to inspect results. \
Only return a success when you are confident the audio and artist match the Spotify metadata. \
If you only find lyric videos and have used all your search attempts, pick the best lyric video available. \
When you respond, output valid JSON with the following shape and nothing else: \
{ \"status\": \"success\" | \"failure\", \"videoId\": \"YouTube video id or null\", \
\"reason\": \"Why you chose the video or why matching failed.\", \
\"error\": \"null or a short machine friendly error message\" } \
If you cannot find a trustworthy match, respond with status \"failure\", videoId null, and a concise error summary.";

/// Resolver that negotiates with a chat model over a search tool.
pub struct AgenticResolver<C: ChatClient> {
    client: C,
    searcher: Arc<dyn Searcher>,
    max_attempts: u32,
    system_prompt: String,
    temperature: f32,
}

/// Ways the negotiation can end without a verdict.
enum Breakdown {
    Provider(LlmError),
    TurnBudget(u32),
}

impl<C: ChatClient> AgenticResolver<C> {
    pub fn new(client: C, searcher: Arc<dyn Searcher>, config: &AiConfig) -> Self {
        Self {
            client,
            searcher,
            max_attempts: config.effective_max_attempts(),
            system_prompt: config
                .custom_system_prompt()
                .unwrap_or(DEFAULT_SYSTEM_PROMPT)
                .to_string(),
            temperature: config.temperature,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn max_turns(&self) -> u32 {
        self.max_attempts + TURN_SLACK
    }

    async fn negotiate(
        &self,
        track: &Track,
        log: &ResolutionLog<'_>,
        attempts: &mut u32,
    ) -> Result<ResolutionResult, Breakdown> {
        let mut turns = vec![
            Turn::System(self.system_prompt.clone()),
            Turn::User(describe_track(track, self.max_attempts)),
        ];
        let tools = vec![search_tool_spec()];

        for turn in 1..=self.max_turns() {
            debug!(turn, model = self.client.model(), "Requesting model turn");
            let request = ChatRequest::new(turns.clone())
                .with_tools(tools.clone())
                .with_temperature(self.temperature);
            let reply = self.client.chat(request).await.map_err(Breakdown::Provider)?;

            if !reply.tool_calls.is_empty() {
                let calls = reply.tool_calls.clone();
                turns.push(reply.into_turn());
                for call in calls {
                    let observation = self.observe(&call, attempts, log).await;
                    turns.push(Turn::observation(call.id, &observation));
                }
                continue;
            }

            let text = reply.content.unwrap_or_default();
            return Ok(self.conclude(&text, *attempts, log));
        }

        Err(Breakdown::TurnBudget(self.max_turns()))
    }

    /// Executes one tool call and returns the observation sent back to the model.
    async fn observe(
        &self,
        call: &ToolCall,
        attempts: &mut u32,
        log: &ResolutionLog<'_>,
    ) -> Value {
        if call.name != SEARCH_TOOL_NAME {
            log(&format!("AI requested unknown tool \"{}\".", call.name));
            return json!({ "error": format!("Unknown tool {}", call.name) });
        }

        if *attempts >= self.max_attempts {
            log(&format!(
                "AI requested {} but limit ({}) already reached.",
                SEARCH_TOOL_NAME, self.max_attempts
            ));
            return json!({
                "attempt": *attempts,
                "error": format!("Search attempt limit ({}) reached", self.max_attempts),
            });
        }

        let query = parse_search_arguments(&call.arguments);
        if query.query.is_empty() {
            log("AI attempted youtubeSearch without a query string.");
            return json!({
                "attempt": *attempts + 1,
                "error": "youtubeSearch requires a non-empty query string",
                "results": [],
            });
        }

        *attempts += 1;
        let label = format!("Attempt {}/{}", attempts, self.max_attempts);
        log(&format!(
            "{}: {} for \"{}\"{}.",
            label,
            SEARCH_TOOL_NAME,
            query.query,
            query.describe_options()
        ));

        match self.searcher.search(&query).await {
            Ok(results) => {
                match results.first() {
                    Some(first) => log(&format!(
                        "{}: {} result(s), top \"{}\" ({}).",
                        label,
                        results.len(),
                        first.title,
                        first.video_id
                    )),
                    None => log(&format!("{}: no results returned.", label)),
                }
                json!({
                    "attempt": *attempts,
                    "query": query.query,
                    "results": results,
                    "error": null,
                })
            }
            Err(e) => {
                log(&format!("{} error: {}", label, e));
                json!({
                    "attempt": *attempts,
                    "query": query.query,
                    "results": [],
                    "error": e.to_string(),
                })
            }
        }
    }

    /// Turns the model's final text into a result.
    fn conclude(&self, text: &str, attempts: u32, log: &ResolutionLog<'_>) -> ResolutionResult {
        let Some(verdict) = parse_verdict(text) else {
            log("AI response could not be parsed as JSON.");
            return ResolutionResult::failure(
                ResolutionFailure::Unparseable,
                attempts,
                "unparseable response",
                Some("AI response could not be parsed as JSON".to_string()),
            );
        };

        let reason_note = if verdict.reason.is_empty() {
            String::new()
        } else {
            format!(": {}", verdict.reason)
        };

        match (verdict.success, verdict.video_id) {
            (true, Some(video_id)) => {
                log(&format!("AI selected video {}{}", video_id, reason_note));
                ResolutionResult::success(video_id, attempts, verdict.reason)
            }
            (true, None) => {
                log("AI returned status=success but no videoId.");
                let diagnostic = if verdict.reason.is_empty() {
                    "Missing video id in AI result".to_string()
                } else {
                    verdict.reason
                };
                ResolutionResult::failure(
                    ResolutionFailure::MissingVideoId,
                    attempts,
                    "missing video id",
                    Some(diagnostic),
                )
            }
            (false, _) => {
                log(&format!("AI failed to match track{}", reason_note));
                ResolutionResult::failure(
                    ResolutionFailure::Declined,
                    attempts,
                    verdict.reason,
                    verdict.error,
                )
            }
        }
    }
}

#[async_trait]
impl<C: ChatClient> Resolver for AgenticResolver<C> {
    fn name(&self) -> &str {
        "agentic"
    }

    async fn resolve(&self, track: &Track, log: &ResolutionLog<'_>) -> ResolutionResult {
        log(&format!(
            "AI resolver started (max {} {} calls).",
            self.max_attempts, SEARCH_TOOL_NAME
        ));

        let mut attempts = 0;
        let result = match self.negotiate(track, log, &mut attempts).await {
            Ok(result) => result,
            Err(Breakdown::Provider(e)) => {
                warn!(provider = self.client.provider(), "AI workflow error: {}", e);
                log(&format!("AI workflow error: {}", e));
                ResolutionResult::failure(
                    ResolutionFailure::Provider,
                    attempts,
                    "LLM workflow failed",
                    Some(e.to_string()),
                )
            }
            Err(Breakdown::TurnBudget(max_turns)) => {
                log(&format!("AI workflow exceeded {} turns.", max_turns));
                ResolutionResult::failure(
                    ResolutionFailure::TurnBudgetExceeded,
                    attempts,
                    "turn budget exceeded",
                    Some("AI workflow exceeded allowed number of turns".to_string()),
                )
            }
        };

        let label = match result.matched_video() {
            Some(_) => "success",
            None => "failure",
        };
        RESOLUTIONS.with_label_values(&["agentic", label]).inc();
        result
    }
}

/// Reads tool arguments leniently: a malformed filter never hides the query.
fn parse_search_arguments(arguments: &str) -> SearchQuery {
    let object = extract_json_object(arguments).unwrap_or_default();
    let query = object
        .get("query")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default()
        .to_string();

    let mut parsed: SearchQuery =
        serde_json::from_value(Value::Object(object)).unwrap_or_default();
    parsed.query = query;
    parsed
}

/// Opening user turn: instructions, the track as JSON, and the attempt budget.
pub fn describe_track(track: &Track, max_attempts: u32) -> String {
    let payload = json!({
        "title": track.name,
        "artists": track.artists,
        "album": track.album,
        "releaseDate": track.release_date,
        "durationMs": track.duration_ms,
        "explicit": track.explicit.unwrap_or(false),
        "popularity": track.popularity,
        "trackNumber": track.track_number,
        "discNumber": track.disc_number,
        "spotifyUrl": track.external_url,
    });
    let pretty = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string());

    [
        "Identify a single YouTube video that matches this Spotify track. Avoid lyric videos, live versions, covers, interviews, or uploads from unrelated channels unless explicitly requested:".to_string(),
        pretty,
        format!("You may call {} up to {} times.", SEARCH_TOOL_NAME, max_attempts),
    ]
    .join("\n")
}

/// JSON schema of the search tool.
pub fn search_tool_spec() -> ToolSpec {
    ToolSpec {
        name: SEARCH_TOOL_NAME.to_string(),
        description: "Search YouTube for potential matches. Provide precise queries and optional filters to steer the results.".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search string that should include artist names, song title, and any disambiguating context."
                },
                "maxResults": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": 10,
                    "description": "How many candidates to return (default comes from server config)."
                },
                "order": {
                    "type": "string",
                    "enum": ["date", "rating", "relevance", "title", "viewCount"],
                    "description": "Change ranking strategy when relevance fails."
                },
                "videoDuration": {
                    "type": "string",
                    "enum": ["any", "short", "medium", "long"],
                    "description": "Filter by video duration (YouTube buckets)."
                },
                "publishedAfter": {
                    "type": "string",
                    "description": "ISO8601 timestamp to avoid older uploads when looking for a new release."
                },
                "channelId": {
                    "type": "string",
                    "description": "Restrict results to a specific channel if needed."
                }
            },
            "required": ["query"]
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::searcher::{SearchOrder, VideoDuration};

    #[test]
    fn test_parse_search_arguments() {
        let query = parse_search_arguments(r#"{"query": " a b ", "order": "date", "videoDuration": "short"}"#);
        assert_eq!(query.query, "a b");
        assert_eq!(query.order, Some(SearchOrder::Date));
        assert_eq!(query.video_duration, Some(VideoDuration::Short));
    }

    #[test]
    fn test_parse_search_arguments_keeps_query_with_bad_filter() {
        let query = parse_search_arguments(r#"{"query": "a b", "order": "loudest"}"#);
        assert_eq!(query.query, "a b");
        assert!(query.order.is_none());
    }

    #[test]
    fn test_parse_search_arguments_garbage() {
        assert!(parse_search_arguments("not json").query.is_empty());
        assert!(parse_search_arguments("").query.is_empty());
    }

    #[test]
    fn test_describe_track() {
        let mut track = Track::new("t1", "One More Time", vec!["Daft Punk".into()]);
        track.album = Some("Discovery".into());
        track.duration_ms = Some(320_357);

        let text = describe_track(&track, 4);

        assert!(text.starts_with("Identify a single YouTube video"));
        assert!(text.contains("\"title\": \"One More Time\""));
        assert!(text.contains("\"album\": \"Discovery\""));
        assert!(text.contains("\"explicit\": false"));
        assert!(text.ends_with("You may call youtubeSearch up to 4 times."));
    }

    #[test]
    fn test_search_tool_spec() {
        let spec = search_tool_spec();
        assert_eq!(spec.name, "youtubeSearch");
        assert_eq!(spec.parameters["required"][0], "query");
        assert_eq!(spec.parameters["properties"]["maxResults"]["maximum"], 10);
    }
}
