//! Video resolution engine.
//!
//! Maps a catalog [`Track`](crate::track::Track) to a concrete media video id.
//! Two strategies exist, selected by whether an AI credential is configured:
//!
//! - [`SimpleResolver`]: one search for `"<artist> <title>"`, first hit wins.
//! - [`AgenticResolver`]: a bounded tool-calling conversation with a chat
//!   model that searches repeatedly and returns a structured verdict.
//!
//! Resolvers never return errors; failures are reported as a
//! [`ResolutionResult`] with [`ResolutionStatus::Failure`].

mod agent;
mod config;
mod conversation;
mod llm;
mod simple;
mod traits;
mod types;
mod verdict;

pub use agent::{
    describe_track, search_tool_spec, AgenticResolver, DEFAULT_SYSTEM_PROMPT, SEARCH_TOOL_NAME,
};
pub use config::{AiConfig, LlmProvider};
pub use conversation::{ChatReply, ChatRequest, LlmUsage, ToolCall, ToolSpec, Turn};
pub use llm::{create_chat_client, ChatClient, LlmError, OpenAiClient};
pub use simple::{build_track_query, SimpleResolver};
pub use traits::{ResolutionLog, Resolver};
pub use types::{ResolutionFailure, ResolutionResult, ResolutionStatus};
pub use verdict::{extract_json_object, parse_verdict, Verdict};

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::ConfigError;
use crate::searcher::Searcher;

/// Builds the resolver for `config`.
///
/// Falls back to [`SimpleResolver`] when no AI credential is configured. An
/// unsupported provider is a configuration error.
pub fn build_resolver(
    config: &AiConfig,
    searcher: Arc<dyn Searcher>,
) -> Result<Arc<dyn Resolver>, ConfigError> {
    match create_chat_client(config)? {
        Some(client) => {
            info!(
                provider = client.provider(),
                model = client.model(),
                max_attempts = config.effective_max_attempts(),
                "Using agentic video resolution"
            );
            Ok(Arc::new(AgenticResolver::new(client, searcher, config)))
        }
        None => {
            warn!("AI configuration missing. Falling back to simple search.");
            Ok(Arc::new(SimpleResolver::as_fallback(searcher)))
        }
    }
}
