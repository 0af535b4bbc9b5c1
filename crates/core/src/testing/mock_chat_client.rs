//! Scripted chat model for testing the agentic resolver.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::resolver::{ChatClient, ChatReply, ChatRequest, LlmError, ToolCall, Turn};

/// Chat client that replays a fixed script of replies.
///
/// Every request is recorded. When the script runs out, further requests
/// fail with [`LlmError::EmptyResponse`].
///
/// # Example
///
/// ```rust,ignore
/// let client = ScriptedChatClient::new()
///     .then_search("Daft Punk One More Time")
///     .then_text(r#"{"status":"success","videoId":"abc","reason":"official"}"#);
/// ```
#[derive(Clone, Default)]
pub struct ScriptedChatClient {
    script: Arc<Mutex<VecDeque<Result<ChatReply, LlmError>>>>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl ScriptedChatClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an arbitrary reply.
    pub fn then_reply(self, reply: ChatReply) -> Self {
        self.push(Ok(reply));
        self
    }

    /// Queue a plain text answer.
    pub fn then_text(self, text: &str) -> Self {
        self.then_reply(ChatReply::text(text))
    }

    /// Queue a single `youtubeSearch` call for `query`.
    pub fn then_search(self, query: &str) -> Self {
        let id = format!("call_{}", self.script_len() + 1);
        self.then_tool_call(&id, crate::resolver::SEARCH_TOOL_NAME, serde_json::json!({ "query": query }))
    }

    /// Queue a single tool call with JSON arguments.
    pub fn then_tool_call(self, id: &str, name: &str, arguments: serde_json::Value) -> Self {
        self.then_reply(ChatReply::tool_calls(vec![ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }]))
    }

    /// Queue a provider failure.
    pub fn then_error(self, error: LlmError) -> Self {
        self.push(Err(error));
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Tool observations sent back in the most recent request.
    pub fn last_observations(&self) -> Vec<serde_json::Value> {
        let requests = self.requests.lock().unwrap();
        let Some(last) = requests.last() else {
            return Vec::new();
        };
        last.turns
            .iter()
            .filter_map(|turn| match turn {
                Turn::ToolObservation { content, .. } => serde_json::from_str(content).ok(),
                _ => None,
            })
            .collect()
    }

    fn push(&self, reply: Result<ChatReply, LlmError>) {
        self.script.lock().unwrap().push_back(reply);
    }

    fn script_len(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatClient for ScriptedChatClient {
    fn provider(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatReply, LlmError> {
        self.requests.lock().unwrap().push(request);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyResponse))
    }
}
