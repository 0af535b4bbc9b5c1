//! Chat client abstraction and the OpenAI-compatible implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::config::{AiConfig, LlmProvider};
use super::conversation::{ChatReply, ChatRequest, LlmUsage, ToolCall, Turn};
use crate::config::ConfigError;
use crate::metrics::LLM_TOKENS;

/// Error type for LLM operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("AI response did not include any choices")]
    EmptyResponse,
}

/// Trait for chat models that support tool calling.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Provider name (e.g., "openai", "ollama")
    fn provider(&self) -> &str;

    /// Model name (e.g., "gpt-4o-mini")
    fn model(&self) -> &str;

    /// Send the conversation and get the next assistant turn.
    async fn chat(&self, request: ChatRequest) -> Result<ChatReply, LlmError>;
}

/// Builds the chat client described by `config`.
///
/// Returns `Ok(None)` when no credential is configured, so callers can fall
/// back to the deterministic strategy.
pub fn create_chat_client(config: &AiConfig) -> Result<Option<OpenAiClient>, ConfigError> {
    if !config.is_configured() {
        return Ok(None);
    }

    let timeout = Duration::from_secs(config.timeout_secs);
    let key = config.api_key().map(str::to_string);

    let client = match config.provider {
        LlmProvider::OpenAi => OpenAiClient::new(key, &config.model, "openai"),
        LlmProvider::Ollama => OpenAiClient::new(key, &config.model, "ollama")
            .with_api_base("http://localhost:11434/v1"),
        LlmProvider::Custom => {
            let base = config.api_base.as_deref().ok_or_else(|| {
                ConfigError::MissingCredential(
                    "The custom AI provider needs an endpoint. Set TRACKFETCH_AI__API_BASE."
                        .to_string(),
                )
            })?;
            OpenAiClient::new(key, &config.model, "custom").with_api_base(base)
        }
        LlmProvider::Anthropic => {
            return Err(ConfigError::Unsupported(
                "AI provider \"anthropic\" does not support the search tool. Use openai, ollama or custom."
                    .to_string(),
            ))
        }
    };

    let client = match config.api_base.as_deref() {
        Some(base) => client.with_api_base(base),
        None => client,
    };

    Ok(Some(client.with_timeout(timeout)))
}

// ============================================================================
// OpenAI-compatible Implementation
// ============================================================================

/// Client for the OpenAI chat-completions API and compatible servers.
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    provider: String,
    api_base: String,
    timeout: Duration,
}

impl OpenAiClient {
    pub fn new(api_key: Option<String>, model: impl Into<String>, provider: impl Into<String>) -> Self {
        let timeout = Duration::from_secs(60);
        Self {
            client: build_http_client(timeout),
            api_key,
            model: model.into(),
            provider: provider.into(),
            api_base: "https://api.openai.com/v1".to_string(),
            timeout,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.client = build_http_client(timeout);
        self
    }

    fn build_request<'a>(&'a self, request: &'a ChatRequest) -> OpenAiRequest<'a> {
        OpenAiRequest {
            model: &self.model,
            messages: request.turns.iter().map(OpenAiMessage::from_turn).collect(),
            tools: request
                .tools
                .iter()
                .map(|tool| OpenAiTool {
                    kind: "function",
                    function: OpenAiFunction {
                        name: &tool.name,
                        description: &tool.description,
                        parameters: &tool.parameters,
                    },
                })
                .collect(),
            tool_choice: if request.tools.is_empty() {
                None
            } else {
                Some("auto")
            },
            temperature: request.temperature,
        }
    }
}

fn build_http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<OpenAiTool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage<'a> {
    role: &'static str,
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAiToolCallOut<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<&'a str>,
}

impl<'a> OpenAiMessage<'a> {
    fn from_turn(turn: &'a Turn) -> Self {
        let plain = |role: &'static str, content: &'a str| OpenAiMessage {
            role,
            content: Some(content),
            tool_calls: None,
            tool_call_id: None,
        };

        match turn {
            Turn::System(text) => plain("system", text.as_str()),
            Turn::User(text) => plain("user", text.as_str()),
            Turn::AssistantText(text) => plain("assistant", text.as_str()),
            Turn::ToolCalls(calls) => OpenAiMessage {
                role: "assistant",
                content: None,
                tool_calls: Some(
                    calls
                        .iter()
                        .map(|call| OpenAiToolCallOut {
                            id: &call.id,
                            kind: "function",
                            function: OpenAiFunctionCallOut {
                                name: &call.name,
                                arguments: &call.arguments,
                            },
                        })
                        .collect(),
                ),
                tool_call_id: None,
            },
            Turn::ToolObservation { call_id, content } => OpenAiMessage {
                role: "tool",
                content: Some(content.as_str()),
                tool_calls: None,
                tool_call_id: Some(call_id.as_str()),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct OpenAiTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: OpenAiFunction<'a>,
}

#[derive(Debug, Serialize)]
struct OpenAiFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a serde_json::Value,
}

#[derive(Debug, Serialize)]
struct OpenAiToolCallOut<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    function: OpenAiFunctionCallOut<'a>,
}

#[derive(Debug, Serialize)]
struct OpenAiFunctionCallOut<'a> {
    name: &'a str,
    arguments: &'a str,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<OpenAiToolCallIn>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiToolCallIn {
    id: String,
    function: OpenAiFunctionCallIn,
}

#[derive(Debug, Deserialize)]
struct OpenAiFunctionCallIn {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

impl OpenAiResponse {
    fn into_reply(self) -> Result<ChatReply, LlmError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse)?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCall {
                id: call.id,
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect();

        let usage = self
            .usage
            .map(|u| LlmUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(ChatReply {
            content: choice.message.content,
            tool_calls,
            usage,
        })
    }
}

#[async_trait]
impl ChatClient for OpenAiClient {
    fn provider(&self) -> &str {
        &self.provider
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatReply, LlmError> {
        let body = self.build_request(&request);

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .header("content-type", "application/json")
            .json(&body);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(self.timeout)
            } else {
                LlmError::Http(e.to_string())
            }
        })?;

        let status = response.status().as_u16();

        if status != 200 {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OpenAiError>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);
            return Err(LlmError::Api { status, message });
        }

        let parsed: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Json(e.to_string()))?;
        let reply = parsed.into_reply()?;

        LLM_TOKENS
            .with_label_values(&[&self.provider, "input"])
            .inc_by(u64::from(reply.usage.input_tokens));
        LLM_TOKENS
            .with_label_values(&[&self.provider, "output"])
            .inc_by(u64::from(reply.usage.output_tokens));

        Ok(reply)
    }
}
