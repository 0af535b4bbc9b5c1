//! AI resolution configuration.

use serde::{Deserialize, Serialize};

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    /// OpenAI chat completions.
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    /// Local Ollama instance through its OpenAI-compatible endpoint.
    Ollama,
    /// Custom HTTP endpoint (must be OpenAI-compatible).
    Custom,
    /// Anthropic Claude API. Accepted in config but rejected when a client is built.
    Anthropic,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "openai",
            LlmProvider::Ollama => "ollama",
            LlmProvider::Custom => "custom",
            LlmProvider::Anthropic => "anthropic",
        }
    }

    /// Ollama runs locally and needs no credential.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, LlmProvider::Ollama)
    }
}

/// Configuration for agentic video resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub provider: LlmProvider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    /// Custom API base URL (for proxies or self-hosted).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Search tool invocations allowed per resolution.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Replaces the built-in system prompt when non-blank.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            api_key: None,
            model: default_model(),
            api_base: None,
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            system_prompt: None,
            temperature: default_temperature(),
        }
    }
}

impl AiConfig {
    /// Whether the agentic strategy should be used.
    pub fn is_configured(&self) -> bool {
        !self.provider.requires_api_key() || self.api_key().is_some()
    }

    /// Non-blank API key.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Attempt cap, never below one.
    pub fn effective_max_attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Non-blank custom system prompt.
    pub fn custom_system_prompt(&self) -> Option<&str> {
        self.system_prompt
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    3
}

fn default_temperature() -> f32 {
    1.0
}
