//! Conversation model for tool-calling chat.

use serde::{Deserialize, Serialize};

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned id, echoed back on the observation.
    pub id: String,
    pub name: String,
    /// Raw JSON argument string as produced by the model.
    pub arguments: String,
}

/// One message in the conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum Turn {
    System(String),
    User(String),
    /// Free-text reply from the model.
    AssistantText(String),
    /// The model asked for one or more tool invocations.
    ToolCalls(Vec<ToolCall>),
    /// Result of a tool invocation, serialized as JSON.
    ToolObservation { call_id: String, content: String },
}

impl Turn {
    pub fn observation(call_id: impl Into<String>, content: &serde_json::Value) -> Self {
        Turn::ToolObservation {
            call_id: call_id.into(),
            content: content.to_string(),
        }
    }
}

/// A callable tool offered to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object.
    pub parameters: serde_json::Value,
}

/// Request for the next model turn.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub turns: Vec<Turn>,
    pub tools: Vec<ToolSpec>,
    pub temperature: Option<f32>,
}

impl ChatRequest {
    pub fn new(turns: Vec<Turn>) -> Self {
        Self {
            turns,
            tools: Vec::new(),
            temperature: None,
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// The model's reply: either tool calls or text.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub usage: LlmUsage,
}

impl ChatReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
            usage: LlmUsage::default(),
        }
    }

    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            content: None,
            tool_calls: calls,
            usage: LlmUsage::default(),
        }
    }

    /// Converts the reply into the turn appended to the conversation.
    pub fn into_turn(self) -> Turn {
        if self.tool_calls.is_empty() {
            Turn::AssistantText(self.content.unwrap_or_default())
        } else {
            Turn::ToolCalls(self.tool_calls)
        }
    }
}
