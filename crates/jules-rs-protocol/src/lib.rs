//! Wire types for Jules conversation turns, tool calls, and time handling.

mod error;
pub mod time;

pub use error::ProtocolError;
pub use time::{
    Clock, FixedClock, SystemClock, Timestamp, format_prefix, format_timestamp, parse_timestamp,
};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Speaker role for a conversation turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Static prompt or synthetic system event.
    System,
    /// Human side of the conversation.
    User,
    /// Model side of the conversation.
    Assistant,
    /// Tool result turn. Part of the schema, never produced by the core.
    Tool,
}

impl Role {
    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

impl FromStr for Role {
    type Err = ProtocolError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "tool" => Ok(Role::Tool),
            other => Err(ProtocolError::InvalidRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Function name and serialized arguments of a tool call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FunctionCall {
    /// Name of the invoked function.
    pub name: String,
    /// JSON-encoded argument object.
    #[serde(deserialize_with = "arguments_as_string")]
    pub arguments: String,
}

/// One tool invocation requested by the model, in chat-completions shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolCall {
    /// Identifier chosen by the model. Not guaranteed to be unique.
    pub id: String,
    /// Call kind; always `function` for this deployment.
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    /// Invoked function.
    pub function: FunctionCall,
}

impl ToolCall {
    /// Build a function tool call.
    pub fn new(
        id: impl Into<String>,
        function_name: impl Into<String>,
        argument_payload: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: function_kind(),
            function: FunctionCall {
                name: function_name.into(),
                arguments: argument_payload.into(),
            },
        }
    }

    /// Name of the invoked function.
    pub fn function_name(&self) -> &str {
        &self.function.name
    }

    /// Serialized argument object.
    pub fn argument_payload(&self) -> &str {
        &self.function.arguments
    }
}

/// A single turn of the durable transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    /// Text of the turn; empty when the turn is only a tool call.
    pub content: String,
    /// Epoch seconds when the turn happened.
    pub timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl Message {
    /// Convert the turn to its model-facing form, keeping content as stored.
    pub fn to_chat(&self) -> ChatMessage {
        ChatMessage {
            role: self.role,
            content: self.content.clone(),
            tool_calls: self.tool_calls.clone(),
        }
    }
}

/// A turn as sent to the completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl ChatMessage {
    /// Build a turn without tool calls.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

fn function_kind() -> String {
    "function".to_string()
}

/// Accept arguments either as a JSON string or as an inline JSON value.
fn arguments_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(raw) => Ok(raw),
        other => Ok(other.to_string()),
    }
}
