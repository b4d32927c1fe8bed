//! Declarative description of the callable tool.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Name of the only function the model may call.
pub const SCHEDULE_MESSAGE: &str = "schedule_message";

/// Tool metadata presented to the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolSpec {
    /// Function name.
    pub name: String,
    /// Human-readable description shown to the model.
    pub description: String,
    /// JSON schema for the argument object.
    pub parameters: Value,
}

impl ToolSpec {
    /// Wrap the declaration in the chat-completions `tools` entry shape.
    pub fn as_function_tool(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

/// Declaration of `schedule_message{when, topic}`.
pub fn schedule_message_spec() -> ToolSpec {
    ToolSpec {
        name: SCHEDULE_MESSAGE.to_string(),
        description: "Schedule an assistant message to be sent in the future.".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "when": {
                    "type": "string",
                    "description": "The future date and time the message should be sent, e.g. 09/30/24 15:00:00"
                },
                "topic": {
                    "type": "string",
                    "description": "Brief summary of the intended topic of the future message, e.g. Reminder to water plants"
                }
            },
            "required": ["when", "topic"]
        }),
    }
}
