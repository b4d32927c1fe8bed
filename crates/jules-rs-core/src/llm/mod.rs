//! Completion endpoint boundary.
//!
//! The orchestrator only sees `CompletionClient`; the concrete transport is
//! swapped for stubs in tests.

mod openrouter;

pub use openrouter::OpenRouterClient;

use async_trait::async_trait;
use jules_rs_protocol::{ChatMessage, ToolCall};
use jules_rs_tools::ToolSpec;
use thiserror::Error;

/// Ordered turns plus the tools the model may call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolSpec>,
}

/// The single candidate turn returned by the model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionResponse {
    /// Reply text; may be empty when the turn is only tool calls.
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
}

impl CompletionResponse {
    /// Plain text reply without tool calls.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// Reply carrying tool calls alongside optional text.
    pub fn with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: content.into(),
            tool_calls,
        }
    }
}

/// Errors returned by a completion client.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Transport failure before a response arrived.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// Endpoint answered with a non-success status.
    #[error("endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
    /// Endpoint reported an error inside a success response.
    #[error("endpoint error: {0}")]
    Api(String),
    /// Response body did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// The bearer token environment variable is unset.
    #[error("missing api key (env={0})")]
    MissingApiKey(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Language-model collaborator.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Produce exactly one assistant turn for the request.
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError>;
}
