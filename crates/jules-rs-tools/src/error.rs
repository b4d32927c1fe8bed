//! Errors raised while decoding model tool calls.

use thiserror::Error;

/// Tool call decode failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolError {
    /// The model invoked a function that was never declared.
    #[error("unknown function: {0}")]
    UnknownFunction(String),
    /// Argument payload is not JSON or does not match the declared shape.
    #[error("malformed arguments: {0}")]
    MalformedArguments(String),
}
