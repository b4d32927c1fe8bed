//! Error types shared by the wire model and the time codec.

use thiserror::Error;

/// Errors raised while interpreting protocol values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// Role string is not one of system, user, assistant or tool.
    #[error("invalid role: {0}")]
    InvalidRole(String),
    /// Timestamp string does not match the canonical `MM/DD/YY HH:MM:SS` form.
    #[error("malformed date: {0}")]
    MalformedDate(String),
}
