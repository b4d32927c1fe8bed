//! Error types for message ledger operations.

use jules_rs_protocol::ProtocolError;

/// Errors returned by the message ledger.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Stored turn carried a value outside the protocol (e.g. an unknown role).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
