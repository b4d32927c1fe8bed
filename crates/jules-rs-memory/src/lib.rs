//! Durable, append-only conversation transcript for Jules.

pub mod error;
pub mod ledger;

/// Ledger error type.
pub use error::LedgerError;
/// File-backed message ledger.
pub use ledger::MessageLedger;
