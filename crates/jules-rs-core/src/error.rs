//! Error types for the core orchestrator crate.

use crate::channel::ChannelError;
use crate::llm::CompletionError;
use crate::reminders::ReminderError;
use jules_rs_memory::LedgerError;
use jules_rs_tools::ToolError;
use thiserror::Error;

/// Errors returned by orchestrator operations.
#[derive(Debug, Error)]
pub enum JulesCoreError {
    /// Message ledger load or persist failed.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
    /// Reminder admission or storage failed.
    #[error("reminder error: {0}")]
    Reminder(#[from] ReminderError),
    /// The model produced a tool call that does not decode.
    #[error("tool error: {0}")]
    Tool(#[from] ToolError),
    /// The completion endpoint failed.
    #[error("completion error: {0}")]
    Completion(#[from] CompletionError),
    /// Outbound delivery failed.
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
