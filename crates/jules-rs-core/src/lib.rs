//! Core orchestration primitives for Jules.
//!
//! This crate owns the reminder ledger, the completion client boundary, the
//! outbound channel boundary and the conversation orchestrator that ties them
//! to the message ledger.

pub mod channel;
pub mod error;
pub mod llm;
pub mod orchestrator;
pub mod prompts;
pub mod reminders;

/// Outbound delivery boundary.
pub use channel::{ChannelError, OutboundChannel};
/// Orchestrator error type.
pub use error::JulesCoreError;
/// Completion client boundary and the OpenRouter implementation.
pub use llm::{
    CompletionClient, CompletionError, CompletionRequest, CompletionResponse, OpenRouterClient,
};
/// Orchestrator facade.
pub use orchestrator::{Orchestrator, OrchestratorBuilder, SeedPolicy};
/// Prompt sources.
pub use prompts::{GoalsSource, SystemPrompt};
/// Reminder storage.
pub use reminders::{Reminder, ReminderError, ReminderLedger};
