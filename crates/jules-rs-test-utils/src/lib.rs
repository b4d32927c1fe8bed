//! Test helpers shared across Jules crates.

pub mod channel;
pub mod llm;

pub use channel::{FailingChannel, RecordingChannel};
pub use jules_rs_protocol::FixedClock;
pub use llm::{FailingLLM, FixedLLM, RecordingLLM, ScriptedLLM, schedule_call};
