//! Tool schema and call codec for the agent's single deferred action.

pub mod codec;
pub mod error;
pub mod schema;

/// Call encoding and decoding.
pub use codec::{ScheduleRequest, ToolInvocation, decode_call, decode_calls, encode_call};
/// Tool decode errors.
pub use error::ToolError;
/// Declared tool metadata.
pub use schema::{SCHEDULE_MESSAGE, ToolSpec, schedule_message_spec};
