//! Encode and decode `schedule_message` calls.
//!
//! Decoding is strict: the payload must be a JSON object with exactly the
//! two declared string fields.

use crate::error::ToolError;
use crate::schema::SCHEDULE_MESSAGE;
use jules_rs_protocol::ToolCall;
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScheduleArgs {
    when: String,
    topic: String,
}

/// A validated request to schedule a future message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRequest {
    /// Identifier the model gave the call.
    pub call_id: String,
    /// Fire time in the canonical timestamp format, not yet parsed.
    pub when: String,
    /// What the future message should be about.
    pub topic: String,
}

/// Every tool invocation the model may make.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolInvocation {
    ScheduleMessage(ScheduleRequest),
}

/// Build a `schedule_message` call record, e.g. for canned dialogue.
pub fn encode_call(
    call_id: impl Into<String>,
    when: impl Into<String>,
    topic: impl Into<String>,
) -> ToolCall {
    let args = ScheduleArgs {
        when: when.into(),
        topic: topic.into(),
    };
    // Two string fields always serialize.
    let payload = serde_json::to_string(&args).unwrap_or_default();
    ToolCall::new(call_id, SCHEDULE_MESSAGE, payload)
}

/// Validate one call record against the declared schema.
pub fn decode_call(call: &ToolCall) -> Result<ToolInvocation, ToolError> {
    if call.function_name() != SCHEDULE_MESSAGE {
        return Err(ToolError::UnknownFunction(call.function_name().to_string()));
    }
    let args: ScheduleArgs = serde_json::from_str(call.argument_payload())
        .map_err(|err| ToolError::MalformedArguments(err.to_string()))?;
    debug!(
        "decoded tool call (id={}, function={})",
        call.id,
        call.function_name()
    );
    Ok(ToolInvocation::ScheduleMessage(ScheduleRequest {
        call_id: call.id.clone(),
        when: args.when,
        topic: args.topic,
    }))
}

/// Decode every call, failing on the first invalid one.
pub fn decode_calls(calls: &[ToolCall]) -> Result<Vec<ToolInvocation>, ToolError> {
    calls.iter().map(decode_call).collect()
}
