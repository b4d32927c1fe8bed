//! Request assembly and the fixed texts of synthetic turns.

use crate::llm::CompletionRequest;
use jules_rs_protocol::{ChatMessage, Message, Timestamp, format_prefix};
use jules_rs_tools::schedule_message_spec;

/// Sentence placed in front of the goals document.
pub const GOALS_FRAMING: &str = "Here is my goals document. It is a live document that I keep \
editing as my plans change, so treat what follows as the current picture of what I am working \
towards:";

/// Assemble the ordered request for one turn.
///
/// Order: system prompt, goals wrapper, the formatted context window, then
/// an assistant prefill holding only the timestamp prefix for `now`.
pub fn build_request(
    system_prompt: &str,
    goals: &str,
    window: &[Message],
    now: Timestamp,
) -> CompletionRequest {
    let mut messages = Vec::with_capacity(window.len() + 3);
    messages.push(ChatMessage::system(system_prompt));
    messages.push(ChatMessage::user(goals_turn(goals)));
    messages.extend(window.iter().map(Message::to_chat));
    messages.push(ChatMessage::assistant(format_prefix(now)));
    CompletionRequest {
        messages,
        tools: vec![schedule_message_spec()],
    }
}

fn goals_turn(goals: &str) -> String {
    format!("{GOALS_FRAMING}\n\n{goals}")
}

/// Synthetic system turn for the daily greeting.
pub fn wakeup_turn(wake_time: &str) -> String {
    format!(
        "It's {wake_time}. Time for the user's morning wakeup message. I will encourage them to \
start the day in a healthy way and suggest a task from the goals document for them to work on \
today. We might have to negotiate a plan for the day."
    )
}

/// Synthetic system turn restating a reminder that has come due.
pub fn scheduled_turn(call_id: &str, when: &str, topic: &str) -> String {
    format!(
        "It's time for the message scheduled earlier with schedule_message (id={call_id}, \
when={when}). Topic: {topic}"
    )
}

/// Operator-visible marker appended to replies that scheduled something.
pub fn annotation(when: &str, topic: &str) -> String {
    format!("[Scheduled message for {when}: {topic}]")
}
