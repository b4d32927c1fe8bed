//! Canned dialogue used to ground a history-less deployment.

use super::prompt::{annotation, scheduled_turn, wakeup_turn};
use chrono::{Local, TimeZone};
use jules_rs_memory::{LedgerError, MessageLedger};
use jules_rs_protocol::{Message, Role, Timestamp, ToolCall, format_timestamp};
use jules_rs_tools::encode_call;
use log::info;

/// Append the canned dialogue to `ledger` and persist it.
///
/// Returns the number of turns written.
pub fn seed_ledger(ledger: &mut MessageLedger, now: Timestamp) -> Result<usize, LedgerError> {
    let turns = seed_dialogue(now);
    let count = turns.len();
    for turn in turns {
        ledger.append(turn.role, turn.content, Some(turn.timestamp), turn.tool_calls);
    }
    ledger.persist()?;
    info!("seeded message ledger (messages={})", count);
    Ok(count)
}

/// One day of example turns, placed on the local day before `now`.
///
/// Includes one `schedule_message` call, the system acknowledgement that
/// follows it and the reminder turn it later produced. Nothing is registered
/// in the reminder store; the dialogue is history only.
pub fn seed_dialogue(now: Timestamp) -> Vec<Message> {
    let at = |hour: u32, minute: u32| yesterday_at(now, hour, minute);
    let reminder_time = format_timestamp(at(18, 0));
    let reminder_topic = "Reminder to call Sam about the weekend trip";
    let call = encode_call("call_seed_0001", reminder_time.clone(), reminder_topic);

    vec![
        turn(Role::System, wakeup_turn("9am"), at(9, 0), None),
        turn(
            Role::Assistant,
            "Good morning! How did you sleep? Before you open your laptop, how about a glass of \
water and ten minutes of stretching? Looking at your goals, finishing the first chapter of the \
Rust book would be a nice task for today. Does that sound doable?",
            at(9, 0),
            None,
        ),
        turn(
            Role::User,
            "Slept ok. I'll stretch, but I have meetings until 2 so the Rust book will have to wait \
until the afternoon.",
            at(9, 12),
            None,
        ),
        turn(
            Role::Assistant,
            "That works. Let's say 2:30 to 4:00 for chapter one, with a short walk before you start. \
Good luck with the meetings!",
            at(9, 13),
            None,
        ),
        turn(
            Role::User,
            "Can you remind me at 6 to call Sam about the weekend trip?",
            at(13, 5),
            None,
        ),
        turn(
            Role::Assistant,
            "Sure, I'll ping you at 6.",
            at(13, 5),
            Some(vec![call.clone()]),
        ),
        turn(
            Role::System,
            format!(
                "schedule_message succeeded (id={}). {}",
                call.id,
                annotation(&reminder_time, reminder_topic)
            ),
            at(13, 5),
            None,
        ),
        turn(
            Role::User,
            "Finished chapter one! Ownership is starting to click.",
            at(16, 10),
            None,
        ),
        turn(
            Role::Assistant,
            "Nice work! That's a big step. Take a proper break now, you earned it.",
            at(16, 11),
            None,
        ),
        turn(
            Role::System,
            scheduled_turn(&call.id, &reminder_time, reminder_topic),
            at(18, 0),
            None,
        ),
        turn(
            Role::Assistant,
            "Hey, it's 6! Time to call Sam about the weekend trip.",
            at(18, 0),
            None,
        ),
        turn(Role::User, "Done, we're going hiking on Saturday.", at(18, 40), None),
        turn(
            Role::Assistant,
            "Sounds great! Have a relaxing evening, and try to be in bed by 11 so tomorrow starts \
as well as today did.",
            at(18, 41),
            None,
        ),
    ]
}

fn turn(
    role: Role,
    content: impl Into<String>,
    timestamp: Timestamp,
    tool_calls: Option<Vec<ToolCall>>,
) -> Message {
    Message {
        role,
        content: content.into(),
        timestamp,
        tool_calls,
    }
}

/// Local wall-clock time on the day before `now`.
fn yesterday_at(now: Timestamp, hour: u32, minute: u32) -> Timestamp {
    Local
        .timestamp_opt(now, 0)
        .earliest()
        .and_then(|today| today.date_naive().pred_opt())
        .and_then(|day| day.and_hms_opt(hour, minute, 0))
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|dt| dt.timestamp())
        .unwrap_or(now - 86_400)
}
