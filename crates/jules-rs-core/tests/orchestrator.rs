//! Orchestrator integration tests with stubbed completion clients.

use jules_rs_core::orchestrator::prompt::GOALS_FRAMING;
use jules_rs_core::{
    CompletionClient, CompletionError, CompletionResponse, GoalsSource, JulesCoreError,
    Orchestrator, ReminderError, ReminderLedger, SeedPolicy, SystemPrompt,
};
use jules_rs_memory::MessageLedger;
use jules_rs_protocol::{Clock, Role, ToolCall, format_prefix, format_timestamp};
use jules_rs_test_utils::{
    FailingChannel, FailingLLM, FixedClock, FixedLLM, RecordingChannel, RecordingLLM, ScriptedLLM,
    schedule_call,
};
use jules_rs_tools::ToolError;
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::{TempDir, tempdir};

const NOW: i64 = 1_727_700_000;
const TWO_HOURS: i64 = 2 * 60 * 60;

struct Harness {
    temp: TempDir,
    clock: Arc<FixedClock>,
}

impl Harness {
    fn new() -> Self {
        Self {
            temp: tempdir().expect("tempdir"),
            clock: Arc::new(FixedClock::new(NOW)),
        }
    }

    fn ledger_path(&self) -> PathBuf {
        self.temp.path().join("messages.json")
    }

    fn db_path(&self) -> PathBuf {
        self.temp.path().join("scheduled_messages.db")
    }

    fn ledger(&self) -> MessageLedger {
        MessageLedger::open(self.ledger_path(), self.clock.clone()).expect("ledger")
    }

    fn reminders(&self) -> ReminderLedger {
        ReminderLedger::open(self.db_path(), self.clock.clone()).expect("reminders")
    }

    fn orchestrator(&self, llm: Arc<dyn CompletionClient>, seed: SeedPolicy) -> Orchestrator {
        Orchestrator::builder(self.ledger(), self.reminders(), llm)
            .clock(self.clock.clone())
            .system_prompt(SystemPrompt::new("You are Jules."))
            .goals(GoalsSource::Inline("- stretch daily".to_string()))
            .context_window(6)
            .seed(seed)
            .build()
            .expect("orchestrator")
    }

    fn reopened_roles(&self) -> Vec<Role> {
        self.ledger().messages().iter().map(|m| m.role).collect()
    }
}

fn write_file(path: &Path, contents: &str) {
    std::fs::write(path, contents).expect("write");
}

#[tokio::test]
async fn remind_me_in_two_hours_schedules_a_stretch_reminder() {
    let harness = Harness::new();
    let when = format_timestamp(NOW + TWO_HOURS);
    let llm = Arc::new(FixedLLM::with_tool_calls(
        "",
        vec![schedule_call("call_1", &when, "stretch")],
    ));
    let mut orchestrator = harness.orchestrator(llm, SeedPolicy::Disabled);

    let reply = orchestrator
        .handle_user_message("remind me in 2 hours to stretch", None)
        .await
        .expect("reply");

    assert!(reply.contains("stretch"));
    assert!(reply.contains(&when));
    let reminders = orchestrator.reminders();
    assert!(reminders.due_at(NOW).expect("due now").is_empty());
    let due = reminders.due_at(NOW + TWO_HOURS + 1).expect("due later");
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].topic, "stretch");
    assert_eq!(due[0].call_id, "call_1");
}

#[tokio::test]
async fn plain_reply_is_returned_verbatim_and_persisted() {
    let harness = Harness::new();
    let llm = Arc::new(FixedLLM::new("Morning! Water first."));
    let mut orchestrator = harness.orchestrator(llm, SeedPolicy::Disabled);

    let reply = orchestrator
        .handle_user_message("hi", Some(NOW - 5))
        .await
        .expect("reply");

    assert_eq!(reply, "Morning! Water first.");
    let reopened = harness.ledger();
    assert_eq!(reopened.len(), 2);
    assert_eq!(reopened.messages()[0].timestamp, NOW - 5);
    assert_eq!(reopened.messages()[1].role, Role::Assistant);
    assert_eq!(reopened.messages()[1].content, "Morning! Water first.");
    assert_eq!(reopened.messages()[1].timestamp, NOW);
}

/// Both reply paths persist. Confirm with the bot owner that the tool-call
/// path is meant to flush as well.
#[tokio::test]
async fn tool_call_reply_is_persisted_with_its_calls() {
    let harness = Harness::new();
    let call = schedule_call("call_1", &format_timestamp(NOW + 60), "tea");
    let llm = Arc::new(FixedLLM::with_tool_calls("On it.", vec![call.clone()]));
    let mut orchestrator = harness.orchestrator(llm, SeedPolicy::Disabled);

    orchestrator
        .handle_user_message("remind me about tea", None)
        .await
        .expect("reply");

    let reopened = harness.ledger();
    assert_eq!(reopened.len(), 2);
    let assistant = &reopened.messages()[1];
    assert_eq!(assistant.role, Role::Assistant);
    assert_eq!(assistant.content, "On it.");
    assert_eq!(assistant.tool_calls, Some(vec![call]));
}

#[tokio::test]
async fn annotations_follow_model_text_separated_by_spaces() {
    let harness = Harness::new();
    let first = format_timestamp(NOW + 60);
    let second = format_timestamp(NOW + 120);
    let llm = Arc::new(FixedLLM::with_tool_calls(
        "Sure.",
        vec![
            schedule_call("a", &first, "one"),
            schedule_call("b", &second, "two"),
        ],
    ));
    let mut orchestrator = harness.orchestrator(llm, SeedPolicy::Disabled);

    let reply = orchestrator
        .handle_user_message("two reminders please", None)
        .await
        .expect("reply");

    assert_eq!(
        reply,
        format!(
            "Sure. [Scheduled message for {first}: one] [Scheduled message for {second}: two]"
        )
    );
    assert_eq!(orchestrator.reminders().all().expect("all").len(), 2);
}

#[tokio::test]
async fn failed_model_call_keeps_only_the_trigger() {
    let harness = Harness::new();
    let mut orchestrator =
        harness.orchestrator(Arc::new(FailingLLM::new(502, "bad gateway")), SeedPolicy::Disabled);

    let err = orchestrator
        .handle_user_message("are you there?", None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        JulesCoreError::Completion(CompletionError::Status { status: 502, .. })
    ));
    assert_eq!(harness.reopened_roles(), vec![Role::User]);
}

#[tokio::test]
async fn unknown_function_aborts_without_registering_anything() {
    let harness = Harness::new();
    let llm = Arc::new(FixedLLM::with_tool_calls(
        "",
        vec![
            schedule_call("a", &format_timestamp(NOW + 60), "fine"),
            ToolCall::new("b", "order_pizza", "{}"),
        ],
    ));
    let mut orchestrator = harness.orchestrator(llm, SeedPolicy::Disabled);

    let err = orchestrator
        .handle_user_message("hungry", None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        JulesCoreError::Tool(ToolError::UnknownFunction(name)) if name == "order_pizza"
    ));
    assert!(orchestrator.reminders().all().expect("all").is_empty());
    assert_eq!(orchestrator.ledger().len(), 1);
    assert_eq!(harness.reopened_roles(), vec![Role::User]);
}

#[tokio::test]
async fn past_schedule_aborts_the_turn() {
    let harness = Harness::new();
    let llm = Arc::new(FixedLLM::with_tool_calls(
        "",
        vec![schedule_call("a", "12/31/99 00:00:00", "party")],
    ));
    let mut orchestrator = harness.orchestrator(llm, SeedPolicy::Disabled);

    let err = orchestrator
        .handle_user_message("remind me yesterday", None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        JulesCoreError::Reminder(ReminderError::PastSchedule { .. })
    ));
    assert_eq!(orchestrator.ledger().len(), 1);
}

#[tokio::test]
async fn valid_call_is_not_kept_when_a_later_call_is_in_the_past() {
    let harness = Harness::new();
    let llm = Arc::new(FixedLLM::with_tool_calls(
        "",
        vec![
            schedule_call("a", &format_timestamp(NOW + 60), "good"),
            schedule_call("b", "12/31/99 00:00:00", "past"),
        ],
    ));
    let mut orchestrator = harness.orchestrator(llm, SeedPolicy::Disabled);

    let err = orchestrator
        .handle_user_message("two reminders, one stale", None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        JulesCoreError::Reminder(ReminderError::PastSchedule { .. })
    ));
    assert!(orchestrator.reminders().all().expect("all").is_empty());
    assert!(orchestrator.reminders().due_at(NOW + 120).expect("due").is_empty());
    assert_eq!(harness.reopened_roles(), vec![Role::User]);
}

#[tokio::test]
async fn malformed_date_aborts_the_turn() {
    let harness = Harness::new();
    let llm = Arc::new(FixedLLM::with_tool_calls(
        "",
        vec![schedule_call("a", "tomorrow-ish", "nap")],
    ));
    let mut orchestrator = harness.orchestrator(llm, SeedPolicy::Disabled);

    let err = orchestrator
        .handle_user_message("later", None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        JulesCoreError::Reminder(ReminderError::MalformedDate(value)) if value == "tomorrow-ish"
    ));
}

#[tokio::test]
async fn request_holds_prompt_goals_window_and_prefill() {
    let harness = Harness::new();
    let (llm, requests) = RecordingLLM::new("ok");
    let mut orchestrator = harness.orchestrator(Arc::new(llm), SeedPolicy::Disabled);
    for i in 0..4 {
        orchestrator
            .handle_user_message(&format!("message {i}"), Some(NOW - 100 + i))
            .await
            .expect("reply");
    }
    harness.clock.set(NOW + 30);
    orchestrator
        .handle_user_message("last", None)
        .await
        .expect("reply");

    let requests = requests.lock();
    assert_eq!(requests.len(), 5);
    let last = &requests[4];
    assert_eq!(last.messages[0].role, Role::System);
    assert_eq!(last.messages[0].content, "You are Jules.");
    assert_eq!(last.messages[1].role, Role::User);
    assert_eq!(
        last.messages[1].content,
        format!("{GOALS_FRAMING}\n\n- stretch daily")
    );

    // Context window of six turns between the goals wrapper and the prefill.
    let window = &last.messages[2..last.messages.len() - 1];
    assert_eq!(window.len(), 6);
    assert_eq!(
        window.last().map(|m| m.content.clone()),
        Some(format!("{} last", format_prefix(NOW + 30)))
    );
    assert_eq!(window[0].content, format!("{} ok", format_prefix(NOW)));

    let prefill = last.messages.last().expect("prefill");
    assert_eq!(prefill.role, Role::Assistant);
    assert_eq!(prefill.content, format_prefix(NOW + 30));
    assert_eq!(last.tools.len(), 1);
}

#[tokio::test]
async fn goals_file_is_read_for_each_request() {
    let harness = Harness::new();
    let goals_path = harness.temp.path().join("GOALS.md");
    write_file(&goals_path, "- first goal");
    let (llm, requests) = RecordingLLM::new("ok");
    let mut orchestrator =
        Orchestrator::builder(harness.ledger(), harness.reminders(), Arc::new(llm))
            .clock(harness.clock.clone())
            .goals(GoalsSource::File(goals_path.clone()))
            .seed(SeedPolicy::Disabled)
            .build()
            .expect("orchestrator");

    orchestrator.handle_user_message("one", None).await.expect("one");
    write_file(&goals_path, "- second goal");
    orchestrator.handle_user_message("two", None).await.expect("two");

    let requests = requests.lock();
    assert!(requests[0].messages[1].content.ends_with("- first goal"));
    assert!(requests[1].messages[1].content.ends_with("- second goal"));
}

#[tokio::test]
async fn wakeup_appends_a_system_trigger_naming_the_wake_time() {
    let harness = Harness::new();
    let (llm, requests) = RecordingLLM::new("Good morning!");
    let mut orchestrator =
        Orchestrator::builder(harness.ledger(), harness.reminders(), Arc::new(llm))
            .clock(harness.clock.clone())
            .wakeup_time("7am")
            .seed(SeedPolicy::Disabled)
            .build()
            .expect("orchestrator");

    let reply = orchestrator.emit_wakeup().await.expect("wakeup");

    assert_eq!(reply, "Good morning!");
    let trigger = &orchestrator.ledger().messages()[0];
    assert_eq!(trigger.role, Role::System);
    assert!(trigger.content.starts_with("It's 7am."));
    assert_eq!(requests.lock().len(), 1);
}

#[tokio::test]
async fn cold_start_seeds_once() {
    let harness = Harness::new();
    let orchestrator = harness.orchestrator(Arc::new(FixedLLM::new("ok")), SeedPolicy::IfEmpty);
    let seeded = orchestrator.ledger().len();
    assert!(seeded > 0);
    assert!(
        orchestrator
            .ledger()
            .messages()
            .iter()
            .any(|m| m.tool_calls.is_some())
    );
    assert!(orchestrator.reminders().all().expect("all").is_empty());
    orchestrator.close().expect("close");

    // Warm start: existing history is left alone.
    let orchestrator = harness.orchestrator(Arc::new(FixedLLM::new("ok")), SeedPolicy::IfEmpty);
    assert_eq!(orchestrator.ledger().len(), seeded);
    assert_eq!(harness.ledger().len(), seeded);
}

#[tokio::test]
async fn forced_reset_replaces_history_with_the_seed() {
    let harness = Harness::new();
    let mut orchestrator =
        harness.orchestrator(Arc::new(FixedLLM::new("ok")), SeedPolicy::Disabled);
    orchestrator.handle_user_message("hello", None).await.expect("reply");
    orchestrator.close().expect("close");

    let orchestrator =
        harness.orchestrator(Arc::new(FixedLLM::new("ok")), SeedPolicy::ForceReset);
    assert!(
        orchestrator
            .ledger()
            .messages()
            .iter()
            .all(|m| m.content != "hello")
    );
    assert!(orchestrator.ledger().messages().iter().all(|m| m.timestamp < NOW));
}

#[tokio::test]
async fn disabled_seed_leaves_an_empty_ledger() {
    let harness = Harness::new();
    let orchestrator = harness.orchestrator(Arc::new(FixedLLM::new("ok")), SeedPolicy::Disabled);
    assert!(orchestrator.ledger().is_empty());
}

#[tokio::test]
async fn reset_without_reseed_empties_durable_history() {
    let harness = Harness::new();
    let mut orchestrator = harness.orchestrator(Arc::new(FixedLLM::new("ok")), SeedPolicy::IfEmpty);
    orchestrator.reset(false).expect("reset");
    assert!(orchestrator.ledger().is_empty());
    assert!(harness.ledger().is_empty());
}

#[tokio::test]
async fn sweep_delivers_due_reminders_in_fire_order_and_marks_them() {
    let harness = Harness::new();
    let reminders = harness.reminders();
    let late = reminders
        .register("late", &format_timestamp(NOW + 600), "second")
        .expect("late");
    let early = reminders
        .register("early", &format_timestamp(NOW + 300), "first")
        .expect("early");
    let future = reminders
        .register("future", &format_timestamp(NOW + 9_000), "not yet")
        .expect("future");
    let llm = ScriptedLLM::new([
        CompletionResponse::text("Time for the first thing."),
        CompletionResponse::text("And the second."),
    ]);
    let mut orchestrator = Orchestrator::builder(harness.ledger(), reminders, Arc::new(llm.clone()))
        .clock(harness.clock.clone())
        .seed(SeedPolicy::Disabled)
        .build()
        .expect("orchestrator");
    let channel = RecordingChannel::new();

    harness.clock.set(NOW + 1_000);
    let delivered = orchestrator.deliver_due(&channel).await.expect("sweep");

    assert_eq!(delivered, 2);
    assert_eq!(
        channel.sent(),
        vec!["Time for the first thing.", "And the second."]
    );
    let reminders = orchestrator.reminders();
    assert!(reminders.get(early).expect("get").expect("early").sent);
    assert!(reminders.get(late).expect("get").expect("late").sent);
    assert!(!reminders.get(future).expect("get").expect("future").sent);

    let triggers: Vec<_> = orchestrator
        .ledger()
        .messages()
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.clone())
        .collect();
    assert_eq!(triggers.len(), 2);
    assert!(triggers[0].contains("early") && triggers[0].ends_with("Topic: first"));
    assert!(triggers[1].contains("late") && triggers[1].ends_with("Topic: second"));

    assert_eq!(orchestrator.deliver_due(&channel).await.expect("again"), 0);
    assert_eq!(llm.remaining(), 0);
}

#[tokio::test]
async fn empty_sweep_never_calls_the_model() {
    let harness = Harness::new();
    let mut orchestrator =
        harness.orchestrator(Arc::new(FailingLLM::new(500, "unused")), SeedPolicy::Disabled);
    let channel = RecordingChannel::new();

    assert_eq!(orchestrator.deliver_due(&channel).await.expect("sweep"), 0);
    assert!(channel.sent().is_empty());
    assert!(orchestrator.ledger().is_empty());
}

#[tokio::test]
async fn failed_delivery_leaves_the_reminder_pending() {
    let harness = Harness::new();
    let reminders = harness.reminders();
    let row_id = reminders
        .register("c", &format_timestamp(NOW + 10), "water plants")
        .expect("register");
    let mut orchestrator =
        Orchestrator::builder(harness.ledger(), reminders, Arc::new(FixedLLM::new("Water time!")))
            .clock(harness.clock.clone())
            .seed(SeedPolicy::Disabled)
            .build()
            .expect("orchestrator");

    harness.clock.advance(60);
    let err = orchestrator
        .deliver_due(&FailingChannel::new("offline"))
        .await
        .unwrap_err();

    assert!(matches!(err, JulesCoreError::Channel(_)));
    let reminder = orchestrator.reminders().get(row_id).expect("get").expect("row");
    assert!(!reminder.sent);
    assert_eq!(orchestrator.reminders().due().expect("due").len(), 1);
    assert_eq!(harness.clock.now(), NOW + 60);
}
