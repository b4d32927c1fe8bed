//! Conversation orchestrator.
//!
//! Every turn-producing operation follows the same protocol: append the
//! triggering turn, build the request from the prompt, goals and context
//! window, then interpret the single assistant turn the model returns.

pub mod prompt;
pub mod seed;

use crate::channel::OutboundChannel;
use crate::error::JulesCoreError;
use crate::llm::{CompletionClient, CompletionResponse};
use crate::prompts::{GoalsSource, SystemPrompt};
use crate::reminders::ReminderLedger;
use jules_rs_config::JulesConfig;
use jules_rs_memory::MessageLedger;
use jules_rs_protocol::{Clock, Role, SystemClock, Timestamp, format_timestamp};
use jules_rs_tools::{ToolInvocation, decode_calls};
use log::{debug, info};
use std::sync::Arc;

/// Default number of recent turns sent to the model.
pub const DEFAULT_CONTEXT_WINDOW: usize = 20;
/// Default wake time announced by the wakeup turn.
pub const DEFAULT_WAKEUP_TIME: &str = "9am";

/// Cold-start seeding behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedPolicy {
    /// Never seed.
    Disabled,
    /// Seed only when the ledger is empty.
    IfEmpty,
    /// Reset the ledger, then seed.
    ForceReset,
}

impl SeedPolicy {
    /// `IfEmpty` when enabled, otherwise `Disabled`.
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            SeedPolicy::IfEmpty
        } else {
            SeedPolicy::Disabled
        }
    }
}

/// Builder for an `Orchestrator`.
pub struct OrchestratorBuilder {
    ledger: MessageLedger,
    reminders: ReminderLedger,
    llm: Arc<dyn CompletionClient>,
    clock: Arc<dyn Clock>,
    system_prompt: SystemPrompt,
    goals: GoalsSource,
    context_window: usize,
    wakeup_time: String,
    seed: SeedPolicy,
}

impl OrchestratorBuilder {
    /// Time source for prefill stamps and seeding.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn system_prompt(mut self, system_prompt: SystemPrompt) -> Self {
        self.system_prompt = system_prompt;
        self
    }

    pub fn goals(mut self, goals: GoalsSource) -> Self {
        self.goals = goals;
        self
    }

    /// Number of most recent turns sent to the model; at least one.
    pub fn context_window(mut self, context_window: usize) -> Self {
        self.context_window = context_window.max(1);
        self
    }

    pub fn wakeup_time(mut self, wakeup_time: impl Into<String>) -> Self {
        self.wakeup_time = wakeup_time.into();
        self
    }

    pub fn seed(mut self, seed: SeedPolicy) -> Self {
        self.seed = seed;
        self
    }

    /// Finish construction, applying the seed policy.
    pub fn build(self) -> Result<Orchestrator, JulesCoreError> {
        let mut orchestrator = Orchestrator {
            ledger: self.ledger,
            reminders: self.reminders,
            llm: self.llm,
            clock: self.clock,
            system_prompt: self.system_prompt,
            goals: self.goals,
            context_window: self.context_window,
            wakeup_time: self.wakeup_time,
        };
        match self.seed {
            SeedPolicy::Disabled => {}
            SeedPolicy::IfEmpty => {
                if orchestrator.ledger.is_empty() {
                    orchestrator.seed()?;
                } else {
                    debug!(
                        "ledger already populated; skipping seed (messages={})",
                        orchestrator.ledger.len()
                    );
                }
            }
            SeedPolicy::ForceReset => orchestrator.reset(true)?,
        }
        Ok(orchestrator)
    }
}

/// Owns both ledgers and drives every conversation turn.
pub struct Orchestrator {
    ledger: MessageLedger,
    reminders: ReminderLedger,
    llm: Arc<dyn CompletionClient>,
    clock: Arc<dyn Clock>,
    system_prompt: SystemPrompt,
    goals: GoalsSource,
    context_window: usize,
    wakeup_time: String,
}

impl Orchestrator {
    /// Start building an orchestrator around already opened ledgers.
    pub fn builder(
        ledger: MessageLedger,
        reminders: ReminderLedger,
        llm: Arc<dyn CompletionClient>,
    ) -> OrchestratorBuilder {
        OrchestratorBuilder {
            ledger,
            reminders,
            llm,
            clock: Arc::new(SystemClock),
            system_prompt: SystemPrompt::new(String::new()),
            goals: GoalsSource::Inline(String::new()),
            context_window: DEFAULT_CONTEXT_WINDOW,
            wakeup_time: DEFAULT_WAKEUP_TIME.to_string(),
            seed: SeedPolicy::IfEmpty,
        }
    }

    /// Open ledgers and prompts at the locations named by `config`.
    pub fn from_config(
        config: &JulesConfig,
        llm: Arc<dyn CompletionClient>,
        clock: Arc<dyn Clock>,
        seed: SeedPolicy,
    ) -> Result<Self, JulesCoreError> {
        let ledger = MessageLedger::open(&config.ledger.path, clock.clone())?;
        let reminders = ReminderLedger::open(&config.reminders.path, clock.clone())?;
        let system_prompt = SystemPrompt::load(&config.prompts.system_prompt_path)?;
        Orchestrator::builder(ledger, reminders, llm)
            .clock(clock)
            .system_prompt(system_prompt)
            .goals(GoalsSource::File(config.prompts.goals_path.clone()))
            .context_window(config.ledger.context_window)
            .wakeup_time(config.wakeup.time.clone())
            .seed(seed)
            .build()
    }

    pub fn ledger(&self) -> &MessageLedger {
        &self.ledger
    }

    pub fn reminders(&self) -> &ReminderLedger {
        &self.reminders
    }

    /// Answer a user turn. `timestamp` is the sender's clock, if known.
    pub async fn handle_user_message(
        &mut self,
        text: &str,
        timestamp: Option<Timestamp>,
    ) -> Result<String, JulesCoreError> {
        self.run_turn(Role::User, text.to_string(), timestamp).await
    }

    /// Produce the daily proactive greeting.
    pub async fn emit_wakeup(&mut self) -> Result<String, JulesCoreError> {
        let trigger = prompt::wakeup_turn(&self.wakeup_time);
        self.run_turn(Role::System, trigger, None).await
    }

    /// Produce the message for a reminder that has come due.
    ///
    /// The caller marks the reminder sent once the reply is delivered.
    pub async fn emit_scheduled(
        &mut self,
        call_id: &str,
        fire_time: Timestamp,
        topic: &str,
    ) -> Result<String, JulesCoreError> {
        let trigger = prompt::scheduled_turn(call_id, &format_timestamp(fire_time), topic);
        self.run_turn(Role::System, trigger, None).await
    }

    /// Deliver every due reminder through `channel`, oldest first.
    ///
    /// Returns the number delivered. A failure stops the sweep; reminders
    /// delivered before it stay marked sent.
    pub async fn deliver_due(
        &mut self,
        channel: &dyn OutboundChannel,
    ) -> Result<usize, JulesCoreError> {
        let due = self.reminders.due()?;
        if due.is_empty() {
            debug!("no reminders due");
            return Ok(0);
        }
        for reminder in &due {
            let reply = self
                .emit_scheduled(&reminder.call_id, reminder.fire_time, &reminder.topic)
                .await?;
            channel.send(&reply).await?;
            self.reminders.mark_sent(reminder.row_id)?;
        }
        info!("reminder sweep complete (delivered={})", due.len());
        Ok(due.len())
    }

    /// Empty the message ledger, optionally reseeding it.
    pub fn reset(&mut self, reseed: bool) -> Result<(), JulesCoreError> {
        self.ledger.reset()?;
        if reseed {
            self.seed()?;
        }
        Ok(())
    }

    /// Release the reminder store handle.
    pub fn close(self) -> Result<(), JulesCoreError> {
        self.reminders.close()?;
        Ok(())
    }

    fn seed(&mut self) -> Result<(), JulesCoreError> {
        seed::seed_ledger(&mut self.ledger, self.clock.now())?;
        Ok(())
    }

    async fn run_turn(
        &mut self,
        role: Role,
        trigger: String,
        timestamp: Option<Timestamp>,
    ) -> Result<String, JulesCoreError> {
        self.ledger.append(role, trigger, timestamp, None);
        self.ledger.persist()?;

        let goals = self.goals.read()?;
        let window = self.ledger.windowed_view(self.context_window, true);
        let request = prompt::build_request(
            self.system_prompt.as_str(),
            &goals,
            &window,
            self.clock.now(),
        );
        debug!(
            "built completion request (trigger={}, window={}, turns={})",
            role,
            window.len(),
            request.messages.len()
        );

        let response = self.llm.complete(&request).await?;
        self.interpret(response)
    }

    fn interpret(&mut self, response: CompletionResponse) -> Result<String, JulesCoreError> {
        if response.tool_calls.is_empty() {
            self.ledger
                .append(Role::Assistant, response.content.clone(), None, None);
            self.ledger.persist()?;
            info!(
                "turn complete (reply_len={}, tool_calls=0)",
                response.content.len()
            );
            return Ok(response.content);
        }

        // Decode and admit every call before any of them is stored.
        let requests: Vec<_> = decode_calls(&response.tool_calls)?
            .into_iter()
            .map(|invocation| match invocation {
                ToolInvocation::ScheduleMessage(request) => request,
            })
            .collect();
        let batch: Vec<_> = requests
            .iter()
            .map(|r| (r.call_id.as_str(), r.when.as_str(), r.topic.as_str()))
            .collect();
        self.reminders.register_all(&batch)?;

        let mut reply = response.content.clone();
        for request in &requests {
            if !reply.is_empty() {
                reply.push(' ');
            }
            reply.push_str(&prompt::annotation(request.when.trim(), &request.topic));
        }

        let call_count = response.tool_calls.len();
        self.ledger.append(
            Role::Assistant,
            response.content,
            None,
            Some(response.tool_calls),
        );
        self.ledger.persist()?;
        info!(
            "turn complete (reply_len={}, tool_calls={})",
            reply.len(),
            call_count
        );
        Ok(reply)
    }
}
