//! Configuration schema for Jules.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root config for a Jules deployment.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct JulesConfig {
    #[serde(default, rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub reminders: RemindersConfig,
    #[serde(default)]
    pub prompts: PromptsConfig,
    #[serde(default)]
    pub wakeup: WakeupConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

impl JulesConfig {
    /// Rebase every relative file path onto `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        for path in [
            &mut self.ledger.path,
            &mut self.reminders.path,
            &mut self.prompts.system_prompt_path,
            &mut self.prompts.goals_path,
        ] {
            rebase(path, base);
        }
        for path in [&mut self.llm.request_log, &mut self.llm.response_log]
            .into_iter()
            .flatten()
        {
            rebase(path, base);
        }
    }
}

fn rebase(path: &mut PathBuf, base: &Path) {
    if path.is_relative() {
        *path = base.join(&*path);
    }
}

/// Completion endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the bearer token.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Append every request body to this file, one JSON document per line.
    #[serde(default)]
    pub request_log: Option<PathBuf>,
    /// Append every raw response body to this file.
    #[serde(default)]
    pub response_log: Option<PathBuf>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            request_log: None,
            response_log: None,
        }
    }
}

fn default_api_url() -> String {
    "https://openrouter.ai/api/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "google/gemini-flash-1.5-exp".to_string()
}

fn default_api_key_env() -> String {
    "LLM_API_KEY".to_string()
}

/// Message ledger settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    #[serde(default = "default_ledger_path")]
    pub path: PathBuf,
    /// Number of most recent turns sent to the model.
    #[serde(default = "default_context_window")]
    pub context_window: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: default_ledger_path(),
            context_window: default_context_window(),
        }
    }
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("messages.json")
}

fn default_context_window() -> usize {
    20
}

/// Reminder store settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RemindersConfig {
    /// SQLite database file.
    #[serde(default = "default_reminders_path")]
    pub path: PathBuf,
}

impl Default for RemindersConfig {
    fn default() -> Self {
        Self {
            path: default_reminders_path(),
        }
    }
}

fn default_reminders_path() -> PathBuf {
    PathBuf::from("scheduled_messages.db")
}

/// Prompt and goals document locations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PromptsConfig {
    #[serde(default = "default_system_prompt_path")]
    pub system_prompt_path: PathBuf,
    #[serde(default = "default_goals_path")]
    pub goals_path: PathBuf,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            system_prompt_path: default_system_prompt_path(),
            goals_path: default_goals_path(),
        }
    }
}

fn default_system_prompt_path() -> PathBuf {
    PathBuf::from("SYSTEM_PROMPT.txt")
}

fn default_goals_path() -> PathBuf {
    PathBuf::from("GOALS.md")
}

/// Daily wakeup settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WakeupConfig {
    /// Wake time as announced in the wakeup turn, e.g. `9am`.
    #[serde(default = "default_wakeup_time")]
    pub time: String,
}

impl Default for WakeupConfig {
    fn default() -> Self {
        Self {
            time: default_wakeup_time(),
        }
    }
}

fn default_wakeup_time() -> String {
    "9am".to_string()
}

/// Cold-start seeding policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SeedConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}
