//! File-backed message ledger.
//!
//! The ledger keeps the whole transcript in memory and rewrites the backing
//! JSON file on `persist`. Appends never touch disk; callers decide when a
//! turn is worth keeping.

use crate::error::LedgerError;
use jules_rs_protocol::{Clock, Message, Role, Timestamp, ToolCall, format_prefix};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// On-disk shape of a turn. Roles stay strings until validated so a
/// hand-edited file with a bad role reports `InvalidRole`.
#[derive(Debug, Serialize, Deserialize)]
struct StoredMessage {
    role: String,
    #[serde(default)]
    content: String,
    timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ToolCall>>,
}

impl TryFrom<StoredMessage> for Message {
    type Error = LedgerError;

    fn try_from(stored: StoredMessage) -> Result<Self, Self::Error> {
        Ok(Message {
            role: stored.role.parse::<Role>()?,
            content: stored.content,
            timestamp: stored.timestamp,
            tool_calls: stored.tool_calls,
        })
    }
}

impl From<&Message> for StoredMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
            timestamp: message.timestamp,
            tool_calls: message.tool_calls.clone(),
        }
    }
}

/// Ordered, append-only log of conversation turns.
pub struct MessageLedger {
    /// Backing JSON file.
    path: PathBuf,
    /// Turns in insertion order.
    messages: Vec<Message>,
    /// Time source for turns appended without a timestamp.
    clock: Arc<dyn Clock>,
}

impl MessageLedger {
    /// Open the ledger at `path`, loading any existing transcript.
    ///
    /// A missing or blank file yields an empty ledger.
    pub fn open(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        let messages = load_messages(&path)?;
        info!(
            "opened message ledger (path={}, messages={})",
            path.display(),
            messages.len()
        );
        Ok(Self {
            path,
            messages,
            clock,
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a turn, stamping it with the clock when no timestamp is given.
    pub fn append(
        &mut self,
        role: Role,
        content: impl Into<String>,
        timestamp: Option<Timestamp>,
        tool_calls: Option<Vec<ToolCall>>,
    ) -> &Message {
        let message = Message {
            role,
            content: content.into(),
            timestamp: timestamp.unwrap_or_else(|| self.clock.now()),
            tool_calls,
        };
        debug!(
            "appending message (role={}, content_len={}, tool_calls={})",
            message.role,
            message.content.len(),
            message.tool_calls.as_ref().map_or(0, Vec::len)
        );
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    /// Return the last `n` turns, oldest first.
    ///
    /// With `format` set, each turn's content is prefixed with its bracketed
    /// timestamp. Roles, timestamps and tool calls are passed through as is.
    pub fn windowed_view(&self, n: usize, format: bool) -> Vec<Message> {
        let start = self.messages.len().saturating_sub(n);
        self.messages[start..]
            .iter()
            .map(|message| {
                if !format {
                    return message.clone();
                }
                Message {
                    content: prefix_content(message.timestamp, &message.content),
                    ..message.clone()
                }
            })
            .collect()
    }

    /// Every stored turn in insertion order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Overwrite the backing file with the full transcript.
    pub fn persist(&self) -> Result<(), LedgerError> {
        write_messages(&self.path, &self.messages)?;
        debug!(
            "persisted message ledger (path={}, messages={})",
            self.path.display(),
            self.messages.len()
        );
        Ok(())
    }

    /// Drop every turn and persist the empty transcript immediately.
    pub fn reset(&mut self) -> Result<(), LedgerError> {
        let dropped = self.messages.len();
        self.messages.clear();
        self.persist()?;
        info!(
            "message ledger reset (path={}, dropped={})",
            self.path.display(),
            dropped
        );
        Ok(())
    }
}

/// Prefix content with the bracketed timestamp of its turn.
fn prefix_content(timestamp: Timestamp, content: &str) -> String {
    let prefix = format_prefix(timestamp);
    if content.is_empty() {
        prefix
    } else {
        format!("{prefix} {content}")
    }
}

fn load_messages(path: &Path) -> Result<Vec<Message>, LedgerError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(LedgerError::Io(err)),
    };
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }
    let stored: Vec<StoredMessage> = serde_json::from_str(&contents)?;
    stored.into_iter().map(Message::try_from).collect()
}

/// Rewrite the ledger file atomically through a sibling temp file.
fn write_messages(path: &Path, messages: &[Message]) -> Result<(), LedgerError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let stored: Vec<StoredMessage> = messages.iter().map(StoredMessage::from).collect();
    let serialized = serde_json::to_string_pretty(&stored)?;
    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);
    {
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&temp_path)?;
        file.write_all(serialized.as_bytes())?;
        writeln!(file)?;
        file.sync_all()?;
    }
    fs::rename(temp_path, path)?;
    Ok(())
}
