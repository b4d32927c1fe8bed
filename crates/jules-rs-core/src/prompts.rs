//! Static system prompt and the operator-owned goals document.

use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// System prompt read once at startup and never re-read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemPrompt(String);

impl SystemPrompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Read the prompt from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, std::io::Error> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        debug!(
            "loaded system prompt (path={}, len={})",
            path.display(),
            text.len()
        );
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Where the goals document comes from.
///
/// The document is edited by the operator while the agent runs, so it is
/// read again for every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalsSource {
    File(PathBuf),
    Inline(String),
}

impl GoalsSource {
    /// Current goals text. A missing file reads as empty.
    pub fn read(&self) -> Result<String, std::io::Error> {
        match self {
            GoalsSource::Inline(text) => Ok(text.clone()),
            GoalsSource::File(path) => match fs::read_to_string(path) {
                Ok(text) => Ok(text),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    warn!("goals document missing (path={})", path.display());
                    Ok(String::new())
                }
                Err(err) => Err(err),
            },
        }
    }
}
