//! Canonical timestamp codec and clock sources.
//!
//! Every human-readable time the agent sees or produces goes through this
//! module: the `MM/DD/YY HH:MM:SS` form used in tool arguments and the
//! shorter `[MM/DD HH:MM:SS]` prefix stamped onto context-window turns.
//! Both are rendered in the local timezone of the host.

use crate::error::ProtocolError;
use chrono::{Local, NaiveDateTime, TimeZone};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch.
pub type Timestamp = i64;

/// Canonical format, e.g. `09/22/24 14:50:05`.
pub const TIMESTAMP_FORMAT: &str = "%m/%d/%y %H:%M:%S";
/// Format used inside turn prefixes, e.g. `09/22 14:50:05`.
pub const PREFIX_FORMAT: &str = "%m/%d %H:%M:%S";

/// Render a timestamp in the canonical format.
pub fn format_timestamp(timestamp: Timestamp) -> String {
    format_local(timestamp, TIMESTAMP_FORMAT)
}

/// Render the bracketed prefix placed in front of context-window turns.
pub fn format_prefix(timestamp: Timestamp) -> String {
    format!("[{}]", format_local(timestamp, PREFIX_FORMAT))
}

/// Parse a canonical timestamp string into epoch seconds.
///
/// Local times that do not exist (DST gaps) are rejected; ambiguous local
/// times resolve to the earlier instant.
pub fn parse_timestamp(value: &str) -> Result<Timestamp, ProtocolError> {
    let naive = NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT)
        .map_err(|_| ProtocolError::MalformedDate(value.to_string()))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp())
        .ok_or_else(|| ProtocolError::MalformedDate(value.to_string()))
}

fn format_local(timestamp: Timestamp, format: &str) -> String {
    match Local.timestamp_opt(timestamp, 0).earliest() {
        Some(dt) => dt.format(format).to_string(),
        None => timestamp.to_string(),
    }
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current time in epoch seconds.
    fn now(&self) -> Timestamp;
}

/// Wall clock backed by `SystemTime`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs() as Timestamp)
            .unwrap_or_default()
    }
}

/// Manually driven clock for deterministic replays and tests.
#[derive(Debug, Default)]
pub struct FixedClock {
    now: AtomicI64,
}

impl FixedClock {
    /// Create a clock frozen at `now`.
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    /// Move the clock to an absolute instant.
    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move the clock forward by `seconds`.
    pub fn advance(&self, seconds: i64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}
