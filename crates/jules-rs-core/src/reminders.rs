//! Durable store of scheduled reminders backed by SQLite.
//!
//! Reminders are only ever inserted or flipped from pending to sent; rows
//! are never deleted and stay behind as an audit trail.

use jules_rs_protocol::{Clock, Timestamp, format_timestamp, parse_timestamp};
use log::{debug, info};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS scheduled_messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    call_id TEXT NOT NULL,
    fire_time INTEGER NOT NULL,
    topic TEXT NOT NULL,
    sent INTEGER NOT NULL DEFAULT 0,
    registered_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_scheduled_messages_pending
    ON scheduled_messages (sent, fire_time);
";

const SELECT_COLUMNS: &str =
    "SELECT id, call_id, fire_time, topic, sent, registered_at FROM scheduled_messages";

/// Errors returned by the reminder ledger.
#[derive(Debug, Error)]
pub enum ReminderError {
    /// Fire time is not in the canonical timestamp format.
    #[error("malformed date: {0}")]
    MalformedDate(String),
    /// Fire time is not strictly after the registration instant.
    #[error("cannot schedule in the past (fire_time={fire_time}, now={now})")]
    PastSchedule { fire_time: Timestamp, now: Timestamp },
    /// No reminder has this row id.
    #[error("reminder not found: {0}")]
    NotFound(i64),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// One scheduled reminder row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    /// Store-assigned identity used for lifecycle operations.
    pub row_id: i64,
    /// Tool-call id supplied by the model; advisory, may repeat.
    pub call_id: String,
    pub fire_time: Timestamp,
    pub topic: String,
    pub sent: bool,
    pub registered_at: Timestamp,
}

impl Reminder {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            row_id: row.get(0)?,
            call_id: row.get(1)?,
            fire_time: row.get(2)?,
            topic: row.get(3)?,
            sent: row.get(4)?,
            registered_at: row.get(5)?,
        })
    }

    /// Fire time rendered in the canonical format.
    pub fn when(&self) -> String {
        format_timestamp(self.fire_time)
    }
}

/// Pending/sent ledger of scheduled reminders.
pub struct ReminderLedger {
    conn: Connection,
    path: PathBuf,
    clock: Arc<dyn Clock>,
}

impl ReminderLedger {
    /// Open or create the reminder store at `path`.
    pub fn open(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> Result<Self, ReminderError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&path)?;
        conn.execute_batch(SCHEMA)?;
        info!("opened reminder ledger (path={})", path.display());
        Ok(Self { conn, path, clock })
    }

    /// Path of the backing database.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Admit a new reminder and return its row id.
    ///
    /// `when` must parse in the canonical format and lie strictly after the
    /// current clock reading.
    pub fn register(&self, call_id: &str, when: &str, topic: &str) -> Result<i64, ReminderError> {
        let now = self.clock.now();
        let fire_time = admit(when, now)?;
        insert(&self.conn, call_id, fire_time, topic, now)
    }

    /// Admit every `(call_id, when, topic)` request or none of them.
    ///
    /// All fire times are checked against one clock reading, in order, before
    /// anything is written; the inserts then share a single transaction.
    pub fn register_all(
        &self,
        requests: &[(&str, &str, &str)],
    ) -> Result<Vec<i64>, ReminderError> {
        let now = self.clock.now();
        let fire_times = requests
            .iter()
            .map(|(_, when, _)| admit(when, now))
            .collect::<Result<Vec<_>, _>>()?;

        let tx = self.conn.unchecked_transaction()?;
        let mut row_ids = Vec::with_capacity(requests.len());
        for ((call_id, _, topic), fire_time) in requests.iter().zip(fire_times) {
            row_ids.push(insert(&tx, call_id, fire_time, topic, now)?);
        }
        tx.commit()?;
        Ok(row_ids)
    }

    /// Pending reminders due at the current clock reading.
    pub fn due(&self) -> Result<Vec<Reminder>, ReminderError> {
        self.due_at(self.clock.now())
    }

    /// Pending reminders with `fire_time <= at`, oldest fire time first.
    pub fn due_at(&self, at: Timestamp) -> Result<Vec<Reminder>, ReminderError> {
        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_COLUMNS} WHERE sent = 0 AND fire_time <= ?1 ORDER BY fire_time, id"
        ))?;
        let reminders = stmt
            .query_map(params![at], Reminder::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        debug!("due reminders (at={}, count={})", at, reminders.len());
        Ok(reminders)
    }

    /// Flag a reminder as delivered. Marking twice is harmless.
    pub fn mark_sent(&self, row_id: i64) -> Result<(), ReminderError> {
        let changed = self.conn.execute(
            "UPDATE scheduled_messages SET sent = 1 WHERE id = ?1",
            params![row_id],
        )?;
        if changed == 0 {
            return Err(ReminderError::NotFound(row_id));
        }
        info!("reminder marked sent (row_id={})", row_id);
        Ok(())
    }

    /// Fetch a single reminder.
    pub fn get(&self, row_id: i64) -> Result<Option<Reminder>, ReminderError> {
        let reminder = self
            .conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![row_id],
                Reminder::from_row,
            )
            .optional()?;
        Ok(reminder)
    }

    /// Every reminder ever registered, in registration order.
    pub fn all(&self) -> Result<Vec<Reminder>, ReminderError> {
        let mut stmt = self.conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY id"))?;
        let reminders = stmt
            .query_map([], Reminder::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(reminders)
    }

    /// Release the database handle, reporting any close failure.
    pub fn close(self) -> Result<(), ReminderError> {
        let path = self.path;
        self.conn.close().map_err(|(_, err)| ReminderError::Sqlite(err))?;
        debug!("closed reminder ledger (path={})", path.display());
        Ok(())
    }
}

/// Parse `when` and require it to be strictly after `now`.
fn admit(when: &str, now: Timestamp) -> Result<Timestamp, ReminderError> {
    let fire_time =
        parse_timestamp(when).map_err(|_| ReminderError::MalformedDate(when.to_string()))?;
    if fire_time <= now {
        return Err(ReminderError::PastSchedule { fire_time, now });
    }
    Ok(fire_time)
}

fn insert(
    conn: &Connection,
    call_id: &str,
    fire_time: Timestamp,
    topic: &str,
    now: Timestamp,
) -> Result<i64, ReminderError> {
    conn.execute(
        "INSERT INTO scheduled_messages (call_id, fire_time, topic, sent, registered_at)
         VALUES (?1, ?2, ?3, 0, ?4)",
        params![call_id, fire_time, topic, now],
    )?;
    let row_id = conn.last_insert_rowid();
    info!(
        "reminder registered (row_id={}, call_id={}, fire_time={})",
        row_id, call_id, fire_time
    );
    Ok(row_id)
}

#[cfg(test)]
mod tests {
    use super::{ReminderError, ReminderLedger};
    use jules_rs_protocol::{FixedClock, format_timestamp};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tempfile::tempdir;

    const NOW: i64 = 1_727_700_000;

    fn open(dir: &std::path::Path) -> (ReminderLedger, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(NOW));
        let ledger =
            ReminderLedger::open(dir.join("scheduled_messages.db"), clock.clone()).expect("open");
        (ledger, clock)
    }

    #[test]
    fn register_rejects_unparseable_dates() {
        let temp = tempdir().expect("tempdir");
        let (ledger, _) = open(temp.path());
        let err = ledger.register("c", "not-a-date", "x").unwrap_err();
        assert!(matches!(err, ReminderError::MalformedDate(value) if value == "not-a-date"));
        assert!(ledger.all().expect("all").is_empty());
    }

    #[test]
    fn register_rejects_the_current_instant() {
        let temp = tempdir().expect("tempdir");
        let (ledger, _) = open(temp.path());
        let err = ledger
            .register("c", &format_timestamp(NOW), "x")
            .unwrap_err();
        assert!(matches!(
            err,
            ReminderError::PastSchedule { fire_time, now } if fire_time == NOW && now == NOW
        ));
    }

    #[test]
    fn register_stores_a_pending_row() {
        let temp = tempdir().expect("tempdir");
        let (ledger, _) = open(temp.path());
        let row_id = ledger
            .register("call_1", &format_timestamp(NOW + 60), "water plants")
            .expect("register");
        let reminder = ledger.get(row_id).expect("get").expect("present");
        assert_eq!(reminder.call_id, "call_1");
        assert_eq!(reminder.fire_time, NOW + 60);
        assert_eq!(reminder.topic, "water plants");
        assert!(!reminder.sent);
        assert_eq!(reminder.registered_at, NOW);
        assert_eq!(reminder.when(), format_timestamp(NOW + 60));
    }

    #[test]
    fn mark_sent_is_idempotent_but_needs_an_existing_row() {
        let temp = tempdir().expect("tempdir");
        let (ledger, _) = open(temp.path());
        let row_id = ledger
            .register("c", &format_timestamp(NOW + 1), "x")
            .expect("register");
        ledger.mark_sent(row_id).expect("first");
        ledger.mark_sent(row_id).expect("second");
        assert!(ledger.get(row_id).expect("get").expect("present").sent);
        assert!(matches!(
            ledger.mark_sent(row_id + 100),
            Err(ReminderError::NotFound(id)) if id == row_id + 100
        ));
    }

    #[test]
    fn register_all_admits_nothing_when_any_request_fails() {
        let temp = tempdir().expect("tempdir");
        let (ledger, _) = open(temp.path());
        let good = format_timestamp(NOW + 60);
        let err = ledger
            .register_all(&[
                ("a", good.as_str(), "good"),
                ("b", "12/31/99 00:00:00", "past"),
            ])
            .unwrap_err();
        assert!(matches!(err, ReminderError::PastSchedule { .. }));
        let err = ledger
            .register_all(&[("a", good.as_str(), "good"), ("b", "soon", "vague")])
            .unwrap_err();
        assert!(matches!(err, ReminderError::MalformedDate(value) if value == "soon"));
        assert!(ledger.all().expect("all").is_empty());
    }

    #[test]
    fn register_all_inserts_every_request_in_order() {
        let temp = tempdir().expect("tempdir");
        let (ledger, _) = open(temp.path());
        let first = format_timestamp(NOW + 60);
        let second = format_timestamp(NOW + 30);
        let row_ids = ledger
            .register_all(&[("a", first.as_str(), "one"), ("b", second.as_str(), "two")])
            .expect("register");
        let all = ledger.all().expect("all");
        assert_eq!(all.iter().map(|r| r.row_id).collect::<Vec<_>>(), row_ids);
        assert_eq!(
            all.iter().map(|r| r.topic.as_str()).collect::<Vec<_>>(),
            vec!["one", "two"]
        );
        assert!(all.iter().all(|r| r.registered_at == NOW && !r.sent));
    }

    #[test]
    fn get_missing_row_is_none() {
        let temp = tempdir().expect("tempdir");
        let (ledger, _) = open(temp.path());
        assert_eq!(ledger.get(42).expect("get"), None);
    }

    #[test]
    fn close_releases_the_handle() {
        let temp = tempdir().expect("tempdir");
        let (ledger, _) = open(temp.path());
        ledger
            .register("c", &format_timestamp(NOW + 5), "x")
            .expect("register");
        ledger.close().expect("close");
        let (reopened, _) = open(temp.path());
        assert_eq!(reopened.all().expect("all").len(), 1);
    }
}
