//! Durable append-only log backed by a JSONL file.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::NaiveDate;
use thiserror::Error;

use crate::entry::AuditEntry;

const AUDIT_FILE: &str = "audit_log.jsonl";

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("audit entry serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Handle on the audit store.
///
/// Appends are serialized through a mutex held across the whole
/// line-write-and-flush, so concurrent callers can never interleave bytes
/// within one record and a crash can lose at most a whole entry, never half
/// of one. The mutex is never held across an await point: the API is
/// deliberately synchronous.
pub struct AuditLog {
    path: PathBuf,
    writer: Mutex<File>,
}

impl AuditLog {
    /// Open (creating if absent) the audit store under `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, AuditError> {
        std::fs::create_dir_all(dir.as_ref())?;
        let path = dir.as_ref().join(AUDIT_FILE);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Durably append one entry. Errors propagate; callers must not treat a
    /// failed audit write as success.
    pub fn record(
        &self,
        action: &str,
        session_id: &str,
        details: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<AuditEntry, AuditError> {
        let entry = AuditEntry::new(
            action,
            session_id,
            details.map(str::to_string),
            user_id.map(str::to_string),
        );
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        let mut file = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        file.write_all(line.as_bytes())?;
        file.flush()?;
        drop(file);

        tracing::debug!(action, session_id, "audit entry recorded");
        Ok(entry)
    }

    /// PHI-access record: `action = "phi_" + access_kind`, category in the
    /// details. Same append path as everything else, so PHI accesses are a
    /// strict subset of the general stream and queryable the same way. Only
    /// the category name is recorded, never the value.
    pub fn record_phi_access(
        &self,
        session_id: &str,
        access_kind: &str,
        category: &str,
    ) -> Result<AuditEntry, AuditError> {
        self.record(
            &format!("phi_{access_kind}"),
            session_id,
            Some(&format!("category={category}")),
            None,
        )
    }

    /// All entries for a session, in write order.
    pub fn entries_for_session(&self, session_id: &str) -> Result<Vec<AuditEntry>, AuditError> {
        self.scan(|entry| entry.session_id == session_id)
    }

    /// All entries stamped on the given UTC date, in write order.
    pub fn entries_for_date(&self, date: NaiveDate) -> Result<Vec<AuditEntry>, AuditError> {
        self.scan(|entry| entry.timestamp.date_naive() == date)
    }

    /// Full scan with a filter. Recomputed fresh per call; malformed lines
    /// are skipped so one corrupt record cannot hide the rest of the log.
    /// May miss entries appended while the scan runs.
    fn scan<F>(&self, mut keep: F) -> Result<Vec<AuditEntry>, AuditError>
    where
        F: FnMut(&AuditEntry) -> bool,
    {
        let file = File::open(&self.path)?;
        let mut entries = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            match serde_json::from_str::<AuditEntry>(&line) {
                Ok(entry) => {
                    if keep(&entry) {
                        entries.push(entry);
                    }
                }
                Err(err) => {
                    tracing::warn!(%err, "skipping malformed audit line");
                }
            }
        }
        Ok(entries)
    }
}
