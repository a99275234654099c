//! Audit record type. One self-contained JSON line per entry, so corruption
//! of a single line never poisons the rest of the log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    /// What happened: "deidentify", "reidentify", "ai_call", "phi_*", …
    pub action: String,
    pub session_id: String,
    pub user_id: Option<String>,
    pub details: Option<String>,
}

impl AuditEntry {
    pub fn new(
        action: impl Into<String>,
        session_id: impl Into<String>,
        details: Option<String>,
        user_id: Option<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            action: action.into(),
            session_id: session_id.into(),
            user_id,
            details,
        }
    }
}
