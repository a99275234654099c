//! medveil-audit — Append-only compliance audit trail.
//!
//! Every PHI-relevant and AI-relevant action lands here as one line-delimited
//! JSON record. The log is the one shared stateful resource in the system:
//! it is opened once at process start and handed to components by reference,
//! never reached through ambient state.
//!
//! Write failures are surfaced to the caller. Audit completeness is a
//! compliance requirement, not best-effort logging.

pub mod entry;
pub mod log;

pub use entry::AuditEntry;
pub use log::{AuditError, AuditLog};
