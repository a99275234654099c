//! medveil-phi — Reversible PHI de-identification engine.
//!
//! Strips patient identifiers from free text before it is sent to an external
//! reasoning backend, replacing each distinct value with a stable placeholder
//! token (`[PHONE_1]`, `[NAME_2]`, …), and restores the originals into the
//! generated response afterwards.
//!
//! The token map produced by one redaction call is the only bridge back to
//! the original values. It is scoped to that call and must never leave the
//! process or be persisted.

pub mod category;
pub mod models;
pub mod patterns;
pub mod redactor;
pub mod restorer;

pub use category::{CategoryError, PhiCategory};
pub use models::{PatientProfile, RedactionResult, TokenMap};
pub use redactor::{quick_check, redact, redact_with_known};
pub use restorer::{partial_restore, restore};
