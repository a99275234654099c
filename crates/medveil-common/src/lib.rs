//! medveil-common — Shared types and errors used across all Medveil crates.

pub mod error;
pub mod session;

pub use error::{MedveilError, Result};
pub use session::SessionId;
