//! medveil-llm — Reasoning-capability boundary.
//!
//! The rest of the system treats the LLM as an opaque text-in/text-out
//! collaborator. This crate pins down that boundary: the `LlmBackend` trait,
//! the request/response types, and two implementations — an
//! OpenAI-compatible HTTP backend and a deterministic mock for tests and
//! offline mode.
//!
//! Nothing in here ever sees a token map. Backends receive cleaned text only.

pub mod backend;
pub mod mock;

pub use backend::{LlmBackend, LlmError, LlmRequest, LlmResponse, Message, OpenAiCompatibleBackend};
pub use mock::MockBackend;
