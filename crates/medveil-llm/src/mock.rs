//! Deterministic backend for tests and offline (mock) mode.

use async_trait::async_trait;

use crate::backend::{LlmBackend, LlmError, LlmRequest, LlmResponse};

/// Echoes the last user message back, or returns a canned reply.
///
/// Echo mode keeps placeholder tokens intact, which makes it useful for
/// exercising the full redact → complete → restore round trip without a
/// network.
pub struct MockBackend {
    reply: Option<String>,
}

impl MockBackend {
    /// Echo mode.
    pub fn new() -> Self {
        Self { reply: None }
    }

    /// Always answer with `reply`, ignoring the request.
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self { reply: Some(reply.into()) }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let content = match &self.reply {
            Some(reply) => reply.clone(),
            None => req
                .messages
                .iter()
                .rev()
                .find(|m| m.role == "user")
                .map(|m| m.content.clone())
                .unwrap_or_default(),
        };
        Ok(LlmResponse {
            content,
            model: "mock".to_string(),
            prompt_tokens: 0,
            completion_tokens: 0,
        })
    }

    fn model_id(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Message;

    #[tokio::test]
    async fn test_echo_returns_last_user_message() {
        let backend = MockBackend::new();
        let req = LlmRequest::new(vec![
            Message::system("be helpful"),
            Message::user("first"),
            Message::user("Hi [NAME_1]"),
        ]);
        let resp = backend.complete(req).await.unwrap();
        assert_eq!(resp.content, "Hi [NAME_1]");
    }

    #[tokio::test]
    async fn test_canned_reply() {
        let backend = MockBackend::with_reply("refill approved");
        let req = LlmRequest::new(vec![Message::user("anything")]);
        let resp = backend.complete(req).await.unwrap();
        assert_eq!(resp.content, "refill approved");
        assert_eq!(backend.model_id(), "mock");
    }
}
