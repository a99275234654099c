//! PHI-safe reasoning pipeline: redact → reason → restore, audited at every
//! step.
//!
//! The token map produced by redaction lives and dies inside one `process`
//! call. The backend only ever receives cleaned text; the audit trail only
//! ever receives category names and counts, never values.

use std::sync::Arc;
use std::time::Duration;

use medveil_audit::{AuditError, AuditLog};
use medveil_common::SessionId;
use medveil_llm::{LlmBackend, LlmError, LlmRequest, LlmResponse, Message};
use medveil_phi::models::{PatientProfile, RedactionResult};
use medveil_phi::{quick_check, redact_with_known, restore};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("audit trail failure: {0}")]
    Audit(#[from] AuditError),
    /// Backend failed twice (original attempt plus the single retry).
    #[error("reasoning backend unavailable: {0}")]
    Unavailable(String),
}

/// Which channel the conversation arrived on; selects the system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasoningContext {
    Chat,
    Email,
    Voice,
}

impl ReasoningContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasoningContext::Chat  => "chat",
            ReasoningContext::Email => "email",
            ReasoningContext::Voice => "voice",
        }
    }

    fn system_prompt(&self) -> &'static str {
        match self {
            ReasoningContext::Chat => {
                "You are a helpful pharmacy assistant. You help patients with \
                 prescription status, refill requests, general pharmacy questions \
                 and compound medication inquiries. Be friendly but professional. \
                 If you're unsure, say so. Never make up information about \
                 medications or prescriptions. If someone needs urgent medical \
                 help, tell them to call 911 or their doctor."
            }
            ReasoningContext::Email => {
                "You are an assistant helping triage pharmacy emails. Classify \
                 the email intent and draft a helpful response. Be professional \
                 and HIPAA-aware; don't include unnecessary details."
            }
            ReasoningContext::Voice => {
                "You are a voice assistant for a pharmacy. Keep responses brief \
                 and clear. Speak naturally. Confirm important details by \
                 repeating them back."
            }
        }
    }
}

/// What a handler gets back from one round trip.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Final text with PHI restored.
    pub response: String,
    /// The cleaned text that was actually sent to the backend.
    pub deidentified_input: String,
    pub tokens_found: usize,
    pub context: ReasoningContext,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IntentClassification {
    pub intent: String,
    pub confidence: f32,
    pub summary: String,
}

pub struct ReasoningPipeline {
    backend: Arc<dyn LlmBackend>,
    audit: Arc<AuditLog>,
    context: ReasoningContext,
    timeout: Duration,
    max_tokens: u32,
    temperature: f32,
}

impl ReasoningPipeline {
    pub fn new(
        backend: Arc<dyn LlmBackend>,
        audit: Arc<AuditLog>,
        context: ReasoningContext,
    ) -> Self {
        Self {
            backend,
            audit,
            context,
            timeout: Duration::from_secs(30),
            max_tokens: 500,
            temperature: 0.7,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_limits(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    /// Run one PHI-safe round trip.
    ///
    /// `profile` supplies known patient identifiers to tokenize before any
    /// pattern runs; `user_id` attributes the audit entries to a staff
    /// member where one is acting on the patient's behalf.
    pub async fn process(
        &self,
        session: &SessionId,
        user_input: &str,
        profile: Option<&PatientProfile>,
        user_id: Option<&str>,
    ) -> Result<PipelineOutcome, PipelineError> {
        let known = profile.map(PatientProfile::known_values).unwrap_or_default();

        // quick_check is sound (never a false negative), so skipping the
        // full redaction here cannot leak.
        let redaction = if known.is_empty() && !quick_check(user_input) {
            RedactionResult {
                text: user_input.to_string(),
                token_map: Default::default(),
                created_at: chrono::Utc::now(),
            }
        } else {
            redact_with_known(user_input, &known)
        };

        self.audit.record(
            "deidentify",
            session.as_str(),
            Some(&format!("tokens={}", redaction.token_count())),
            user_id,
        )?;
        for category in redaction.categories() {
            self.audit
                .record_phi_access(session.as_str(), "deidentify", category)?;
        }

        let request = LlmRequest {
            messages: vec![
                Message::system(self.context.system_prompt()),
                Message::user(redaction.text.clone()),
            ],
            model: None,
            max_tokens: Some(self.max_tokens),
            temperature: Some(self.temperature),
        };
        let response = self.complete_with_retry(request).await?;
        self.audit.record(
            "ai_call",
            session.as_str(),
            Some(&format!("context={}; model={}", self.context.as_str(), response.model)),
            user_id,
        )?;

        let restored = restore(&response.content, &redaction.token_map);
        self.audit.record(
            "reidentify",
            session.as_str(),
            Some(&format!("tokens={}", redaction.token_count())),
            user_id,
        )?;

        tracing::info!(
            session = session.as_str(),
            context = self.context.as_str(),
            tokens = redaction.token_count(),
            "reasoning round trip complete"
        );

        Ok(PipelineOutcome {
            response: restored,
            deidentified_input: redaction.text,
            tokens_found: redaction.token_map.len(),
            context: self.context,
        })
    }

    /// Classify message intent without generating a reply. Useful for
    /// routing decisions; the text still goes through redaction first.
    pub async fn classify(
        &self,
        session: &SessionId,
        text: &str,
    ) -> Result<IntentClassification, PipelineError> {
        let redaction = redact_with_known(text, &[]);
        self.audit.record(
            "deidentify",
            session.as_str(),
            Some(&format!("tokens={}", redaction.token_count())),
            None,
        )?;

        let prompt = format!(
            "Classify this message intent. Return JSON only.\n\
             Categories: rx_status, refill, compound_question, new_patient, \
             provider, general, urgent\n\n\
             Message: {}\n\n\
             Return format: {{\"intent\": \"category\", \"confidence\": 0.0, \
             \"summary\": \"brief description\"}}",
            redaction.text
        );
        let request = LlmRequest::new(vec![
            Message::system("You are a classifier. Return valid JSON only."),
            Message::user(prompt),
        ]);
        let response = self.complete_with_retry(request).await?;
        self.audit.record(
            "ai_call",
            session.as_str(),
            Some("context=classify"),
            None,
        )?;

        Ok(parse_classification(&response.content))
    }

    async fn complete_once(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        // No lock is held here: the audit log API is synchronous and all
        // audit writes happen outside this await.
        match tokio::time::timeout(self.timeout, self.backend.complete(request)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout(self.timeout)),
        }
    }

    /// One retry, then a terminal unavailable result. Backends themselves
    /// never retry.
    async fn complete_with_retry(&self, request: LlmRequest) -> Result<LlmResponse, PipelineError> {
        match self.complete_once(request.clone()).await {
            Ok(response) => Ok(response),
            Err(first) => {
                tracing::warn!(error = %first, "reasoning call failed, retrying once");
                self.complete_once(request)
                    .await
                    .map_err(|second| PipelineError::Unavailable(second.to_string()))
            }
        }
    }
}

/// Tolerant parse: the model was asked for JSON but may not comply.
fn parse_classification(content: &str) -> IntentClassification {
    serde_json::from_str(content).unwrap_or_else(|_| IntentClassification {
        intent: "unknown".to_string(),
        confidence: 0.3,
        summary: content.chars().take(100).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use medveil_llm::MockBackend;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    fn pipeline_with(
        backend: Arc<dyn LlmBackend>,
        dir: &std::path::Path,
    ) -> (ReasoningPipeline, Arc<AuditLog>) {
        let audit = Arc::new(AuditLog::open(dir).unwrap());
        let pipeline = ReasoningPipeline::new(backend, Arc::clone(&audit), ReasoningContext::Chat);
        (pipeline, audit)
    }

    struct FlakyBackend {
        fail_first: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmBackend for FlakyBackend {
        async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                return Err(LlmError::Unavailable("synthetic outage".to_string()));
            }
            MockBackend::new().complete(req).await
        }

        fn model_id(&self) -> &str {
            "flaky"
        }
    }

    struct SlowBackend;

    #[async_trait]
    impl LlmBackend for SlowBackend {
        async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            MockBackend::new().complete(req).await
        }

        fn model_id(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_round_trip_restores_phi() {
        let dir = tempdir().unwrap();
        let (pipeline, _) = pipeline_with(Arc::new(MockBackend::new()), dir.path());
        let session = SessionId::new();

        // The echo backend returns the cleaned text verbatim, so the final
        // response must equal the original input.
        let input = "Hi, I'm John Smith. Call 555-123-4567";
        let profile = PatientProfile {
            name: Some("John Smith".to_string()),
            ..Default::default()
        };
        let outcome = pipeline
            .process(&session, input, Some(&profile), None)
            .await
            .unwrap();

        assert_eq!(outcome.response, input);
        assert_eq!(outcome.deidentified_input, "Hi, I'm [NAME_1]. Call [PHONE_1]");
        assert_eq!(outcome.tokens_found, 2);
    }

    #[tokio::test]
    async fn test_backend_never_sees_phi() {
        let dir = tempdir().unwrap();
        let (pipeline, _) = pipeline_with(Arc::new(MockBackend::new()), dir.path());
        let outcome = pipeline
            .process(&SessionId::new(), "SSN 123-45-6789 and rx RX1234567", None, None)
            .await
            .unwrap();
        assert!(!outcome.deidentified_input.contains("123-45-6789"));
        assert!(!outcome.deidentified_input.contains("RX1234567"));
    }

    #[tokio::test]
    async fn test_audit_trail_covers_every_step() {
        let dir = tempdir().unwrap();
        let (pipeline, audit) = pipeline_with(Arc::new(MockBackend::new()), dir.path());
        let session = SessionId::new();

        pipeline
            .process(&session, "Call 555-123-4567", None, Some("staff-3"))
            .await
            .unwrap();

        let actions: Vec<String> = audit
            .entries_for_session(session.as_str())
            .unwrap()
            .into_iter()
            .map(|e| e.action)
            .collect();
        assert_eq!(
            actions,
            vec!["deidentify", "phi_deidentify", "ai_call", "reidentify"]
        );
    }

    #[tokio::test]
    async fn test_retry_once_then_succeed() {
        let dir = tempdir().unwrap();
        let backend = Arc::new(FlakyBackend { fail_first: 1, calls: AtomicUsize::new(0) });
        let (pipeline, _) = pipeline_with(Arc::clone(&backend) as Arc<dyn LlmBackend>, dir.path());

        let outcome = pipeline
            .process(&SessionId::new(), "is my order ready?", None, None)
            .await
            .unwrap();
        assert_eq!(outcome.response, "is my order ready?");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_two_failures_surface_unavailable() {
        let dir = tempdir().unwrap();
        let backend = Arc::new(FlakyBackend { fail_first: usize::MAX, calls: AtomicUsize::new(0) });
        let (pipeline, _) = pipeline_with(Arc::clone(&backend) as Arc<dyn LlmBackend>, dir.path());

        let err = pipeline
            .process(&SessionId::new(), "hello", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Unavailable(_)));
        // Exactly one retry, never more.
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_timeout_surfaces_unavailable() {
        let dir = tempdir().unwrap();
        let (pipeline, _) = pipeline_with(Arc::new(SlowBackend), dir.path());
        let pipeline = pipeline.with_timeout(Duration::from_millis(10));

        let err = pipeline
            .process(&SessionId::new(), "hello", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_classify_falls_back_on_non_json() {
        let dir = tempdir().unwrap();
        let backend = Arc::new(MockBackend::with_reply("definitely a refill request"));
        let (pipeline, _) = pipeline_with(backend, dir.path());

        let result = pipeline
            .classify(&SessionId::new(), "I need my usual refill")
            .await
            .unwrap();
        assert_eq!(result.intent, "unknown");
        assert_eq!(result.summary, "definitely a refill request");
    }

    #[tokio::test]
    async fn test_classify_parses_json_reply() {
        let dir = tempdir().unwrap();
        let backend = Arc::new(MockBackend::with_reply(
            r#"{"intent": "refill", "confidence": 0.92, "summary": "wants a refill"}"#,
        ));
        let (pipeline, _) = pipeline_with(backend, dir.path());

        let result = pipeline
            .classify(&SessionId::new(), "I need my usual refill")
            .await
            .unwrap();
        assert_eq!(result.intent, "refill");
        assert!(result.confidence > 0.9);
    }
}
