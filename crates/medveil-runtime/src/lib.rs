//! medveil-runtime — Configuration and the PHI-safe reasoning pipeline.
//!
//! Wires the core pieces together for upstream channel handlers:
//! load config, open the audit log, build a backend, then run
//! redact → reason → restore per message through `ReasoningPipeline`.

pub mod config;
pub mod pipeline;

use std::sync::Arc;
use std::time::Duration;

use medveil_common::{MedveilError, Result};
use medveil_llm::{LlmBackend, MockBackend, OpenAiCompatibleBackend};
use secrecy::ExposeSecret;

pub use config::Config;
pub use pipeline::{
    IntentClassification, PipelineError, PipelineOutcome, ReasoningContext, ReasoningPipeline,
};

/// Initialise structured logging. `RUST_LOG` wins; defaults keep medveil
/// chatty and everything else at info.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("medveil=debug,info")),
        )
        .init();
}

/// Build the reasoning backend the config asks for.
pub fn build_backend(config: &Config) -> Result<Arc<dyn LlmBackend>> {
    match config.llm.mode.as_str() {
        "mock" => {
            tracing::warn!("LLM mock mode active — no text leaves the process");
            Ok(Arc::new(MockBackend::new()))
        }
        "remote" => {
            let api_key = config
                .llm
                .api_key()
                .map(|key| key.expose_secret().to_string());
            if api_key.is_none() {
                tracing::warn!(
                    env = %config.llm.api_key_env,
                    "remote LLM configured without an API key"
                );
            }
            let backend = OpenAiCompatibleBackend::new(
                config.llm.base_url.clone(),
                config.llm.model.clone(),
                api_key,
                Duration::from_secs(config.llm.timeout_secs),
            )
            .map_err(|e| MedveilError::Config(format!("could not build HTTP client: {e}")))?;
            Ok(Arc::new(backend))
        }
        other => Err(MedveilError::Config(format!(
            "unknown llm.mode {other:?} (expected \"mock\" or \"remote\")"
        ))),
    }
}
