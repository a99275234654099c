//! Configuration loading for Medveil.
//! Reads medveil.toml from the current directory or the path in the
//! MEDVEIL_CONFIG env var. API keys never live in the file; the config names
//! the environment variable holding the key and `.env` is honored.

use std::path::Path;

use medveil_common::Result;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub phi: PhiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "mock" (offline, echoes input) or "remote" (OpenAI-compatible HTTP).
    #[serde(default = "default_llm_mode")]
    pub mode: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the env var holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_llm_mode()     -> String { "mock".to_string() }
fn default_base_url()     -> String { "https://api.openai.com".to_string() }
fn default_model()        -> String { "gpt-4o-mini".to_string() }
fn default_api_key_env()  -> String { "MEDVEIL_OPENAI_API_KEY".to_string() }
fn default_timeout_secs() -> u64    { 30 }
fn default_max_tokens()   -> u32    { 500 }
fn default_temperature()  -> f32    { 0.7 }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            mode: default_llm_mode(),
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl LlmConfig {
    /// Resolve the API key from the environment, if present.
    pub fn api_key(&self) -> Option<SecretString> {
        std::env::var(&self.api_key_env).ok().map(SecretString::from)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Directory holding the append-only audit store.
    #[serde(default = "default_audit_dir")]
    pub dir: String,
}

fn default_audit_dir() -> String { "logs".to_string() }

impl Default for AuditConfig {
    fn default() -> Self {
        Self { dir: default_audit_dir() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PhiConfig {
    /// Categories handlers may restore when keeping the rest masked
    /// (e.g. analytics views that show names but never phone numbers).
    #[serde(default)]
    pub partial_restore_categories: Vec<String>,
}

impl Config {
    /// Load configuration from medveil.toml.
    /// Checks MEDVEIL_CONFIG env var first, then the current directory.
    /// A missing file yields the defaults (mock mode), never an error.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let path = std::env::var("MEDVEIL_CONFIG")
            .unwrap_or_else(|_| "medveil.toml".to_string());

        if !Path::new(&path).exists() {
            tracing::warn!(%path, "config file not found, using defaults (mock mode)");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
