use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Panics at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    /// Model backing the reporting tier (slower, higher capability).
    pub reporting_model: String,
    /// Model backing the interactive tier (faster, cheaper, drives the chat loop).
    pub interactive_model: String,
    /// TTL requested for every server-side context cache. Expiry is advisory:
    /// the remote side may drop a cache earlier, and callers must treat that
    /// as a normal condition.
    pub cache_ttl: Duration,
    pub llm_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            reporting_model: env_or("REPORTING_MODEL", "models/gemini-2.5-pro"),
            interactive_model: env_or("INTERACTIVE_MODEL", "models/gemini-2.5-flash"),
            cache_ttl: Duration::from_secs(
                env_or("CACHE_TTL_SECS", "3600")
                    .parse::<u64>()
                    .context("CACHE_TTL_SECS must be a number of seconds")?,
            ),
            llm_timeout: Duration::from_secs(
                env_or("LLM_TIMEOUT_SECS", "120")
                    .parse::<u64>()
                    .context("LLM_TIMEOUT_SECS must be a number of seconds")?,
            ),
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
