//! Context cache management — one server-side cached context per model tier.
//!
//! The two documents plus the system instruction are uploaded exactly once
//! per tier; every later stage call references the cache by handle and sends
//! only a small delta. This trades one added failure mode (handle expiry
//! mid-session) for large latency and cost savings across a workflow with
//! five or more sequential LLM calls over potentially large documents.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::errors::AppError;
use crate::llm_client::{ContentBlock, LlmBackend, LlmError};

/// A named model variant with its own cache namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Higher capability, slower. Carries the analysis and report stages.
    Reporting,
    /// Faster and cheaper. Drives the live simulation chat loop.
    Interactive,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Reporting => "reporting",
            Tier::Interactive => "interactive",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque reference to a remote, server-held, time-limited context blob.
///
/// Expiry is advisory: the remote service may drop the blob at any time, so
/// "handle not found" is an expected condition, not a bug. At most one live
/// handle exists per tier; replacing a tier's handle deletes the old one.
#[derive(Debug, Clone, Serialize)]
pub struct CacheHandle {
    /// Remote name assigned by the cache service on creation.
    pub id: String,
    pub tier: Tier,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub ttl: Duration,
}

/// A resolved handle, ready to be passed to a generate call.
#[derive(Debug, Clone)]
pub struct RemoteContext {
    pub model: String,
    pub cache_name: String,
}

/// Creates, resolves, and releases server-side context caches, and owns the
/// tier-to-model mapping.
pub struct ContextCacheManager {
    backend: Arc<dyn LlmBackend>,
    reporting_model: String,
    interactive_model: String,
    ttl: Duration,
}

impl ContextCacheManager {
    pub fn new(backend: Arc<dyn LlmBackend>, config: &Config) -> Self {
        Self {
            backend,
            reporting_model: config.reporting_model.clone(),
            interactive_model: config.interactive_model.clone(),
            ttl: config.cache_ttl,
        }
    }

    pub fn model_for(&self, tier: Tier) -> &str {
        match tier {
            Tier::Reporting => &self.reporting_model,
            Tier::Interactive => &self.interactive_model,
        }
    }

    /// Uploads `blocks` bound to the tier's model and system instruction.
    /// Remote rejection is reported to the caller and never retried here:
    /// re-triggering manually is cheap, while an automatic retry risks a
    /// duplicate billable upload.
    pub async fn create(
        &self,
        tier: Tier,
        system_instruction: &str,
        blocks: &[ContentBlock],
    ) -> Result<CacheHandle, AppError> {
        let model = self.model_for(tier).to_string();
        let id = self
            .backend
            .create_cache(&model, system_instruction, blocks, self.ttl)
            .await
            .map_err(|e| AppError::CacheCreate(e.to_string()))?;

        info!("Created {tier} cache {id} (model {model})");
        Ok(CacheHandle {
            id,
            tier,
            created_at: Utc::now(),
            ttl: self.ttl,
        })
    }

    /// Resolves a handle into a usable remote context reference.
    ///
    /// An unknown or expired handle is an expected, recoverable condition:
    /// it surfaces as [`AppError::CacheExpired`], whose response tells the
    /// user to restart the analysis. The caller's session state stays as it
    /// was.
    pub async fn get(&self, handle: &CacheHandle) -> Result<RemoteContext, AppError> {
        match self.backend.resolve_cache(&handle.id).await {
            Ok(()) => {
                let age = Utc::now().signed_duration_since(handle.created_at);
                debug!(
                    "Resolved {} cache {} (age {}s of {}s ttl)",
                    handle.tier,
                    handle.id,
                    age.num_seconds(),
                    handle.ttl.as_secs()
                );
                Ok(RemoteContext {
                    model: self.model_for(handle.tier).to_string(),
                    cache_name: handle.id.clone(),
                })
            }
            Err(LlmError::CacheNotFound) => {
                warn!("{} cache {} has expired remotely", handle.tier, handle.id);
                Err(AppError::CacheExpired)
            }
            Err(e) => Err(AppError::Generation(e.to_string())),
        }
    }

    /// Best-effort release. Failures are logged and swallowed: a dangling
    /// remote cache self-expires at its TTL, so deletion is a cost
    /// optimization, not a correctness requirement.
    pub async fn delete(&self, handle: &CacheHandle) {
        if let Err(e) = self.backend.delete_cache(&handle.id).await {
            warn!("Failed to delete {} cache {}: {e}", handle.tier, handle.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::mock::{MockBackend, Recorded};

    fn test_config() -> Config {
        Config {
            gemini_api_key: "test-key".to_string(),
            reporting_model: "models/gemini-2.5-pro".to_string(),
            interactive_model: "models/gemini-2.5-flash".to_string(),
            cache_ttl: Duration::from_secs(3600),
            llm_timeout: Duration::from_secs(120),
            port: 8080,
            rust_log: "info".to_string(),
        }
    }

    fn blocks() -> Vec<ContentBlock> {
        vec![ContentBlock::user(vec!["[Student record]\ntext".to_string()])]
    }

    #[tokio::test]
    async fn test_create_binds_tier_model_and_ttl() {
        let backend = MockBackend::new();
        let manager = ContextCacheManager::new(backend.clone(), &test_config());

        let handle = manager
            .create(Tier::Interactive, "system", &blocks())
            .await
            .unwrap();

        assert_eq!(handle.tier, Tier::Interactive);
        assert_eq!(handle.ttl, Duration::from_secs(3600));
        match &backend.calls()[0] {
            Recorded::CreateCache { model, ttl, .. } => {
                assert_eq!(model, "models/gemini-2.5-flash");
                assert_eq!(*ttl, Duration::from_secs(3600));
            }
            other => panic!("unexpected call: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_failure_is_reported_not_retried() {
        let backend = MockBackend::new();
        backend.set_fail_create(true);
        let manager = ContextCacheManager::new(backend.clone(), &test_config());

        let err = manager
            .create(Tier::Reporting, "system", &blocks())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::CacheCreate(_)));
        // Exactly one attempt: no automatic retry of billable uploads.
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_get_resolves_live_handle() {
        let backend = MockBackend::new();
        let manager = ContextCacheManager::new(backend.clone(), &test_config());
        let handle = manager
            .create(Tier::Reporting, "system", &blocks())
            .await
            .unwrap();

        let ctx = manager.get(&handle).await.unwrap();
        assert_eq!(ctx.model, "models/gemini-2.5-pro");
        assert_eq!(ctx.cache_name, handle.id);
    }

    #[tokio::test]
    async fn test_get_expired_handle_is_cache_expired() {
        let backend = MockBackend::new();
        let manager = ContextCacheManager::new(backend.clone(), &test_config());
        let handle = manager
            .create(Tier::Reporting, "system", &blocks())
            .await
            .unwrap();

        backend.expire_all();

        let err = manager.get(&handle).await.unwrap_err();
        assert!(matches!(err, AppError::CacheExpired));
    }

    #[tokio::test]
    async fn test_delete_failure_is_swallowed() {
        let backend = MockBackend::new();
        let manager = ContextCacheManager::new(backend.clone(), &test_config());
        let handle = manager
            .create(Tier::Interactive, "system", &blocks())
            .await
            .unwrap();

        backend.set_fail_delete(true);
        // Must not panic or propagate.
        manager.delete(&handle).await;
    }
}
