/// LLM Client — the single point of entry for all Gemini API calls in Crucible.
///
/// ARCHITECTURAL RULE: No other module may call the Gemini API directly.
/// All LLM interactions MUST go through this module.
///
/// Remote calls are never retried automatically. A repeated cache upload is a
/// second billable upload, so transient failures surface to the user for one
/// manual retry instead.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("cached content is unknown or expired on the remote side")]
    CacheNotFound,

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// A role-tagged group of text segments uploaded into a context cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentBlock {
    pub role: String,
    pub parts: Vec<String>,
}

impl ContentBlock {
    pub fn user(parts: Vec<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts,
        }
    }
}

/// Narrow interface the orchestrator depends on. The production
/// implementation is [`GeminiClient`]; tests script an in-memory backend.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Uploads a context cache bound to `model` and returns its remote name.
    async fn create_cache(
        &self,
        model: &str,
        system_instruction: &str,
        blocks: &[ContentBlock],
        ttl: Duration,
    ) -> Result<String, LlmError>;

    /// Checks that a previously created cache still exists remotely.
    async fn resolve_cache(&self, name: &str) -> Result<(), LlmError>;

    /// Releases a cache. A missing cache is not an error; it already expired.
    async fn delete_cache(&self, name: &str) -> Result<(), LlmError>;

    /// Generates text from a short delta prompt against a cached context.
    async fn generate_cached(
        &self,
        model: &str,
        cache_name: &str,
        prompt: &str,
    ) -> Result<String, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct WirePart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct WireContent<'a> {
    role: &'a str,
    parts: Vec<WirePart<'a>>,
}

#[derive(Debug, Serialize)]
struct WireSystemInstruction<'a> {
    parts: Vec<WirePart<'a>>,
}

#[derive(Debug, Serialize)]
struct CreateCacheRequest<'a> {
    model: &'a str,
    #[serde(rename = "systemInstruction")]
    system_instruction: WireSystemInstruction<'a>,
    contents: Vec<WireContent<'a>>,
    /// Seconds with an "s" suffix, e.g. "3600s".
    ttl: String,
}

#[derive(Debug, Deserialize)]
struct CreateCacheResponse {
    name: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    #[serde(rename = "cachedContent")]
    cached_content: &'a str,
    contents: Vec<WireContent<'a>>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount")]
    prompt_token_count: Option<u32>,
    #[serde(rename = "candidatesTokenCount")]
    candidates_token_count: Option<u32>,
    #[serde(rename = "cachedContentTokenCount")]
    cached_content_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorEnvelope {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

fn wire_contents(blocks: &[ContentBlock]) -> Vec<WireContent<'_>> {
    blocks
        .iter()
        .map(|block| WireContent {
            role: &block.role,
            parts: block.parts.iter().map(|p| WirePart { text: p }).collect(),
        })
        .collect()
}

fn api_error(status: u16, body: &str) -> LlmError {
    let message = serde_json::from_str::<GeminiErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());
    LlmError::Api { status, message }
}

fn first_text(response: GenerateResponse) -> Option<String> {
    response
        .candidates?
        .into_iter()
        .next()?
        .content
        .parts?
        .into_iter()
        .find_map(|p| p.text)
}

// ────────────────────────────────────────────────────────────────────────────
// Production client
// ────────────────────────────────────────────────────────────────────────────

/// The Gemini client used by the orchestrator in production.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: String, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{GEMINI_API_URL}/{path}?key={}", self.api_key)
    }
}

#[async_trait]
impl LlmBackend for GeminiClient {
    async fn create_cache(
        &self,
        model: &str,
        system_instruction: &str,
        blocks: &[ContentBlock],
        ttl: Duration,
    ) -> Result<String, LlmError> {
        let body = CreateCacheRequest {
            model,
            system_instruction: WireSystemInstruction {
                parts: vec![WirePart {
                    text: system_instruction,
                }],
            },
            contents: wire_contents(blocks),
            ttl: format!("{}s", ttl.as_secs()),
        };

        let response = self
            .client
            .post(self.url("cachedContents"))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Cache creation rejected ({status}): {body}");
            return Err(api_error(status.as_u16(), &body));
        }

        let created: CreateCacheResponse = response.json().await?;
        debug!("Created context cache {} for model {model}", created.name);
        Ok(created.name)
    }

    async fn resolve_cache(&self, name: &str) -> Result<(), LlmError> {
        let response = self.client.get(self.url(name)).send().await?;

        let status = response.status();
        if status.as_u16() == 403 || status.as_u16() == 404 {
            return Err(LlmError::CacheNotFound);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }
        Ok(())
    }

    async fn delete_cache(&self, name: &str) -> Result<(), LlmError> {
        let response = self.client.delete(self.url(name)).send().await?;

        let status = response.status();
        if status.as_u16() == 403 || status.as_u16() == 404 {
            // Already expired remotely; deletion is a cost optimization only.
            debug!("Cache {name} was already gone on delete");
            return Ok(());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }
        debug!("Deleted context cache {name}");
        Ok(())
    }

    async fn generate_cached(
        &self,
        model: &str,
        cache_name: &str,
        prompt: &str,
    ) -> Result<String, LlmError> {
        let contents = vec![ContentBlock::user(vec![prompt.to_string()])];
        let body = GenerateRequest {
            cached_content: cache_name,
            contents: wire_contents(&contents),
        };

        let response = self
            .client
            .post(self.url(&format!("{model}:generateContent")))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 403 || status.as_u16() == 404 {
            return Err(LlmError::CacheNotFound);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Generation failed ({status}): {body}");
            return Err(api_error(status.as_u16(), &body));
        }

        let parsed: GenerateResponse = response.json().await?;

        if let Some(usage) = &parsed.usage_metadata {
            debug!(
                "Generation succeeded: prompt_tokens={:?}, cached_tokens={:?}, output_tokens={:?}",
                usage.prompt_token_count,
                usage.cached_content_token_count,
                usage.candidates_token_count
            );
        }

        first_text(parsed).ok_or(LlmError::EmptyContent)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Test backend
// ────────────────────────────────────────────────────────────────────────────


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_cache_request_wire_format() {
        let blocks = vec![ContentBlock::user(vec![
            "--- [Submitted documents] ---".to_string(),
            "[Student record]\nrobotics club".to_string(),
        ])];
        let request = CreateCacheRequest {
            model: "models/gemini-2.5-pro",
            system_instruction: WireSystemInstruction {
                parts: vec![WirePart { text: "be strict" }],
            },
            contents: wire_contents(&blocks),
            ttl: "3600s".to_string(),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "models/gemini-2.5-pro");
        assert_eq!(json["ttl"], "3600s");
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "be strict");
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(
            json["contents"][0]["parts"][1]["text"],
            "[Student record]\nrobotics club"
        );
    }

    #[test]
    fn test_generate_request_references_cached_content() {
        let contents = vec![ContentBlock::user(vec!["On command: 'x'".to_string()])];
        let request = GenerateRequest {
            cached_content: "cachedContents/abc123",
            contents: wire_contents(&contents),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["cachedContent"], "cachedContents/abc123");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "On command: 'x'");
    }

    #[test]
    fn test_generate_response_text_extraction() {
        let json = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "first question"}], "role": "model"}}
            ],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 40}
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(first_text(parsed).as_deref(), Some("first question"));
    }

    #[test]
    fn test_generate_response_without_candidates_is_empty() {
        let parsed: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(first_text(parsed).is_none());
    }

    #[test]
    fn test_api_error_prefers_structured_message() {
        let body = r#"{"error": {"code": 403, "message": "CachedContent not found", "status": "PERMISSION_DENIED"}}"#;
        match api_error(403, body) {
            LlmError::Api { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "CachedContent not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_api_error_falls_back_to_raw_body() {
        match api_error(500, "upstream blew up") {
            LlmError::Api { message, .. } => assert_eq!(message, "upstream blew up"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
