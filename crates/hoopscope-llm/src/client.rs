// Reasoning backend client.
//
// Sends a single prompt to an Ollama-compatible `/api/generate` endpoint with
// `stream: false` and returns the generated text. One request per call, no
// retries; the caller decides what to do on failure.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use hoopscope_core::config::BackendConfig;

// ---------------------------------------------------------------------------
// Backend capability
// ---------------------------------------------------------------------------

/// Why a backend produced no usable text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("backend did not answer within {0:?}")]
    TimedOut(Duration),

    #[error("backend is disabled")]
    Disabled,

    #[error("network error: {0}")]
    Transport(String),

    #[error("backend returned status {0}")]
    HttpStatus(u16),

    #[error("malformed backend response: {0}")]
    Malformed(String),

    #[error("backend returned an empty response")]
    EmptyResponse,
}

/// Anything that can turn a prompt into generated text.
#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    /// Model or backend identifier recorded alongside generated narratives.
    fn name(&self) -> &str;

    /// Generate text for `prompt`, giving up after `timeout`.
    async fn infer(&self, prompt: &str, timeout: Duration) -> Result<String, BackendError>;
}

// ---------------------------------------------------------------------------
// OllamaClient
// ---------------------------------------------------------------------------

/// Low-level client for an Ollama-compatible generate endpoint.
pub struct OllamaClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
}

impl OllamaClient {
    pub fn new(endpoint: String, model: String, max_tokens: u32) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model,
            max_tokens,
        }
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.endpoint)
    }
}

#[async_trait]
impl ReasoningBackend for OllamaClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn infer(&self, prompt: &str, timeout: Duration) -> Result<String, BackendError> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "num_predict": self.max_tokens,
                "temperature": 0.7,
                "top_p": 0.9
            }
        });

        debug!(model = %self.model, prompt_len = prompt.len(), "sending generate request");

        let response = self
            .http
            .post(self.generate_url())
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "generate request rejected");
            return Err(BackendError::HttpStatus(status.as_u16()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(&e, timeout))?;
        parse_generate_response(&text)
    }
}

// ---------------------------------------------------------------------------
// LlmClient wrapper
// ---------------------------------------------------------------------------

/// High-level wrapper that is either an active backend client or disabled.
pub enum LlmClient {
    /// Reasoning backend is configured and enabled.
    Active(OllamaClient),
    /// Backend turned off in config. Every call fails fast with `Disabled`.
    Disabled,
}

impl LlmClient {
    /// Build an `LlmClient` from the backend section of the config.
    pub fn from_config(config: &BackendConfig) -> Self {
        if config.enabled && !config.endpoint.trim().is_empty() {
            LlmClient::Active(OllamaClient::new(
                config.endpoint.clone(),
                config.model.clone(),
                config.max_tokens,
            ))
        } else {
            LlmClient::Disabled
        }
    }
}

#[async_trait]
impl ReasoningBackend for LlmClient {
    fn name(&self) -> &str {
        match self {
            LlmClient::Active(client) => client.name(),
            LlmClient::Disabled => "disabled",
        }
    }

    async fn infer(&self, prompt: &str, timeout: Duration) -> Result<String, BackendError> {
        match self {
            LlmClient::Active(client) => client.infer(prompt, timeout).await,
            LlmClient::Disabled => Err(BackendError::Disabled),
        }
    }
}

// ---------------------------------------------------------------------------
// Response parsing helpers
// ---------------------------------------------------------------------------

/// Extract the generated text from a non-streaming generate response.
///
/// Expected shape: `{ "model": "...", "response": "...", "done": true }`.
/// A body carrying an `error` field is reported as malformed with that message.
pub(crate) fn parse_generate_response(body: &str) -> Result<String, BackendError> {
    let v: Value =
        serde_json::from_str(body).map_err(|e| BackendError::Malformed(format!("invalid JSON: {e}")))?;

    if let Some(err) = v.get("error").and_then(Value::as_str) {
        return Err(BackendError::Malformed(err.to_string()));
    }

    let text = v
        .get("response")
        .and_then(Value::as_str)
        .ok_or_else(|| BackendError::Malformed("missing `response` field".to_string()))?;

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(BackendError::EmptyResponse);
    }
    Ok(trimmed.to_string())
}

fn classify_reqwest_error(err: &reqwest::Error, timeout: Duration) -> BackendError {
    if err.is_timeout() {
        BackendError::TimedOut(timeout)
    } else {
        BackendError::Transport(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
