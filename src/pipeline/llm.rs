//! Inference call: one non-streaming request to an Ollama-compatible
//! `/api/generate` endpoint.
//!
//! This module only moves bytes; the prompt lives in [`crate::prompts`] and
//! output cleanup in [`crate::pipeline::postprocess`]. There is no retry: a
//! failed call is reported to the caller on first occurrence.

use crate::config::ServiceConfig;
use crate::error::Img2LatexError;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// JSON body of a generate call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceRequest {
    pub model: String,
    pub prompt: String,
    /// Base64-encoded images, no data-URI prefix.
    pub images: Vec<String>,
    pub stream: bool,
}

/// The part of the generate response we consume.
#[derive(Debug, Clone, Deserialize)]
pub struct InferenceResult {
    pub response: String,
}

#[derive(Debug, Deserialize)]
struct RemoteError {
    error: String,
}

/// Thin client around a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
}

impl OllamaClient {
    /// Build a client from the service configuration.
    ///
    /// The per-request timeout is baked into the underlying HTTP client.
    pub fn new(config: &ServiceConfig) -> Result<Self, Img2LatexError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Img2LatexError::InvalidConfig(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: generate_url(&config.ollama_host),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send `prompt` with one base64 image and return the raw answer text.
    pub async fn generate(
        &self,
        prompt: String,
        image_b64: String,
    ) -> Result<InferenceResult, Img2LatexError> {
        let request = InferenceRequest {
            model: self.model.clone(),
            prompt,
            images: vec![image_b64],
            stream: false,
        };

        let start = Instant::now();
        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!("Inference request to {} failed — {}", self.endpoint, e);
                if e.is_timeout() {
                    Img2LatexError::Generation(format!(
                        "inference call timed out after {}ms",
                        start.elapsed().as_millis()
                    ))
                } else {
                    Img2LatexError::Generation(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<RemoteError>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            warn!("Inference endpoint returned HTTP {}: {}", status, detail);
            return Err(Img2LatexError::Generation(format!("HTTP {status}: {detail}")));
        }

        let result: InferenceResult = response
            .json()
            .await
            .map_err(|e| Img2LatexError::Generation(format!("malformed response: {e}")))?;

        debug!(
            "Model {} answered {} chars in {:?}",
            self.model,
            result.response.len(),
            start.elapsed()
        );
        Ok(result)
    }
}

/// `{host}/api/generate`, tolerating a trailing slash on the host.
fn generate_url(host: &str) -> String {
    format!("{}/api/generate", host.trim_end_matches('/'))
}
