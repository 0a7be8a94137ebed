//! REST client for the hosted text-generation inference API.
//!
//! Wraps a single `POST {base_url}/models/{model}` call with a bearer token
//! and a short request timeout. Any failure (network, timeout, non-2xx,
//! unparsable body) is reported as one [`InferenceError`]; there is no
//! retry.

use std::time::Duration;

use planner_core::summary::extract_generated_text;

/// Default inference API base URL.
const DEFAULT_API_URL: &str = "https://api-inference.huggingface.co";

/// Default text-generation model.
const DEFAULT_MODEL: &str = "EleutherAI/gpt-neo-2.7B";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Errors from the inference API layer.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API returned a non-2xx status code.
    #[error("Inference API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

/// Connection settings for the inference API.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Base URL, e.g. `https://api-inference.huggingface.co`.
    pub api_url: String,
    /// Model path appended after `/models/`.
    pub model: String,
    /// Bearer token; an empty token sends no `Authorization` header.
    pub access_token: String,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl InferenceConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                    | Default                                 |
    /// |----------------------------|-----------------------------------------|
    /// | `HUGGINGFACE_API_URL`      | `https://api-inference.huggingface.co`  |
    /// | `HUGGINGFACE_MODEL`        | `EleutherAI/gpt-neo-2.7B`               |
    /// | `HUGGINGFACE_ACCESS_TOKEN` | empty                                   |
    /// | `INFERENCE_TIMEOUT_SECS`   | `10`                                    |
    pub fn from_env() -> Self {
        Self {
            api_url: std::env::var("HUGGINGFACE_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            model: std::env::var("HUGGINGFACE_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            access_token: std::env::var("HUGGINGFACE_ACCESS_TOKEN").unwrap_or_default(),
            timeout: Duration::from_secs(
                std::env::var("INFERENCE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
        }
    }

    /// Full URL of the model endpoint.
    pub fn model_url(&self) -> String {
        format!("{}/models/{}", self.api_url.trim_end_matches('/'), self.model)
    }
}

/// HTTP client for the inference API.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    client: reqwest::Client,
    config: InferenceConfig,
}

impl InferenceClient {
    /// Create a client with its own connection pool.
    pub fn new(config: InferenceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Send `prompt` to the model and return the raw JSON response.
    pub async fn generate(&self, prompt: &str) -> Result<serde_json::Value, InferenceError> {
        let mut request = self
            .client
            .post(self.config.model_url())
            .timeout(self.config.timeout)
            .json(&serde_json::json!({ "inputs": prompt }));

        if !self.config.access_token.is_empty() {
            request = request.bearer_auth(&self.config.access_token);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(InferenceError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<serde_json::Value>().await?)
    }

    /// Generate a description summary for `prompt`.
    ///
    /// Responses without generated text yield the "unavailable" placeholder
    /// rather than an error.
    pub async fn summarize(&self, prompt: &str) -> Result<String, InferenceError> {
        let response = self.generate(prompt).await?;
        let text = extract_generated_text(&response);
        tracing::debug!(model = %self.config.model, chars = text.len(), "Received generated summary");
        Ok(text)
    }
}
