//! Generative rewrite provider client.
//!
//! [`RewriteProvider`] is the seam between the orchestrator and the remote
//! text-completion service. [`GeminiProvider`] implements it against the
//! `generateContent` REST endpoint.

use std::future::Future;

use serde::Serialize;
use serde_json::Value;

use crate::error::ProviderError;

/// JSON pointer to the generated text in a `generateContent` response.
const GENERATED_TEXT_POINTER: &str = "/candidates/0/content/parts/0/text";

/// Sampling parameters sent as `generationConfig`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl GenerationParams {
    /// Parameters for turning extracted content into notes.
    pub fn generation() -> Self {
        Self { temperature: 0.2, top_k: 40, top_p: 0.8, max_output_tokens: 8192 }
    }

    /// Parameters for revising existing notes; slightly more permissive.
    pub fn revision() -> Self {
        Self { temperature: 0.3, ..Self::generation() }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::generation()
    }
}

/// A text-completion service that turns a prompt into markup.
///
/// The API key is passed on every call; providers hold no credentials.
pub trait RewriteProvider: Send + Sync {
    /// Issue a single completion request and return the generated text.
    fn generate(
        &self, api_key: &str, prompt: &str, params: &GenerationParams,
    ) -> impl Future<Output = std::result::Result<String, ProviderError>> + Send;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
    #[serde(rename = "generationConfig")]
    generation_config: &'a GenerationParams,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

/// Build the JSON request body for a prompt.
pub fn request_body(prompt: &str, params: &GenerationParams) -> Value {
    let request = GenerateRequest {
        contents: [RequestContent { parts: [RequestPart { text: prompt }] }],
        generation_config: params,
    };
    serde_json::to_value(request).unwrap_or(Value::Null)
}

/// Read the generated text out of a successful response body.
///
/// A body that is not JSON or lacks the text path is malformed; a present
/// but blank text is empty. Neither case panics.
pub fn parse_generated_text(body: &str) -> std::result::Result<String, ProviderError> {
    let value: Value = serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))?;

    let text = value
        .pointer(GENERATED_TEXT_POINTER)
        .ok_or_else(|| ProviderError::Malformed("missing candidates[0].content.parts[0].text".to_string()))?
        .as_str()
        .ok_or_else(|| ProviderError::Malformed("generated text is not a string".to_string()))?;

    if text.trim().is_empty() {
        return Err(ProviderError::EmptyResponse);
    }

    Ok(text.to_string())
}

/// Extract `error.message` from an error response, if there is one.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| "Unknown error".to_string())
}

#[cfg(feature = "fetch")]
pub use http::{GeminiProvider, ProviderConfig};

#[cfg(feature = "fetch")]
mod http {
    use std::time::Duration;

    use reqwest::Client;
    use tracing::debug;

    use super::{GenerationParams, RewriteProvider, error_message, parse_generated_text, request_body};
    use crate::error::ProviderError;

    /// Connection settings for [`GeminiProvider`].
    #[derive(Debug, Clone)]
    pub struct ProviderConfig {
        /// Scheme and host of the API, without a trailing path.
        pub base_url: String,
        /// Model name placed in the request path.
        pub model: String,
        /// Request timeout in seconds.
        pub timeout: u64,
    }

    impl Default for ProviderConfig {
        fn default() -> Self {
            Self {
                base_url: "https://generativelanguage.googleapis.com".to_string(),
                model: "gemini-2.0-flash".to_string(),
                timeout: 30,
            }
        }
    }

    /// HTTP client for the `generateContent` endpoint.
    #[derive(Debug, Clone)]
    pub struct GeminiProvider {
        client: Client,
        config: ProviderConfig,
    }

    impl GeminiProvider {
        pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
            let client = Client::builder().timeout(Duration::from_secs(config.timeout)).build()?;
            Ok(Self { client, config })
        }

        pub fn config(&self) -> &ProviderConfig {
            &self.config
        }

        /// Full URL of the generation endpoint.
        pub fn endpoint(&self) -> String {
            format!(
                "{}/v1/models/{}:generateContent",
                self.config.base_url.trim_end_matches('/'),
                self.config.model
            )
        }

        fn transport_error(&self, err: reqwest::Error) -> ProviderError {
            if err.is_timeout() { ProviderError::Timeout { timeout: self.config.timeout } } else { ProviderError::Http(err) }
        }
    }

    impl RewriteProvider for GeminiProvider {
        async fn generate(
            &self, api_key: &str, prompt: &str, params: &GenerationParams,
        ) -> Result<String, ProviderError> {
            let endpoint = self.endpoint();
            debug!(endpoint = %endpoint, prompt_len = prompt.len(), "sending rewrite request");

            let response = self
                .client
                .post(&endpoint)
                .header("x-goog-api-key", api_key)
                .json(&request_body(prompt, params))
                .send()
                .await
                .map_err(|e| self.transport_error(e))?;

            let status = response.status();
            let body = response.text().await.map_err(|e| self.transport_error(e))?;

            if !status.is_success() {
                return Err(ProviderError::Status { status: status.as_u16(), message: error_message(&body) });
            }

            parse_generated_text(&body)
        }
    }
}
