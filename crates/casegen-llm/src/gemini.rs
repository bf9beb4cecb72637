//! Gemini generateContent client

use crate::client::{CompletionClient, CompletionRequest, LlmProvider};
use crate::error::LlmError;
use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

/// Default endpoint base
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Gemini completion client; the key travels as a `key` query parameter
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    /// Create client with default endpoint and model
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_http(reqwest::Client::new(), api_key)
    }

    /// Create client on an existing HTTP client
    #[must_use]
    pub fn with_http(http: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: GEMINI_BASE_URL.to_string(),
            model: GEMINI_DEFAULT_MODEL.to_string(),
            api_key: api_key.into(),
        }
    }

    /// With endpoint base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// With default model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        )
    }
}

/// Request body for one prompt
#[must_use]
pub fn gemini_body(request: &CompletionRequest) -> JsonValue {
    json!({
        "contents": [
            {"parts": [{"text": request.prompt}]}
        ],
        "generationConfig": {"temperature": request.temperature},
    })
}

/// Extract `candidates[0].content.parts[0].text`
///
/// # Errors
/// - `LlmError::Json` if the body is not JSON
/// - `LlmError::MalformedResponse` if the field is absent
pub fn parse_gemini_completion(body: &str) -> Result<String, LlmError> {
    let json: JsonValue = serde_json::from_str(body)?;

    json.pointer("/candidates/0/content/parts/0/text")
        .and_then(JsonValue::as_str)
        .map(str::to_string)
        .ok_or_else(|| LlmError::malformed("missing candidates[0].content.parts[0].text"))
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let model = request.model.as_deref().unwrap_or(&self.model);
        tracing::debug!(
            model,
            temperature = request.temperature,
            prompt_len = request.prompt.len(),
            "sending gemini completion"
        );

        let response = self
            .http
            .post(self.endpoint(model))
            .query(&[("key", self.api_key.as_str())])
            .json(&gemini_body(&request))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        parse_gemini_completion(&text)
    }

    fn provider(&self) -> LlmProvider {
        LlmProvider::Gemini
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_candidate() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Yes"}]}}]}"#;
        assert_eq!(parse_gemini_completion(body).unwrap(), "Yes");
    }

    #[test]
    fn parse_blocked_prompt() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        assert!(parse_gemini_completion(body).unwrap_err().is_malformed());
    }

    #[test]
    fn endpoint_includes_model() {
        let client = GeminiClient::new("k").with_base_url("http://localhost:9/v1beta/");
        assert_eq!(
            client.endpoint("gemini-pro"),
            "http://localhost:9/v1beta/models/gemini-pro:generateContent"
        );
    }

    #[test]
    fn body_carries_temperature() {
        let body = gemini_body(&CompletionRequest::new("p", 0.5));
        assert_eq!(body["generationConfig"]["temperature"], 0.5);
        assert_eq!(body["contents"][0]["parts"][0]["text"], "p");
    }
}
