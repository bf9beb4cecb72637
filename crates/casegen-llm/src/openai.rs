//! OpenAI chat-completions client
//!
//! `POST {base}/chat/completions` with a bearer key; the completion text is
//! read from `choices[0].message.content`.

use crate::client::{CompletionClient, CompletionRequest, LlmProvider};
use crate::error::LlmError;
use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

/// Default endpoint base
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// OpenAI-compatible completion client
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl OpenAiClient {
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
            base_url: OPENAI_BASE_URL.to_string(),
            model: OPENAI_DEFAULT_MODEL.to_string(),
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

    /// Default model
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Request body for one user message
    #[must_use]
    pub fn build_body(&self, request: &CompletionRequest) -> JsonValue {
        json!({
            "model": request.model.as_deref().unwrap_or(&self.model),
            "messages": [
                {"role": "user", "content": request.prompt}
            ],
            "temperature": request.temperature,
        })
    }
}

/// Extract `choices[0].message.content` from a chat-completions body
///
/// # Errors
/// - `LlmError::Json` if the body is not JSON
/// - `LlmError::MalformedResponse` if the field is absent
pub fn parse_openai_completion(body: &str) -> Result<String, LlmError> {
    let json: JsonValue = serde_json::from_str(body)?;

    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(JsonValue::as_str)
        .map(str::to_string)
        .ok_or_else(|| LlmError::malformed("missing choices[0].message.content"))
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let body = self.build_body(&request);
        tracing::debug!(
            model = request.model.as_deref().unwrap_or(&self.model),
            temperature = request.temperature,
            prompt_len = request.prompt.len(),
            "sending openai completion"
        );

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
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

        let content = parse_openai_completion(&text)?;
        tracing::debug!(completion_len = content.len(), "openai completion received");
        Ok(content)
    }

    fn provider(&self) -> LlmProvider {
        LlmProvider::OpenAi
    }
}
