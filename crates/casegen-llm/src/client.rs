//! Completion client seam and provider selection

use crate::error::LlmError;
use crate::gemini::GeminiClient;
use crate::openai::OpenAiClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// One single-turn completion call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model override; the client default is used when absent
    pub model: Option<String>,
    /// User prompt
    pub prompt: String,
    /// Sampling temperature
    pub temperature: f32,
}

impl CompletionRequest {
    /// Request with the client's default model
    #[must_use]
    pub fn new(prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            model: None,
            prompt: prompt.into(),
            temperature,
        }
    }

    /// With model override
    #[inline]
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// A chat-completion endpoint
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send the prompt and return the completion text
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;

    /// Backing provider
    fn provider(&self) -> LlmProvider;
}

/// Supported completion providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// OpenAI chat completions
    #[default]
    OpenAi,
    /// Google Gemini generateContent
    Gemini,
}

impl LlmProvider {
    /// Provider name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "openai",
            LlmProvider::Gemini => "gemini",
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmProvider {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAi),
            "gemini" => Ok(LlmProvider::Gemini),
            other => Err(LlmError::UnknownProvider(other.to_string())),
        }
    }
}

/// Settings for building a completion client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Provider
    pub provider: LlmProvider,
    /// API key
    pub api_key: String,
    /// Model; provider default when absent
    pub model: Option<String>,
    /// Endpoint base URL; provider default when absent
    pub base_url: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAi,
            api_key: String::new(),
            model: None,
            base_url: None,
            timeout_secs: 120,
        }
    }
}

impl LlmSettings {
    /// Create default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With provider
    #[inline]
    #[must_use]
    pub fn with_provider(mut self, provider: LlmProvider) -> Self {
        self.provider = provider;
        self
    }

    /// With API key
    #[inline]
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = key.into();
        self
    }

    /// With model
    #[inline]
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// With endpoint base URL
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Request timeout
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Build the client for the configured provider
///
/// # Errors
/// - `LlmError::MissingApiKey` if no key is configured
/// - `LlmError::Http` if the HTTP client cannot be built
pub fn build_client(settings: &LlmSettings) -> Result<Arc<dyn CompletionClient>, LlmError> {
    if settings.api_key.trim().is_empty() {
        return Err(LlmError::MissingApiKey(settings.provider.to_string()));
    }

    let http = reqwest::Client::builder()
        .timeout(settings.timeout())
        .build()?;

    let client: Arc<dyn CompletionClient> = match settings.provider {
        LlmProvider::OpenAi => {
            let mut client = OpenAiClient::with_http(http, settings.api_key.clone());
            if let Some(url) = &settings.base_url {
                client = client.with_base_url(url.clone());
            }
            if let Some(model) = &settings.model {
                client = client.with_model(model.clone());
            }
            Arc::new(client)
        }
        LlmProvider::Gemini => {
            let mut client = GeminiClient::with_http(http, settings.api_key.clone());
            if let Some(url) = &settings.base_url {
                client = client.with_base_url(url.clone());
            }
            if let Some(model) = &settings.model {
                client = client.with_model(model.clone());
            }
            Arc::new(client)
        }
    };

    tracing::info!(provider = %settings.provider, "completion client ready");
    Ok(client)
}
