//! Error types for LLM clients

/// Errors from a completion call
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Transport failure
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("completion endpoint returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, as returned
        body: String,
    },

    /// Body is not JSON
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON lacks the completion text
    #[error("malformed completion response: {0}")]
    MalformedResponse(String),

    /// No API key configured
    #[error("missing api key for provider {0}")]
    MissingApiKey(String),

    /// Provider name not recognised
    #[error("unknown llm provider: {0}")]
    UnknownProvider(String),
}

impl LlmError {
    /// Malformed response helper
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Whether the endpoint answered but the answer was unusable
    #[inline]
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedResponse(_) | Self::Json(_))
    }
}
