//! Error types for the GitHub source host

/// Errors talking to GitHub or interpreting its payloads
#[derive(Debug, thiserror::Error)]
pub enum GitHubError {
    /// Transport failure
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("github returned {status} for {url}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Requested URL
        url: String,
        /// Response body
        body: String,
    },

    /// Resource does not exist or is not visible with this token
    #[error("not found: {0}")]
    NotFound(String),

    /// Body could not be deserialized
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    /// File content is not valid base64 or UTF-8
    #[error("failed to decode content of {path}: {reason}")]
    Decode {
        /// File path
        path: String,
        /// Decoder message
        reason: String,
    },

    /// Pull request touches no files
    #[error("no files changed in pull request #{0}")]
    NoChangedFiles(u64),

    /// OAuth exchange failed
    #[error("oauth error: {0}")]
    OAuth(String),

    /// Webhook event type not handled
    #[error("unsupported event type: {0}")]
    UnsupportedEvent(String),

    /// Pull request action not handled
    #[error("unsupported pull request action: {0}")]
    UnsupportedAction(String),

    /// Webhook payload lacks required fields
    #[error("invalid webhook payload: {0}")]
    InvalidPayload(String),
}

impl GitHubError {
    /// Decode error helper
    pub fn decode(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::Decode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error is a rejected webhook rather than a failure
    #[inline]
    #[must_use]
    pub fn is_rejected_event(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedEvent(_) | Self::UnsupportedAction(_) | Self::InvalidPayload(_)
        )
    }
}
