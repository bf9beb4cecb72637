//! Error types for service flows

use crate::config::ConfigError;
use casegen_core::SplitError;
use casegen_github::GitHubError;
use casegen_llm::LlmError;
use casegen_store::StoreError;

/// Errors from a generation or reconciliation flow
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Completion call failed
    #[error("llm error: {0}")]
    Llm(#[from] LlmError),

    /// Source host call failed
    #[error("github error: {0}")]
    GitHub(#[from] GitHubError),

    /// Persistence failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Reply could not be split
    #[error("split error: {0}")]
    Split(#[from] SplitError),

    /// Configuration invalid
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Repository has no Swagger/OpenAPI file
    #[error("No Swagger or OpenAPI file found")]
    SpecFileNotFound,

    /// No open pull request with the given title
    #[error("PR not found: {0}")]
    PullRequestNotFound(String),

    /// Repository not visible to the user
    #[error("Repository not found: {0}")]
    RepositoryNotFound(String),

    /// Request carried nothing to process
    #[error("{0}")]
    EmptyInput(String),

    /// Feature needs configuration that is absent
    #[error("not configured: {0}")]
    NotConfigured(String),
}

impl ServiceError {
    /// Whether the error names something that does not exist
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::SpecFileNotFound
                | Self::PullRequestNotFound(_)
                | Self::RepositoryNotFound(_)
                | Self::GitHub(GitHubError::NotFound(_))
        )
    }

    /// Whether the caller sent something unusable
    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        match self {
            Self::EmptyInput(_) => true,
            Self::GitHub(e) => e.is_rejected_event(),
            _ => false,
        }
    }
}
