//! Error types for response parsing
//!
//! Parsing LLM text is deliberately forgiving: unrecognised annotations and
//! unresolvable identifiers are logged and skipped, never raised. The only
//! hard failures are configuration mistakes made when building a splitter.

/// Errors while building a response splitter
#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    /// Separator token is empty or whitespace only
    #[error("separator token must not be empty")]
    EmptySeparator,

    /// Separator could not be compiled into a split pattern
    #[error("invalid separator pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}
