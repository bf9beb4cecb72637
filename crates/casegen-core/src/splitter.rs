//! Response splitters
//!
//! Turn one free-text LLM completion into an ordered list of test-case
//! blocks. Two conventions exist, chosen by the prompt that produced the
//! response:
//! - [`DelimiterSplitter`]: blocks separated by a literal token followed by a
//!   line break (`ROW_SEPARATOR` by default)
//! - [`NumberedSplitter`]: blocks introduced by `1. `, `2. `, ... at the start
//!   of a line

use crate::error::SplitError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Separator token the prompts ask the LLM to place between test cases
pub const DEFAULT_SEPARATOR: &str = "ROW_SEPARATOR";

static DEFAULT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&separator_pattern(DEFAULT_SEPARATOR)).expect("default separator pattern is valid")
});

// Digits, a period and a space at the start of the text or right after a
// line break.
static NUMBERED_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[0-9]+\. ").expect("numbered marker pattern is valid"));

fn separator_pattern(separator: &str) -> String {
    format!(r"{}(?:\r\n|\n|\r)", regex::escape(separator))
}

/// Splits an LLM response into trimmed, non-empty blocks in source order
pub trait ResponseSplitter: Send + Sync {
    /// Split response text into blocks
    fn split(&self, response: &str) -> Vec<String>;

    /// Splitter name, for logs
    fn name(&self) -> &'static str;
}

/// Splits on a literal separator token followed by a line break
#[derive(Debug, Clone)]
pub struct DelimiterSplitter {
    separator: String,
    pattern: Regex,
}

impl DelimiterSplitter {
    /// Create splitter for the given separator token
    ///
    /// # Errors
    /// - `SplitError::EmptySeparator` if the token is blank
    pub fn new(separator: impl Into<String>) -> Result<Self, SplitError> {
        let separator = separator.into();
        if separator.trim().is_empty() {
            return Err(SplitError::EmptySeparator);
        }
        let pattern = Regex::new(&separator_pattern(&separator))?;
        Ok(Self { separator, pattern })
    }

    /// Separator token
    #[inline]
    #[must_use]
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Drop any run of trailing separators so the final block is not empty
    fn strip_trailing<'a>(&self, text: &'a str) -> &'a str {
        let mut rest = text.trim_end();
        while let Some(stripped) = rest.strip_suffix(self.separator.as_str()) {
            rest = stripped.trim_end();
        }
        rest
    }
}

impl Default for DelimiterSplitter {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
            pattern: DEFAULT_PATTERN.clone(),
        }
    }
}

impl ResponseSplitter for DelimiterSplitter {
    fn split(&self, response: &str) -> Vec<String> {
        let body = self.strip_trailing(response);

        self.pattern
            .split(body)
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn name(&self) -> &'static str {
        "delimiter"
    }
}

/// Splits on `N. ` markers at line starts
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberedSplitter;

impl NumberedSplitter {
    /// Create numbered-list splitter
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ResponseSplitter for NumberedSplitter {
    fn split(&self, response: &str) -> Vec<String> {
        let mut offsets: Vec<usize> = NUMBERED_MARKER
            .find_iter(response)
            .map(|m| m.start())
            .collect();
        offsets.push(response.len());

        offsets
            .windows(2)
            .map(|bounds| response[bounds[0]..bounds[1]].trim())
            .filter(|piece| !piece.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn name(&self) -> &'static str {
        "numbered"
    }
}

/// Which splitter parses the reply to a given prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "style", content = "separator", rename_all = "snake_case")]
pub enum SplitStyle {
    /// Literal separator token
    Delimited(String),
    /// Numbered list
    Numbered,
    /// Reply is used whole
    Whole,
}

impl SplitStyle {
    /// Delimited style with [`DEFAULT_SEPARATOR`]
    #[inline]
    #[must_use]
    pub fn delimited() -> Self {
        SplitStyle::Delimited(DEFAULT_SEPARATOR.to_string())
    }

    /// Split a response according to this style
    ///
    /// # Errors
    /// Returns error if the configured separator is invalid
    pub fn split(&self, response: &str) -> Result<Vec<String>, SplitError> {
        let blocks = match self {
            SplitStyle::Delimited(separator) if separator == DEFAULT_SEPARATOR => {
                DelimiterSplitter::default().split(response)
            }
            SplitStyle::Delimited(separator) => DelimiterSplitter::new(separator.clone())?.split(response),
            SplitStyle::Numbered => NumberedSplitter.split(response),
            SplitStyle::Whole => {
                let whole = response.trim();
                if whole.is_empty() {
                    Vec::new()
                } else {
                    vec![whole.to_string()]
                }
            }
        };
        tracing::debug!(style = ?self, blocks = blocks.len(), "split response");
        Ok(blocks)
    }
}

impl Default for SplitStyle {
    fn default() -> Self {
        Self::delimited()
    }
}

/// Split a response on `separator` followed by a line break
///
/// # Errors
/// - `SplitError::EmptySeparator` if `separator` is blank
pub fn split(response: &str, separator: &str) -> Result<Vec<String>, SplitError> {
    Ok(DelimiterSplitter::new(separator)?.split(response))
}
