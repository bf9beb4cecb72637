//! Test-case blocks
//!
//! A [`TestCaseBlock`] is one unit of LLM text plus everything derived from
//! it: the cleaned body, title, change type and referenced identifier.

use crate::change_record::{find_title, parse_change_record, DEFAULT_TITLE};
use crate::error::SplitError;
use crate::splitter::SplitStyle;
use crate::types::ChangeType;
use serde::{Deserialize, Serialize};

/// One test case as emitted by the LLM
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseBlock {
    /// Text as split from the response
    pub raw: String,
    /// Text with the reconciliation annotation removed
    pub body: String,
    /// Title from a `## Test Case Title:` line
    pub title: Option<String>,
    /// Recognised change type
    pub change_type: Option<ChangeType>,
    /// Change-type annotation as written
    pub raw_change_type: Option<String>,
    /// Referenced stored identifier
    pub id: Option<String>,
}

impl TestCaseBlock {
    /// Derive title and annotation from raw block text
    #[must_use]
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let record = parse_change_record(&raw);
        let title = find_title(&record.body);

        Self {
            raw,
            body: record.body,
            title,
            change_type: record.change_type,
            raw_change_type: record.raw_change_type,
            id: record.id,
        }
    }

    /// Title, or the placeholder when the block has none
    #[must_use]
    pub fn title_or_default(&self) -> &str {
        self.title.as_deref().unwrap_or(DEFAULT_TITLE)
    }
}

/// Split a response and parse every block
///
/// # Errors
/// Returns error if the split style carries an invalid separator
pub fn parse_blocks(response: &str, style: &SplitStyle) -> Result<Vec<TestCaseBlock>, SplitError> {
    Ok(style
        .split(response)?
        .into_iter()
        .map(TestCaseBlock::parse)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_block_with_title_and_annotation() {
        let block = TestCaseBlock::parse(
            "## Test Case Title: Delete order\n- **Endpoint**: /orders/{id}\n- ChangeType: DELETED\n- ID: 5",
        );
        assert_eq!(block.title.as_deref(), Some("Delete order"));
        assert_eq!(block.change_type, Some(ChangeType::Deleted));
        assert_eq!(block.id.as_deref(), Some("5"));
        assert_eq!(
            block.body,
            "## Test Case Title: Delete order\n- **Endpoint**: /orders/{id}"
        );
    }

    #[test]
    fn untitled_block_uses_placeholder() {
        let block = TestCaseBlock::parse("plain text");
        assert_eq!(block.title_or_default(), DEFAULT_TITLE);
    }

    #[test]
    fn parse_blocks_keeps_order() {
        let response = "first\n- ChangeType: SAME\n- ID: 1\nROW_SEPARATOR\nsecond\n- ChangeType: ADDED\nROW_SEPARATOR\n";
        let blocks = parse_blocks(response, &SplitStyle::delimited()).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].body, "first");
        assert_eq!(blocks[1].change_type, Some(ChangeType::Added));
    }
}
