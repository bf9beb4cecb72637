//! Change-record annotations
//!
//! In the contract update flow every block ends with a reconciliation
//! annotation:
//!
//! ```text
//! ## Test Case Title: Get user returns 404
//! ...body...
//! - ChangeType: UPDATED
//! - ID: 7
//! ```
//!
//! The `- ID:` line is omitted for `ADDED` blocks. [`parse_change_record`]
//! strips the annotation off the body and classifies it.

use crate::types::ChangeType;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Title used when a block carries no `## Test Case Title:` line
pub const DEFAULT_TITLE: &str = "Untitled Test Case";

static ID_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-\s*ID:\s*(.*?)\s*$").expect("id line pattern is valid"));

static CHANGE_TYPE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-\s*ChangeType:\s*(.*?)\s*$").expect("change type line pattern is valid")
});

static TITLE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*##\s*Test Case Title:\s*(.+?)\s*$").expect("title line pattern is valid")
});

/// Block body with its reconciliation annotation separated out
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Body with annotation lines removed, trimmed
    pub body: String,
    /// Recognised change type
    pub change_type: Option<ChangeType>,
    /// Annotation value as written, recognised or not
    pub raw_change_type: Option<String>,
    /// Referenced identifier
    pub id: Option<String>,
}

impl ChangeRecord {
    /// Whether an annotation was present but its value is not a known change type
    #[inline]
    #[must_use]
    pub fn is_unrecognized(&self) -> bool {
        self.raw_change_type.is_some() && self.change_type.is_none()
    }
}

fn capture(pattern: &Regex, line: Option<&str>) -> Option<String> {
    line.and_then(|l| pattern.captures(l.trim()))
        .map(|caps| caps[1].trim().to_string())
}

/// Split the trailing `ChangeType` / `ID` annotation off a block
///
/// Trailing blank lines are ignored when locating the last line. A value
/// outside SAME/UPDATED/ADDED/DELETED leaves `change_type` empty and is kept
/// in `raw_change_type`.
#[must_use]
pub fn parse_change_record(block: &str) -> ChangeRecord {
    let mut lines: Vec<&str> = block.lines().collect();
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }

    let mut id = None;
    let mut raw_change_type = None;

    if let Some(value) = capture(&ID_LINE, lines.last().copied()) {
        lines.pop();
        id = Some(value).filter(|v| !v.is_empty());

        if let Some(value) = capture(&CHANGE_TYPE_LINE, lines.last().copied()) {
            lines.pop();
            raw_change_type = Some(value);
        }
    } else if let Some(value) = capture(&CHANGE_TYPE_LINE, lines.last().copied()) {
        lines.pop();
        raw_change_type = Some(value);
    }

    let change_type = raw_change_type
        .as_deref()
        .and_then(|raw| raw.parse::<ChangeType>().ok());

    ChangeRecord {
        body: lines.join("\n").trim().to_string(),
        change_type,
        raw_change_type,
        id,
    }
}

/// Title from a `## Test Case Title:` line anywhere in the text
#[must_use]
pub fn find_title(text: &str) -> Option<String> {
    TITLE_LINE
        .captures(text)
        .map(|caps| caps[1].to_string())
}

/// Title, or [`DEFAULT_TITLE`] when absent
#[must_use]
pub fn extract_title(text: &str) -> String {
    find_title(text).unwrap_or_else(|| DEFAULT_TITLE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn added_without_id() {
        let record = parse_change_record("...body...\n- ChangeType: ADDED");
        assert_eq!(
            record,
            ChangeRecord {
                body: "...body...".into(),
                change_type: Some(ChangeType::Added),
                raw_change_type: Some("ADDED".into()),
                id: None,
            }
        );
    }

    #[test]
    fn updated_with_id() {
        let record = parse_change_record("...body...\n- ChangeType: UPDATED\n- ID: 7");
        assert_eq!(record.body, "...body...");
        assert_eq!(record.change_type, Some(ChangeType::Updated));
        assert_eq!(record.id.as_deref(), Some("7"));
    }

    #[test]
    fn no_annotation_keeps_body() {
        let record = parse_change_record("  line one\nline two  \n");
        assert_eq!(record.body, "line one\nline two");
        assert!(record.change_type.is_none());
        assert!(record.raw_change_type.is_none());
        assert!(record.id.is_none());
        assert!(!record.is_unrecognized());
    }

    #[test]
    fn trailing_blank_lines_ignored() {
        let record = parse_change_record("body\n- ChangeType: DELETED\n- ID: 12\n\n  \n");
        assert_eq!(record.body, "body");
        assert_eq!(record.change_type, Some(ChangeType::Deleted));
        assert_eq!(record.id.as_deref(), Some("12"));
    }

    #[test]
    fn id_without_change_type_line() {
        let record = parse_change_record("body\nmore\n- ID: 4");
        assert_eq!(record.body, "body\nmore");
        assert_eq!(record.id.as_deref(), Some("4"));
        assert!(record.change_type.is_none());
    }

    #[test]
    fn unrecognized_change_type() {
        let record = parse_change_record("body\n- ChangeType: RENAMED\n- ID: 3");
        assert!(record.is_unrecognized());
        assert_eq!(record.raw_change_type.as_deref(), Some("RENAMED"));
        assert_eq!(record.body, "body");
    }

    #[test]
    fn indented_annotation_lines() {
        let record = parse_change_record("body\n  - ChangeType: same\n  - ID:  9 ");
        assert_eq!(record.change_type, Some(ChangeType::Same));
        assert_eq!(record.id.as_deref(), Some("9"));
    }

    #[test]
    fn annotation_mid_body_is_not_stripped() {
        let record = parse_change_record("- ChangeType: ADDED\nbody continues");
        assert!(record.change_type.is_none());
        assert_eq!(record.body, "- ChangeType: ADDED\nbody continues");
    }

    #[test]
    fn empty_id_value_is_absent() {
        let record = parse_change_record("body\n- ChangeType: ADDED\n- ID:");
        assert!(record.id.is_none());
        assert_eq!(record.change_type, Some(ChangeType::Added));
    }

    #[test]
    fn title_found_anywhere() {
        let text = "intro\n## Test Case Title: Create user succeeds\n- **Endpoint**: /users";
        assert_eq!(extract_title(text), "Create user succeeds");
    }

    #[test]
    fn title_defaults_when_missing() {
        assert_eq!(extract_title("## Test Case ID: TC_1"), DEFAULT_TITLE);
        assert!(find_title("").is_none());
    }
}
