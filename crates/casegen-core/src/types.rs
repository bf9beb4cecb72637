//! Core value types
//!
//! Defines the values exchanged between the parsing pipeline and its callers:
//! - Change types carried by annotated blocks
//! - Snapshots of stored test cases
//! - Reconciliation entries and the storage action they imply

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How a block relates to the previously stored test cases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeType {
    /// Unchanged; storage is left untouched
    Same,
    /// Existing case rewritten in place
    Updated,
    /// New case to append
    Added,
    /// Existing case to remove
    Deleted,
}

impl ChangeType {
    /// All recognised change types, in annotation order
    pub const ALL: [ChangeType; 4] = [
        ChangeType::Same,
        ChangeType::Updated,
        ChangeType::Added,
        ChangeType::Deleted,
    ];

    /// Annotation keyword
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Same => "SAME",
            ChangeType::Updated => "UPDATED",
            ChangeType::Added => "ADDED",
            ChangeType::Deleted => "DELETED",
        }
    }

    /// Whether blocks of this type must reference an existing identifier
    #[inline]
    #[must_use]
    pub fn requires_id(&self) -> bool {
        matches!(self, ChangeType::Updated | ChangeType::Deleted)
    }
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a change-type keyword is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized change type: '{0}'")]
pub struct UnknownChangeType(pub String);

impl FromStr for ChangeType {
    type Err = UnknownChangeType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SAME" => Ok(ChangeType::Same),
            "UPDATED" => Ok(ChangeType::Updated),
            "ADDED" => Ok(ChangeType::Added),
            "DELETED" => Ok(ChangeType::Deleted),
            _ => Err(UnknownChangeType(s.trim().to_string())),
        }
    }
}

/// Family a stored test case belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseKind {
    /// End-to-end test case generated from source files
    E2e,
    /// API contract test case generated from a Swagger/OpenAPI file
    Contract,
}

impl CaseKind {
    /// Storage tag
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseKind::E2e => "e2e",
            CaseKind::Contract => "contract",
        }
    }
}

impl std::fmt::Display for CaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "e2e" => Ok(CaseKind::E2e),
            "contract" => Ok(CaseKind::Contract),
            other => Err(format!("unknown case kind: {other}")),
        }
    }
}

/// Snapshot of a persisted test case
///
/// Rows are owned by the store; this is a detached copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTestCase {
    /// Identifier assigned by the store on creation
    pub id: i64,
    /// Test case family
    pub kind: CaseKind,
    /// Owning source or spec file
    pub file_name: String,
    /// Free-text test case document
    pub content: String,
    /// Title extracted at creation time
    pub title: Option<String>,
    /// Repository the case was generated from
    pub test_repo: Option<String>,
}

impl StoredTestCase {
    /// Whether this row is the one an annotation identifier refers to
    #[inline]
    #[must_use]
    pub fn matches_id(&self, id: &str) -> bool {
        self.id.to_string() == id.trim()
    }
}

/// Insert payload for a new test case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTestCase {
    /// Test case family
    pub kind: CaseKind,
    /// Owning source or spec file
    pub file_name: String,
    /// Free-text test case document
    pub content: String,
    /// Optional title
    pub title: Option<String>,
    /// Optional repository tag
    pub test_repo: Option<String>,
}

impl NewTestCase {
    /// Create an insert payload without title or repository tag
    #[must_use]
    pub fn new(kind: CaseKind, file_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind,
            file_name: file_name.into(),
            content: content.into(),
            title: None,
            test_repo: None,
        }
    }

    /// With title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// With repository tag
    #[must_use]
    pub fn with_repo(mut self, repo: impl Into<String>) -> Self {
        self.test_repo = Some(repo.into());
        self
    }
}

/// One create/update/delete action produced by a comparison pass
///
/// Wire shape: `{"id": "...", "old_content": "...", "new_content": "..."}`.
/// The older `tc_old` / `tc_new` keys are accepted when deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReconciliationEntry {
    /// Identifier of the affected row; empty for additions
    #[serde(default)]
    pub id: String,
    /// Content before the change; empty for additions
    #[serde(default, alias = "tc_old")]
    pub old_content: String,
    /// Content after the change; empty for deletions
    #[serde(default, alias = "tc_new")]
    pub new_content: String,
}

impl ReconciliationEntry {
    /// Entry for a new test case
    #[must_use]
    pub fn added(new_content: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            old_content: String::new(),
            new_content: new_content.into(),
        }
    }

    /// Entry rewriting an existing test case
    #[must_use]
    pub fn updated(
        id: impl Into<String>,
        old_content: impl Into<String>,
        new_content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            old_content: old_content.into(),
            new_content: new_content.into(),
        }
    }

    /// Entry removing an existing test case
    #[must_use]
    pub fn deleted(id: impl Into<String>, old_content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            old_content: old_content.into(),
            new_content: String::new(),
        }
    }

    /// Storage action this entry implies
    #[must_use]
    pub fn action(&self) -> ReconcileAction {
        if self.id.trim().is_empty() {
            ReconcileAction::Create
        } else if self.new_content.is_empty() {
            ReconcileAction::Delete
        } else {
            ReconcileAction::Update
        }
    }
}

/// Storage action derived from a [`ReconciliationEntry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    /// Insert a new row; the store assigns the identifier
    Create,
    /// Replace the content of an existing row
    Update,
    /// Remove an existing row
    Delete,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_type_parse_is_case_insensitive() {
        assert_eq!("updated".parse::<ChangeType>(), Ok(ChangeType::Updated));
        assert_eq!(" ADDED ".parse::<ChangeType>(), Ok(ChangeType::Added));
        assert!("RENAMED".parse::<ChangeType>().is_err());
    }

    #[test]
    fn change_type_roundtrips_through_display() {
        for ct in ChangeType::ALL {
            assert_eq!(ct.to_string().parse::<ChangeType>(), Ok(ct));
        }
    }

    #[test]
    fn entry_accepts_legacy_keys() {
        let json = r#"{"id":"3","tc_old":"before","tc_new":"after"}"#;
        let entry: ReconciliationEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry, ReconciliationEntry::updated("3", "before", "after"));
    }

    #[test]
    fn entry_serializes_wire_shape() {
        let entry = ReconciliationEntry::added("body");
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["id"], "");
        assert_eq!(value["old_content"], "");
        assert_eq!(value["new_content"], "body");
    }

    #[test]
    fn entry_actions() {
        assert_eq!(ReconciliationEntry::added("x").action(), ReconcileAction::Create);
        assert_eq!(
            ReconciliationEntry::updated("1", "a", "b").action(),
            ReconcileAction::Update
        );
        assert_eq!(ReconciliationEntry::deleted("1", "a").action(), ReconcileAction::Delete);
    }

    #[test]
    fn stored_case_matches_trimmed_id() {
        let case = StoredTestCase {
            id: 7,
            kind: CaseKind::Contract,
            file_name: "swagger.json".into(),
            content: "old".into(),
            title: None,
            test_repo: None,
        };
        assert!(case.matches_id(" 7 "));
        assert!(!case.matches_id("8"));
    }
}
