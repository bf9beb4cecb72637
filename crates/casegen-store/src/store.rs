//! Store seam and reconciliation apply

use crate::error::StoreError;
use casegen_core::{
    find_title, CaseKind, NewTestCase, ReconcileAction, ReconciliationEntry, StoredTestCase,
};
use serde::{Deserialize, Serialize};

/// Persistence for generated test cases
///
/// Identifiers are assigned by the store and never reused.
pub trait TestCaseStore: Send + Sync {
    /// Insert a case and return the stored row
    fn create(&self, case: NewTestCase) -> Result<StoredTestCase, StoreError>;

    /// Row by identifier
    fn get(&self, kind: CaseKind, id: i64) -> Result<Option<StoredTestCase>, StoreError>;

    /// Replace content, and title when one is given; false if the row is missing
    fn update_content(
        &self,
        kind: CaseKind,
        id: i64,
        content: &str,
        title: Option<&str>,
    ) -> Result<bool, StoreError>;

    /// Remove a row; false if it was missing
    fn delete(&self, kind: CaseKind, id: i64) -> Result<bool, StoreError>;

    /// Rows owned by a file, in id order
    fn find_by_file(&self, kind: CaseKind, file_name: &str)
        -> Result<Vec<StoredTestCase>, StoreError>;

    /// Rows tagged with a repository, in id order
    fn find_by_repo(&self, kind: CaseKind, test_repo: &str)
        -> Result<Vec<StoredTestCase>, StoreError>;

    /// All rows of a kind, in id order
    fn list(&self, kind: CaseKind) -> Result<Vec<StoredTestCase>, StoreError>;

    /// Backend name, for logs
    fn backend(&self) -> &'static str;
}

/// Counters from [`apply_entries`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplySummary {
    /// Rows inserted
    pub created: usize,
    /// Rows rewritten
    pub updated: usize,
    /// Rows removed
    pub deleted: usize,
    /// Entries naming an absent or malformed identifier, or adding nothing
    pub missing: usize,
}

impl ApplySummary {
    /// Entries that changed storage
    #[inline]
    #[must_use]
    pub fn changed(&self) -> usize {
        self.created + self.updated + self.deleted
    }
}

/// Apply reconciliation entries in order
///
/// Created rows belong to `file_name` / `test_repo` and take their title from
/// the content. Entries whose identifier no longer resolves are counted in
/// `missing` and skipped, as are additions without content.
///
/// # Errors
/// Returns the first backend failure; earlier entries stay applied.
pub fn apply_entries(
    store: &dyn TestCaseStore,
    kind: CaseKind,
    file_name: &str,
    test_repo: Option<&str>,
    entries: &[ReconciliationEntry],
) -> Result<ApplySummary, StoreError> {
    let mut summary = ApplySummary::default();

    for entry in entries {
        let action = entry.action();
        if action == ReconcileAction::Create {
            if entry.new_content.trim().is_empty() {
                tracing::warn!("skipping addition without content");
                summary.missing += 1;
                continue;
            }
            let mut case = NewTestCase::new(kind, file_name, entry.new_content.as_str());
            if let Some(title) = find_title(&entry.new_content) {
                case = case.with_title(title);
            }
            if let Some(repo) = test_repo {
                case = case.with_repo(repo);
            }
            store.create(case)?;
            summary.created += 1;
            continue;
        }

        let Ok(id) = entry.id.trim().parse::<i64>() else {
            tracing::warn!(id = %entry.id, "entry identifier is not numeric");
            summary.missing += 1;
            continue;
        };

        let found = match action {
            ReconcileAction::Update => {
                let title = find_title(&entry.new_content);
                store.update_content(kind, id, &entry.new_content, title.as_deref())?
            }
            _ => store.delete(kind, id)?,
        };

        match (found, action) {
            (false, _) => {
                tracing::warn!(id, ?action, "test case not found");
                summary.missing += 1;
            }
            (true, ReconcileAction::Update) => summary.updated += 1,
            (true, _) => summary.deleted += 1,
        }
    }

    tracing::info!(
        backend = store.backend(),
        %kind,
        file_name,
        created = summary.created,
        updated = summary.updated,
        deleted = summary.deleted,
        missing = summary.missing,
        "applied reconciliation entries"
    );
    Ok(summary)
}
