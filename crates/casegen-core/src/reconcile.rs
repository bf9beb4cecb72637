//! Reconciliation builder
//!
//! Compares annotated blocks against a snapshot of stored test cases and
//! produces the entries needed to bring storage up to date. No I/O happens
//! here; the caller fetches the snapshot and applies the result.

use crate::block::TestCaseBlock;
use crate::types::{ChangeType, ReconciliationEntry, StoredTestCase};

/// Outcome counters for one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Blocks marked SAME
    pub unchanged: usize,
    /// Entries emitted
    pub emitted: usize,
    /// Blocks skipped (unrecognised or missing annotation, missing id, empty body)
    pub skipped: usize,
    /// UPDATED/DELETED blocks whose id was not in the snapshot
    pub unresolved: usize,
}

/// Stored case an annotation identifier refers to
fn lookup<'a>(existing: &'a [StoredTestCase], id: &str) -> Option<&'a StoredTestCase> {
    existing.iter().find(|case| case.matches_id(id))
}

/// Build reconciliation entries in block order
#[must_use]
pub fn reconcile(blocks: &[TestCaseBlock], existing: &[StoredTestCase]) -> Vec<ReconciliationEntry> {
    reconcile_with_stats(blocks, existing).0
}

/// [`reconcile`], also returning counters for logging
#[must_use]
pub fn reconcile_with_stats(
    blocks: &[TestCaseBlock],
    existing: &[StoredTestCase],
) -> (Vec<ReconciliationEntry>, ReconcileStats) {
    let mut entries = Vec::with_capacity(blocks.len());
    let mut stats = ReconcileStats::default();

    for (index, block) in blocks.iter().enumerate() {
        let Some(change_type) = block.change_type else {
            tracing::warn!(
                index,
                raw_change_type = block.raw_change_type.as_deref().unwrap_or("<missing>"),
                "skipping block without a recognized change type"
            );
            stats.skipped += 1;
            continue;
        };

        if change_type == ChangeType::Same {
            stats.unchanged += 1;
            continue;
        }

        if change_type != ChangeType::Deleted && block.body.is_empty() {
            tracing::warn!(index, %change_type, "skipping block with an empty body");
            stats.skipped += 1;
            continue;
        }

        if change_type == ChangeType::Added {
            entries.push(ReconciliationEntry::added(block.body.clone()));
            stats.emitted += 1;
            continue;
        }

        let Some(id) = block.id.as_deref() else {
            tracing::warn!(index, %change_type, "skipping block without an ID");
            stats.skipped += 1;
            continue;
        };

        let old_content = match lookup(existing, id) {
            Some(case) => case.content.as_str(),
            None => {
                tracing::warn!(index, id, %change_type, "referenced test case not found in snapshot");
                stats.unresolved += 1;
                ""
            }
        };

        let entry = if change_type == ChangeType::Updated {
            ReconciliationEntry::updated(id, old_content, block.body.clone())
        } else {
            ReconciliationEntry::deleted(id, old_content)
        };
        entries.push(entry);
        stats.emitted += 1;
    }

    tracing::debug!(
        blocks = blocks.len(),
        emitted = stats.emitted,
        unchanged = stats.unchanged,
        skipped = stats.skipped,
        unresolved = stats.unresolved,
        "reconciled blocks"
    );

    (entries, stats)
}
