//! In-memory store

use crate::error::StoreError;
use crate::store::TestCaseStore;
use casegen_core::{CaseKind, NewTestCase, StoredTestCase};
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct Rows {
    next_id: i64,
    rows: Vec<StoredTestCase>,
}

/// Process-local store; rows are kept in id order
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Rows>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows across all kinds
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().rows.len()
    }

    /// Whether the store holds no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn select(&self, pred: impl Fn(&StoredTestCase) -> bool) -> Vec<StoredTestCase> {
        self.inner
            .lock()
            .rows
            .iter()
            .filter(|row| pred(row))
            .cloned()
            .collect()
    }
}

impl TestCaseStore for MemoryStore {
    fn create(&self, case: NewTestCase) -> Result<StoredTestCase, StoreError> {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let row = StoredTestCase {
            id: inner.next_id,
            kind: case.kind,
            file_name: case.file_name,
            content: case.content,
            title: case.title,
            test_repo: case.test_repo,
        };
        inner.rows.push(row.clone());
        Ok(row)
    }

    fn get(&self, kind: CaseKind, id: i64) -> Result<Option<StoredTestCase>, StoreError> {
        Ok(self
            .inner
            .lock()
            .rows
            .iter()
            .find(|row| row.kind == kind && row.id == id)
            .cloned())
    }

    fn update_content(
        &self,
        kind: CaseKind,
        id: i64,
        content: &str,
        title: Option<&str>,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock();
        let Some(row) = inner
            .rows
            .iter_mut()
            .find(|row| row.kind == kind && row.id == id)
        else {
            return Ok(false);
        };
        row.content = content.to_string();
        if let Some(title) = title {
            row.title = Some(title.to_string());
        }
        Ok(true)
    }

    fn delete(&self, kind: CaseKind, id: i64) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock();
        let before = inner.rows.len();
        inner.rows.retain(|row| !(row.kind == kind && row.id == id));
        Ok(inner.rows.len() != before)
    }

    fn find_by_file(
        &self,
        kind: CaseKind,
        file_name: &str,
    ) -> Result<Vec<StoredTestCase>, StoreError> {
        Ok(self.select(|row| row.kind == kind && row.file_name == file_name))
    }

    fn find_by_repo(
        &self,
        kind: CaseKind,
        test_repo: &str,
    ) -> Result<Vec<StoredTestCase>, StoreError> {
        Ok(self.select(|row| row.kind == kind && row.test_repo.as_deref() == Some(test_repo)))
    }

    fn list(&self, kind: CaseKind) -> Result<Vec<StoredTestCase>, StoreError> {
        Ok(self.select(|row| row.kind == kind))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_not_reused() {
        let store = MemoryStore::new();
        let a = store.create(NewTestCase::new(CaseKind::E2e, "a.js", "one")).unwrap();
        assert!(store.delete(CaseKind::E2e, a.id).unwrap());
        let b = store.create(NewTestCase::new(CaseKind::E2e, "a.js", "two")).unwrap();
        assert!(b.id > a.id);
    }

    #[test]
    fn kinds_are_isolated() {
        let store = MemoryStore::new();
        let row = store
            .create(NewTestCase::new(CaseKind::Contract, "swagger.json", "c"))
            .unwrap();
        assert!(store.get(CaseKind::E2e, row.id).unwrap().is_none());
        assert!(!store.update_content(CaseKind::E2e, row.id, "x", None).unwrap());
        assert!(!store.delete(CaseKind::E2e, row.id).unwrap());
        assert_eq!(store.list(CaseKind::Contract).unwrap().len(), 1);
    }
}
