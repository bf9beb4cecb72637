//! SQLite store
//!
//! One connection guarded by a mutex; every call is a single statement so no
//! explicit transactions are needed.

use crate::error::StoreError;
use crate::store::TestCaseStore;
use casegen_core::{CaseKind, NewTestCase, StoredTestCase};
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::time::Duration;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS test_cases (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    file_name TEXT NOT NULL,
    content TEXT NOT NULL,
    title TEXT,
    test_repo TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_test_cases_file ON test_cases(kind, file_name);
CREATE INDEX IF NOT EXISTS idx_test_cases_repo ON test_cases(kind, test_repo);
";

const COLUMNS: &str = "id, kind, file_name, content, title, test_repo";

/// SQLite-backed store
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open or create a database file and ensure the schema
    ///
    /// # Errors
    /// Returns error if the file or schema cannot be created
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "opening sqlite store");
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Private in-memory database
    ///
    /// # Errors
    /// Returns error if the schema cannot be created
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Database file, if any
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn query(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<StoredTestCase>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(args, RawRow::from_row)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?.into_case()?);
        }
        Ok(out)
    }
}

/// Row as read, before the kind tag is validated
struct RawRow {
    id: i64,
    kind: String,
    file_name: String,
    content: String,
    title: Option<String>,
    test_repo: Option<String>,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            kind: row.get(1)?,
            file_name: row.get(2)?,
            content: row.get(3)?,
            title: row.get(4)?,
            test_repo: row.get(5)?,
        })
    }

    fn into_case(self) -> Result<StoredTestCase, StoreError> {
        let kind = self
            .kind
            .parse::<CaseKind>()
            .map_err(|reason| StoreError::Corrupt { id: self.id, reason })?;
        Ok(StoredTestCase {
            id: self.id,
            kind,
            file_name: self.file_name,
            content: self.content,
            title: self.title,
            test_repo: self.test_repo,
        })
    }
}

impl TestCaseStore for SqliteStore {
    fn create(&self, case: NewTestCase) -> Result<StoredTestCase, StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO test_cases (kind, file_name, content, title, test_repo, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                case.kind.as_str(),
                case.file_name,
                case.content,
                case.title,
                case.test_repo,
                Utc::now().to_rfc3339(),
            ],
        )?;
        let id = conn.last_insert_rowid();
        tracing::debug!(id, kind = %case.kind, file_name = %case.file_name, "inserted test case");

        Ok(StoredTestCase {
            id,
            kind: case.kind,
            file_name: case.file_name,
            content: case.content,
            title: case.title,
            test_repo: case.test_repo,
        })
    }

    fn get(&self, kind: CaseKind, id: i64) -> Result<Option<StoredTestCase>, StoreError> {
        let conn = self.conn.lock();
        let raw = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM test_cases WHERE kind = ?1 AND id = ?2"),
                params![kind.as_str(), id],
                RawRow::from_row,
            )
            .optional()?;
        raw.map(RawRow::into_case).transpose()
    }

    fn update_content(
        &self,
        kind: CaseKind,
        id: i64,
        content: &str,
        title: Option<&str>,
    ) -> Result<bool, StoreError> {
        let changed = self.conn.lock().execute(
            "UPDATE test_cases SET content = ?1, title = COALESCE(?2, title)
             WHERE kind = ?3 AND id = ?4",
            params![content, title, kind.as_str(), id],
        )?;
        Ok(changed > 0)
    }

    fn delete(&self, kind: CaseKind, id: i64) -> Result<bool, StoreError> {
        let changed = self.conn.lock().execute(
            "DELETE FROM test_cases WHERE kind = ?1 AND id = ?2",
            params![kind.as_str(), id],
        )?;
        Ok(changed > 0)
    }

    fn find_by_file(
        &self,
        kind: CaseKind,
        file_name: &str,
    ) -> Result<Vec<StoredTestCase>, StoreError> {
        self.query(
            &format!("SELECT {COLUMNS} FROM test_cases WHERE kind = ?1 AND file_name = ?2 ORDER BY id"),
            &[&kind.as_str(), &file_name],
        )
    }

    fn find_by_repo(
        &self,
        kind: CaseKind,
        test_repo: &str,
    ) -> Result<Vec<StoredTestCase>, StoreError> {
        self.query(
            &format!("SELECT {COLUMNS} FROM test_cases WHERE kind = ?1 AND test_repo = ?2 ORDER BY id"),
            &[&kind.as_str(), &test_repo],
        )
    }

    fn list(&self, kind: CaseKind) -> Result<Vec<StoredTestCase>, StoreError> {
        self.query(
            &format!("SELECT {COLUMNS} FROM test_cases WHERE kind = ?1 ORDER BY id"),
            &[&kind.as_str()],
        )
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_keeps_title_when_none_given() {
        let store = SqliteStore::in_memory().unwrap();
        let row = store
            .create(NewTestCase::new(CaseKind::Contract, "swagger.json", "v1").with_title("T"))
            .unwrap();

        assert!(store.update_content(CaseKind::Contract, row.id, "v2", None).unwrap());
        let fetched = store.get(CaseKind::Contract, row.id).unwrap().unwrap();
        assert_eq!(fetched.content, "v2");
        assert_eq!(fetched.title.as_deref(), Some("T"));

        assert!(store.update_content(CaseKind::Contract, row.id, "v3", Some("T2")).unwrap());
        let fetched = store.get(CaseKind::Contract, row.id).unwrap().unwrap();
        assert_eq!(fetched.title.as_deref(), Some("T2"));
    }

    #[test]
    fn unknown_kind_is_corrupt() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .conn
            .lock()
            .execute(
                "INSERT INTO test_cases (kind, file_name, content, created_at) VALUES ('smoke', 'f', 'c', 'now')",
                [],
            )
            .unwrap();
        // Rows of other kinds are filtered by the query, so look it up directly
        let conn = store.conn.lock();
        let raw = conn
            .query_row(&format!("SELECT {COLUMNS} FROM test_cases"), [], RawRow::from_row)
            .unwrap();
        assert!(matches!(raw.into_case(), Err(StoreError::Corrupt { .. })));
    }
}
