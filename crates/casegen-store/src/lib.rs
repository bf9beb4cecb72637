//! casegen store - test-case persistence
//!
//! [`TestCaseStore`] abstracts the table of generated cases; [`MemoryStore`]
//! and [`SqliteStore`] implement it. [`apply_entries`] turns reconciliation
//! entries into create/update/delete calls.
//!
//! # Example
//!
//! ```rust,ignore
//! use casegen_store::{apply_entries, open_store, StoreSettings};
//!
//! let store = open_store(&StoreSettings::sqlite("data/casegen.db"))?;
//! let summary = apply_entries(store.as_ref(), CaseKind::Contract, "swagger.json", Some("acme/api"), &entries)?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod memory;
pub mod sqlite;
pub mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::{apply_entries, ApplySummary, TestCaseStore};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Store backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process memory; lost on restart
    #[default]
    Memory,
    /// SQLite file
    Sqlite,
}

/// Store settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Backend
    pub backend: StoreBackend,
    /// Database file for the SQLite backend
    pub path: Option<PathBuf>,
}

impl StoreSettings {
    /// In-memory settings
    #[must_use]
    pub fn memory() -> Self {
        Self::default()
    }

    /// SQLite settings for a database file
    #[must_use]
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            path: Some(path.into()),
        }
    }
}

/// Open the configured store
///
/// # Errors
/// - `StoreError::Config` if SQLite is selected without a path
/// - Backend errors opening the database
pub fn open_store(settings: &StoreSettings) -> Result<Arc<dyn TestCaseStore>, StoreError> {
    match settings.backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreBackend::Sqlite => {
            let path = settings
                .path
                .as_ref()
                .ok_or_else(|| StoreError::Config("sqlite backend requires a path".into()))?;
            Ok(Arc::new(SqliteStore::open(path)?))
        }
    }
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn sqlite_without_path_rejected() {
        let settings = StoreSettings {
            backend: StoreBackend::Sqlite,
            path: None,
        };
        assert!(matches!(open_store(&settings), Err(StoreError::Config(_))));
    }

    #[test]
    fn default_is_memory() {
        let store = open_store(&StoreSettings::default()).unwrap();
        assert_eq!(store.backend(), "memory");
    }
}
