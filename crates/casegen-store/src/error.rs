//! Error types for test-case stores

/// Storage failures
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// SQLite failure
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Filesystem failure preparing the database location
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Row holds a value this build cannot interpret
    #[error("corrupt row {id}: {reason}")]
    Corrupt {
        /// Row identifier
        id: i64,
        /// What was wrong
        reason: String,
    },

    /// Backend needs a path that was not configured
    #[error("configuration error: {0}")]
    Config(String),
}
