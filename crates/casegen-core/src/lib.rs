//! casegen core - LLM response parsing and reconciliation
//!
//! Pure functions that turn LLM completions into test cases:
//! - Splits a completion into ordered blocks (`ROW_SEPARATOR` or numbered list)
//! - Parses the trailing `- ChangeType:` / `- ID:` annotation of each block
//! - Compares annotated blocks with stored cases and emits reconciliation entries
//! - Renders the prompts that request each response convention
//!
//! # Example
//!
//! ```rust,ignore
//! use casegen_core::{parse_blocks, reconcile, SplitStyle};
//!
//! let response = "new body\n- ChangeType: UPDATED\n- ID: 7\nROW_SEPARATOR\n";
//! let blocks = parse_blocks(response, &SplitStyle::delimited())?;
//! let entries = reconcile(&blocks, &stored_cases);
//!
//! for entry in entries {
//!     println!("{:?} {}", entry.action(), entry.id);
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod block;
pub mod change_record;
pub mod error;
pub mod prompts;
pub mod reconcile;
pub mod splitter;
pub mod types;

pub use block::{parse_blocks, TestCaseBlock};
pub use change_record::{extract_title, find_title, parse_change_record, ChangeRecord, DEFAULT_TITLE};
pub use error::SplitError;
pub use prompts::Prompt;
pub use reconcile::{reconcile, reconcile_with_stats, ReconcileStats};
pub use splitter::{
    split, DelimiterSplitter, NumberedSplitter, ResponseSplitter, SplitStyle, DEFAULT_SEPARATOR,
};
pub use types::{
    CaseKind, ChangeType, NewTestCase, ReconcileAction, ReconciliationEntry, StoredTestCase,
    UnknownChangeType,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with casegen core
    pub use crate::{
        parse_blocks, reconcile, split, CaseKind, ChangeType, NewTestCase, ReconcileAction,
        ReconciliationEntry, SplitStyle, StoredTestCase, TestCaseBlock,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
