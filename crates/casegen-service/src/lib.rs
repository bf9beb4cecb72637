//! casegen service - generation and reconciliation flows
//!
//! Glues the LLM client, the source host and the store into the flows the
//! HTTP server and CLI expose:
//! - End-to-end generation per file, per repository and per pull request
//! - Initial contract generation from a Swagger/OpenAPI file
//! - Contract reconciliation against pull-request changes
//! - Layered configuration (defaults, TOML file, environment)
//!
//! # Example
//!
//! ```rust,ignore
//! use casegen_service::{ServiceConfig, TestCaseService};
//!
//! let config = ServiceConfig::load(Some("casegen.toml".as_ref()))?;
//! let service = TestCaseService::from_config(&config)?;
//!
//! let entries = service
//!     .generate_updated_contract_for_pr("acme", "pets", &token, "Add POST /pets")
//!     .await?;
//! let summary = service.apply_contract_updates_for_repo("acme", "pets", &token, &entries).await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod service;

pub use config::{ConfigError, GitHubSettings, ServerSettings, ServiceConfig};
pub use error::ServiceError;
pub use service::{
    ContractDraft, E2eOutcome, LoginResult, SpecFile, TestCaseService, WebhookReport,
    SKIPPED_E2E_MESSAGE,
};

pub mod prelude {
    //! Common imports for driving the service
    pub use crate::{
        ContractDraft, E2eOutcome, ServiceConfig, ServiceError, TestCaseService, WebhookReport,
    };
    pub use casegen_core::{CaseKind, ReconciliationEntry, StoredTestCase};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
