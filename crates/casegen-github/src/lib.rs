//! casegen GitHub - source host access
//!
//! Provides:
//! - [`SourceHost`], the async seam the service reads repositories through
//! - [`GitHubClient`], its REST implementation (contents walk, pull requests)
//! - [`GitHubOAuth`] for the login redirect and code exchange
//! - [`parse_pull_request_event`] for webhook deliveries
//!
//! # Example
//!
//! ```rust,ignore
//! use casegen_github::{find_spec_file, GitHubClient, SourceHost};
//!
//! let host = GitHubClient::new();
//! let files = host.list_repository_files("acme", "petstore", &token).await?;
//! if let Some((path, spec)) = find_spec_file(&files) {
//!     println!("{path}: {} bytes", spec.len());
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod client;
pub mod error;
pub mod host;
pub mod oauth;
pub mod types;
pub mod webhook;

pub use client::{decode_content, GitHubClient, GITHUB_API_BASE};
pub use error::GitHubError;
#[cfg(any(test, feature = "mock"))]
pub use host::MockSourceHost;
pub use host::{
    changed_file_section, find_spec_file, guess_spec_file_name, SourceHost, SPEC_FILE_CANDIDATES,
};
pub use oauth::{GitHubOAuth, OAuthApp, DEFAULT_SCOPE, GITHUB_OAUTH_BASE};
pub use types::{ChangedFile, PullRequest, RepoSummary};
pub use webhook::{parse_pull_request_event, PullRequestEvent, HANDLED_ACTIONS, PULL_REQUEST_EVENT};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
