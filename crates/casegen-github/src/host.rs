//! Source-host seam
//!
//! Everything the service reads from a code host goes through
//! [`SourceHost`]. [`crate::GitHubClient`] is the production implementation;
//! tests use the generated `MockSourceHost`.

use crate::error::GitHubError;
use crate::types::{ChangedFile, PullRequest, RepoSummary};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Read access to repositories and pull requests
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait SourceHost: Send + Sync {
    /// Every file in the repository, path to decoded content
    async fn list_repository_files(
        &self,
        owner: &str,
        repo: &str,
        token: &str,
    ) -> Result<BTreeMap<String, String>, GitHubError>;

    /// Decoded content of one file on the default branch
    async fn file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        token: &str,
    ) -> Result<String, GitHubError>;

    /// Decoded content of one file at a branch, tag or commit
    async fn file_content_at(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        token: &str,
        git_ref: &str,
    ) -> Result<String, GitHubError>;

    /// Repositories of the authenticated user
    async fn user_repositories(&self, token: &str) -> Result<Vec<RepoSummary>, GitHubError>;

    /// Owner login of the user's repository named `repo_name`
    async fn repository_owner(
        &self,
        token: &str,
        repo_name: &str,
    ) -> Result<Option<String>, GitHubError>;

    /// Open pull requests of a repository
    async fn open_pull_requests(
        &self,
        owner: &str,
        repo: &str,
        token: &str,
    ) -> Result<Vec<PullRequest>, GitHubError>;

    /// Files touched by a pull request
    async fn pull_request_files(
        &self,
        owner: &str,
        repo: &str,
        token: &str,
        number: u64,
    ) -> Result<Vec<ChangedFile>, GitHubError>;

    /// Full head-branch content of every file the pull request touches,
    /// each introduced by a `### File: <path>` line
    async fn pull_request_changes(
        &self,
        owner: &str,
        repo: &str,
        token: &str,
        number: u64,
    ) -> Result<String, GitHubError>;

    /// Login of the token's user
    async fn user_login(&self, token: &str) -> Result<String, GitHubError>;
}

/// Header line introducing one file in [`SourceHost::pull_request_changes`]
#[must_use]
pub fn changed_file_section(path: &str, content: &str) -> String {
    format!("### File: {path}\n{content}\n\n")
}

/// Well-known API description file names, in lookup order
pub const SPEC_FILE_CANDIDATES: [&str; 4] =
    ["swagger.json", "swagger.yaml", "openapi.json", "openapi.yaml"];

/// First file whose path mentions swagger or openapi
#[must_use]
pub fn find_spec_file(files: &BTreeMap<String, String>) -> Option<(&str, &str)> {
    files
        .iter()
        .find(|(path, _)| {
            let lower = path.to_ascii_lowercase();
            lower.contains("swagger") || lower.contains("openapi")
        })
        .map(|(path, content)| (path.as_str(), content.as_str()))
}

/// Name of the API description file mentioned in pull-request changes
///
/// Falls back to `swagger.json`.
#[must_use]
pub fn guess_spec_file_name(changes: &str) -> &'static str {
    SPEC_FILE_CANDIDATES
        .iter()
        .copied()
        .find(|name| changes.contains(name))
        .unwrap_or(SPEC_FILE_CANDIDATES[0])
}
