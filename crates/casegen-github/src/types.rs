//! GitHub payload types
//!
//! Wire shapes (`*Payload`) are kept private to the client; the public types
//! carry only what the service needs.

use serde::{Deserialize, Serialize};

/// Repository visible to the authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSummary {
    /// Repository name
    pub name: String,
    /// Owner login
    pub owner: String,
}

/// Pull request summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// PR title
    pub title: String,
    /// `open` or `closed`
    pub state: String,
    /// Creation timestamp as reported by GitHub
    pub created_at: String,
    /// Source branch
    pub head_ref: String,
}

impl PullRequest {
    /// Whether the PR is open
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == "open"
    }
}

/// File touched by a pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    /// Path in the repository
    pub filename: String,
    /// `added`, `modified`, `removed`, ...
    #[serde(default)]
    pub status: String,
    /// Unified diff; absent for binary or very large files
    #[serde(default)]
    pub patch: Option<String>,
}

impl ChangedFile {
    /// Whether the file no longer exists on the head branch
    #[inline]
    #[must_use]
    pub fn is_removed(&self) -> bool {
        self.status == "removed"
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwnerPayload {
    pub(crate) login: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RepoPayload {
    pub(crate) name: String,
    pub(crate) owner: OwnerPayload,
}

impl From<RepoPayload> for RepoSummary {
    fn from(repo: RepoPayload) -> Self {
        Self {
            name: repo.name,
            owner: repo.owner.login,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct HeadPayload {
    #[serde(rename = "ref")]
    pub(crate) git_ref: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PullRequestPayload {
    pub(crate) number: u64,
    #[serde(default)]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) state: String,
    #[serde(default)]
    pub(crate) created_at: String,
    pub(crate) head: HeadPayload,
}

impl From<PullRequestPayload> for PullRequest {
    fn from(pr: PullRequestPayload) -> Self {
        Self {
            number: pr.number,
            title: pr.title,
            state: pr.state,
            created_at: pr.created_at,
            head_ref: pr.head.git_ref,
        }
    }
}

/// One entry of the contents API
#[derive(Debug, Deserialize)]
pub(crate) struct ContentEntry {
    pub(crate) path: String,
    #[serde(rename = "type")]
    pub(crate) kind: String,
    #[serde(default)]
    pub(crate) content: Option<String>,
}

/// Contents API answers with an array for directories and an object for files
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ContentsResponse {
    Directory(Vec<ContentEntry>),
    File(ContentEntry),
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserPayload {
    pub(crate) login: String,
}
