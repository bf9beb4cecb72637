//! GitHub REST client

use crate::error::GitHubError;
use crate::host::{changed_file_section, SourceHost};
use crate::types::{
    ChangedFile, ContentsResponse, PullRequest, PullRequestPayload, RepoPayload, RepoSummary,
    UserPayload,
};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

/// Default REST API base
pub const GITHUB_API_BASE: &str = "https://api.github.com";

const ACCEPT_JSON: &str = "application/vnd.github+json";
const CLIENT_AGENT: &str = concat!("casegen/", env!("CARGO_PKG_VERSION"));

/// Decode a base64 contents-API payload; embedded line breaks are ignored
///
/// # Errors
/// - `GitHubError::Decode` if the payload is not base64 or not UTF-8
pub fn decode_content(path: &str, encoded: &str) -> Result<String, GitHubError> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| GitHubError::decode(path, e))?;
    String::from_utf8(bytes).map_err(|e| GitHubError::decode(path, e))
}

/// [`SourceHost`] backed by the GitHub REST API
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: String,
}

impl Default for GitHubClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GitHubClient {
    /// Create client against api.github.com
    #[must_use]
    pub fn new() -> Self {
        Self::with_http(reqwest::Client::new())
    }

    /// Create client on an existing HTTP client
    #[must_use]
    pub fn with_http(http: reqwest::Client) -> Self {
        Self {
            http,
            api_base: GITHUB_API_BASE.to_string(),
        }
    }

    /// With API base URL (GitHub Enterprise or a test server)
    #[must_use]
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    /// API base URL
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        token: &str,
        query: &[(&str, &str)],
    ) -> Result<T, GitHubError> {
        tracing::debug!(url, "github GET");
        let response = self
            .http
            .get(url)
            .query(query)
            .bearer_auth(token)
            .header(ACCEPT, ACCEPT_JSON)
            .header(USER_AGENT, CLIENT_AGENT)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(GitHubError::NotFound(url.to_string()));
        }
        let body = response.text().await?;
        if !status.is_success() {
            return Err(GitHubError::Status {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn contents(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        token: &str,
        git_ref: Option<&str>,
    ) -> Result<ContentsResponse, GitHubError> {
        let url = self.url(&format!("repos/{owner}/{repo}/contents/{path}"));
        match git_ref {
            Some(r) => self.get_json(&url, token, &[("ref", r)]).await,
            None => self.get_json(&url, token, &[]).await,
        }
    }

    async fn decoded_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        token: &str,
        git_ref: Option<&str>,
    ) -> Result<String, GitHubError> {
        match self.contents(owner, repo, path, token, git_ref).await? {
            ContentsResponse::File(entry) => {
                decode_content(path, entry.content.as_deref().unwrap_or_default())
            }
            ContentsResponse::Directory(_) => Err(GitHubError::decode(path, "path is a directory")),
        }
    }

    async fn pull_request(
        &self,
        owner: &str,
        repo: &str,
        token: &str,
        number: u64,
    ) -> Result<PullRequest, GitHubError> {
        let url = self.url(&format!("repos/{owner}/{repo}/pulls/{number}"));
        let payload: PullRequestPayload = self.get_json(&url, token, &[]).await?;
        Ok(payload.into())
    }
}

#[async_trait]
impl SourceHost for GitHubClient {
    async fn list_repository_files(
        &self,
        owner: &str,
        repo: &str,
        token: &str,
    ) -> Result<BTreeMap<String, String>, GitHubError> {
        let mut files = BTreeMap::new();
        let mut pending = vec![String::new()];

        while let Some(dir) = pending.pop() {
            let entries = match self.contents(owner, repo, &dir, token, None).await? {
                ContentsResponse::Directory(entries) => entries,
                ContentsResponse::File(entry) => vec![entry],
            };

            for entry in entries {
                match entry.kind.as_str() {
                    "dir" => pending.push(entry.path),
                    "file" => match self.decoded_file(owner, repo, &entry.path, token, None).await {
                        Ok(content) => {
                            files.insert(entry.path, content);
                        }
                        Err(GitHubError::Decode { path, reason }) => {
                            tracing::warn!(%path, %reason, "skipping undecodable file");
                        }
                        Err(e) => return Err(e),
                    },
                    other => tracing::debug!(path = %entry.path, kind = other, "skipping entry"),
                }
            }
        }

        tracing::info!(owner, repo, files = files.len(), "walked repository");
        Ok(files)
    }

    async fn file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        token: &str,
    ) -> Result<String, GitHubError> {
        self.decoded_file(owner, repo, path, token, None).await
    }

    async fn file_content_at(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        token: &str,
        git_ref: &str,
    ) -> Result<String, GitHubError> {
        self.decoded_file(owner, repo, path, token, Some(git_ref)).await
    }

    async fn user_repositories(&self, token: &str) -> Result<Vec<RepoSummary>, GitHubError> {
        let repos: Vec<RepoPayload> = self.get_json(&self.url("user/repos"), token, &[]).await?;
        Ok(repos.into_iter().map(RepoSummary::from).collect())
    }

    async fn repository_owner(
        &self,
        token: &str,
        repo_name: &str,
    ) -> Result<Option<String>, GitHubError> {
        Ok(self
            .user_repositories(token)
            .await?
            .into_iter()
            .find(|r| r.name == repo_name)
            .map(|r| r.owner))
    }

    async fn open_pull_requests(
        &self,
        owner: &str,
        repo: &str,
        token: &str,
    ) -> Result<Vec<PullRequest>, GitHubError> {
        let url = self.url(&format!("repos/{owner}/{repo}/pulls"));
        let prs: Vec<PullRequestPayload> = self.get_json(&url, token, &[("state", "open")]).await?;
        Ok(prs
            .into_iter()
            .map(PullRequest::from)
            .filter(PullRequest::is_open)
            .collect())
    }

    async fn pull_request_files(
        &self,
        owner: &str,
        repo: &str,
        token: &str,
        number: u64,
    ) -> Result<Vec<ChangedFile>, GitHubError> {
        let url = self.url(&format!("repos/{owner}/{repo}/pulls/{number}/files"));
        self.get_json(&url, token, &[]).await
    }

    async fn pull_request_changes(
        &self,
        owner: &str,
        repo: &str,
        token: &str,
        number: u64,
    ) -> Result<String, GitHubError> {
        let pr = self.pull_request(owner, repo, token, number).await?;
        let files = self.pull_request_files(owner, repo, token, number).await?;
        if files.is_empty() {
            return Err(GitHubError::NoChangedFiles(number));
        }

        let mut changes = String::new();
        for file in files.iter().filter(|f| !f.is_removed()) {
            let content = self
                .file_content_at(owner, repo, &file.filename, token, &pr.head_ref)
                .await?;
            changes.push_str(&changed_file_section(&file.filename, &content));
        }

        tracing::debug!(number, files = files.len(), bytes = changes.len(), "collected pull request changes");
        Ok(changes)
    }

    async fn user_login(&self, token: &str) -> Result<String, GitHubError> {
        let user: UserPayload = self.get_json(&self.url("user"), token, &[]).await?;
        Ok(user.login)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_wrapped_base64() {
        // "hello world\n" wrapped the way the contents API wraps at 60 chars
        assert_eq!(decode_content("a.txt", "aGVsbG8g\nd29ybGQK\n").unwrap(), "hello world\n");
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = decode_content("a.txt", "***").unwrap_err();
        assert!(matches!(err, GitHubError::Decode { ref path, .. } if path == "a.txt"));
    }

    #[test]
    fn decode_rejects_non_utf8() {
        // 0xff 0xfe
        assert!(decode_content("logo.png", "//4=").is_err());
    }

    #[test]
    fn api_base_trailing_slash_trimmed() {
        let client = GitHubClient::new().with_api_base("http://localhost:1234/");
        assert_eq!(client.url("/user/repos"), "http://localhost:1234/user/repos");
    }
}
