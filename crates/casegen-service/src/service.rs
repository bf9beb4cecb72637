//! Test-case generation flows
//!
//! [`TestCaseService`] wires a completion client, a source host and a store
//! together. Every flow is: build a prompt, complete it, split the reply,
//! then persist or reconcile.

use crate::config::ServiceConfig;
use crate::error::ServiceError;
use casegen_core::prompts::{self, Prompt};
use casegen_core::{
    extract_title, parse_blocks, reconcile_with_stats, CaseKind, NewTestCase,
    ReconciliationEntry, StoredTestCase, TestCaseBlock, DEFAULT_SEPARATOR,
};
use casegen_github::{
    find_spec_file, guess_spec_file_name, parse_pull_request_event, GitHubClient, GitHubOAuth,
    PullRequest, PullRequestEvent, SourceHost, DEFAULT_SCOPE,
};
use casegen_llm::{build_client, CompletionClient, CompletionRequest};
use casegen_store::{apply_entries, open_store, ApplySummary, TestCaseStore};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt::Write as _;
use std::sync::Arc;

/// Reply text when a file is judged not to need end-to-end tests
pub const SKIPPED_E2E_MESSAGE: &str =
    "No e2e test cases generated: the content was judged irrelevant for e2e testing.";

/// Outcome of end-to-end generation for one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "cases", rename_all = "snake_case")]
pub enum E2eOutcome {
    /// Relevance check answered "No"
    Skipped,
    /// Cases generated and stored
    Generated(Vec<StoredTestCase>),
}

impl E2eOutcome {
    /// Text shown to the caller
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            E2eOutcome::Skipped => SKIPPED_E2E_MESSAGE.to_string(),
            E2eOutcome::Generated(cases) => cases
                .iter()
                .map(|c| c.content.as_str())
                .collect::<Vec<_>>()
                .join("\n\n"),
        }
    }
}

/// Contract case proposed by the LLM, not yet stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractDraft {
    /// Title, or the placeholder
    pub title: String,
    /// Case text
    pub content: String,
}

/// API description located in a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecFile {
    /// Repository path
    pub path: String,
    /// File content
    pub content: String,
}

/// Result of the OAuth callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResult {
    /// GitHub access token
    pub access_token: String,
    /// Login of the authenticated user
    pub user_id: String,
}

/// What a webhook delivery triggered
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookReport {
    /// Pull request number
    pub pull_request: u64,
    /// Files with a patch that were regenerated
    pub files_processed: usize,
    /// Files without a patch
    pub files_skipped: usize,
    /// Cases stored
    pub cases_created: usize,
}

/// Generation and reconciliation flows
pub struct TestCaseService {
    llm: Arc<dyn CompletionClient>,
    host: Arc<dyn SourceHost>,
    store: Arc<dyn TestCaseStore>,
    oauth: Option<GitHubOAuth>,
    separator: String,
    model: Option<String>,
    webhook_token: Option<String>,
}

impl std::fmt::Debug for TestCaseService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestCaseService")
            .field("provider", &self.llm.provider())
            .field("store", &self.store.backend())
            .field("separator", &self.separator)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl TestCaseService {
    /// Create a service over the given collaborators
    pub fn new(
        llm: Arc<dyn CompletionClient>,
        host: Arc<dyn SourceHost>,
        store: Arc<dyn TestCaseStore>,
    ) -> Self {
        Self {
            llm,
            host,
            store,
            oauth: None,
            separator: DEFAULT_SEPARATOR.to_string(),
            model: None,
            webhook_token: None,
        }
    }

    /// Build every collaborator from configuration
    ///
    /// # Errors
    /// Returns error if validation fails or a client/store cannot be built
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ServiceError> {
        config.validate()?;

        let llm = build_client(&config.llm)?;
        let host = Arc::new(GitHubClient::new().with_api_base(config.github.api_base.clone()));
        let store = open_store(&config.store)?;

        let mut service = Self::new(llm, host, store).with_separator(config.separator.clone());
        if !config.github.client_id.is_empty() {
            service = service.with_oauth(
                GitHubOAuth::new(config.github.oauth_app())
                    .with_oauth_base(config.github.oauth_base.clone()),
            );
        }
        if let Some(token) = &config.github.webhook_token {
            service = service.with_webhook_token(token.clone());
        }
        Ok(service)
    }

    /// With separator token requested from and split out of replies
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// With model override for every completion
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// With OAuth client for the login flow
    #[must_use]
    pub fn with_oauth(mut self, oauth: GitHubOAuth) -> Self {
        self.oauth = Some(oauth);
        self
    }

    /// With token for reading pull requests named by webhooks
    #[must_use]
    pub fn with_webhook_token(mut self, token: impl Into<String>) -> Self {
        self.webhook_token = Some(token.into());
        self
    }

    /// Backing store
    #[must_use]
    pub fn store(&self) -> &Arc<dyn TestCaseStore> {
        &self.store
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String, ServiceError> {
        let mut request = CompletionRequest::new(prompt.text.clone(), prompt.temperature);
        if let Some(model) = &self.model {
            request = request.with_model(model.clone());
        }
        Ok(self.llm.complete(request).await?)
    }

    async fn complete_blocks(&self, prompt: Prompt) -> Result<Vec<TestCaseBlock>, ServiceError> {
        let reply = self.complete(&prompt).await?;
        let blocks = parse_blocks(&reply, &prompt.split_style)?;
        tracing::debug!(blocks = blocks.len(), reply_len = reply.len(), "parsed completion");
        Ok(blocks)
    }

    fn store_blocks(
        &self,
        kind: CaseKind,
        file_name: &str,
        test_repo: Option<&str>,
        blocks: Vec<TestCaseBlock>,
    ) -> Result<Vec<StoredTestCase>, ServiceError> {
        blocks
            .into_iter()
            .map(|block| {
                let mut case = NewTestCase::new(kind, file_name, block.body);
                if let Some(title) = block.title {
                    case = case.with_title(title);
                }
                if let Some(repo) = test_repo {
                    case = case.with_repo(repo);
                }
                Ok(self.store.create(case)?)
            })
            .collect()
    }

    // -- end-to-end flows --

    /// Relevance check, then generate and store end-to-end cases for a file
    ///
    /// # Errors
    /// Propagates completion and store failures
    pub async fn generate_e2e(&self, file_name: &str, content: &str) -> Result<E2eOutcome, ServiceError> {
        self.generate_e2e_in(file_name, content, None).await
    }

    async fn generate_e2e_in(
        &self,
        file_name: &str,
        content: &str,
        test_repo: Option<&str>,
    ) -> Result<E2eOutcome, ServiceError> {
        let answer = self.complete(&prompts::e2e_relevance(content)).await?;
        if prompts::is_not_relevant(&answer) {
            tracing::info!(file_name, "file does not need e2e tests");
            return Ok(E2eOutcome::Skipped);
        }

        let blocks = self.complete_blocks(prompts::e2e_generation(content, &self.separator)).await?;
        let cases = self.store_blocks(CaseKind::E2e, file_name, test_repo, blocks)?;
        tracing::info!(file_name, cases = cases.len(), "generated e2e test cases");
        Ok(E2eOutcome::Generated(cases))
    }

    /// Update end-to-end cases of a file for a diff; new cases are appended
    ///
    /// # Errors
    /// Propagates completion and store failures
    pub async fn generate_e2e_for_changes(
        &self,
        file_name: &str,
        patch: &str,
    ) -> Result<Vec<StoredTestCase>, ServiceError> {
        let existing = self.store.find_by_file(CaseKind::E2e, file_name)?;
        let blocks = self
            .complete_blocks(prompts::e2e_update(file_name, patch, &existing, &self.separator))
            .await?;
        let cases = self.store_blocks(CaseKind::E2e, file_name, None, blocks)?;
        tracing::info!(file_name, existing = existing.len(), cases = cases.len(), "updated e2e test cases");
        Ok(cases)
    }

    /// Run [`Self::generate_e2e`] over every file of a repository
    ///
    /// Returns one `File: <path>` section per file.
    ///
    /// # Errors
    /// Propagates host, completion and store failures
    pub async fn generate_for_repository(
        &self,
        owner: &str,
        repo: &str,
        token: &str,
    ) -> Result<String, ServiceError> {
        let files = self.host.list_repository_files(owner, repo, token).await?;
        let mut out = String::new();
        for (path, content) in &files {
            let outcome = self.generate_e2e_in(path, content, Some(repo)).await?;
            let _ = write!(out, "File: {path}\n{}\n\n", outcome.render());
        }
        Ok(out)
    }

    // -- contract flows --

    /// First Swagger/OpenAPI file of a repository
    ///
    /// # Errors
    /// - `ServiceError::SpecFileNotFound` if there is none
    pub async fn locate_spec(&self, owner: &str, repo: &str, token: &str) -> Result<SpecFile, ServiceError> {
        let files = self.host.list_repository_files(owner, repo, token).await?;
        let (path, content) = find_spec_file(&files).ok_or(ServiceError::SpecFileNotFound)?;
        tracing::debug!(owner, repo, path, "located api description");
        Ok(SpecFile {
            path: path.to_string(),
            content: content.to_string(),
        })
    }

    /// Propose initial contract cases for an API description
    ///
    /// # Errors
    /// Propagates completion failures
    pub async fn generate_initial_contract(
        &self,
        file_name: &str,
        swagger: &str,
    ) -> Result<Vec<ContractDraft>, ServiceError> {
        let blocks = self.complete_blocks(prompts::contract_initial(swagger, &self.separator)).await?;
        tracing::info!(file_name, cases = blocks.len(), "generated initial contract test cases");
        Ok(blocks
            .into_iter()
            .map(|block| ContractDraft {
                title: block.title_or_default().to_string(),
                content: block.body,
            })
            .collect())
    }

    /// [`Self::generate_initial_contract`] for the repository's API description
    ///
    /// # Errors
    /// - `ServiceError::SpecFileNotFound` if the repository has none
    pub async fn generate_initial_contract_for_repo(
        &self,
        owner: &str,
        repo: &str,
        token: &str,
    ) -> Result<Vec<ContractDraft>, ServiceError> {
        let spec = self.locate_spec(owner, repo, token).await?;
        self.generate_initial_contract(&spec.path, &spec.content).await
    }

    /// Store accepted contract cases
    ///
    /// # Errors
    /// - `ServiceError::EmptyInput` if `cases` holds no text
    pub fn save_contract_cases(
        &self,
        file_name: &str,
        test_repo: Option<&str>,
        cases: &[String],
    ) -> Result<Vec<StoredTestCase>, ServiceError> {
        let cases: Vec<&str> = cases
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .collect();
        if cases.is_empty() {
            return Err(ServiceError::EmptyInput(
                "The list of contract test cases is empty.".into(),
            ));
        }

        let mut stored = Vec::with_capacity(cases.len());
        for content in cases {
            let mut case = NewTestCase::new(CaseKind::Contract, file_name, content)
                .with_title(extract_title(content));
            if let Some(repo) = test_repo {
                case = case.with_repo(repo);
            }
            stored.push(self.store.create(case)?);
        }
        tracing::info!(file_name, repo = test_repo, cases = stored.len(), "saved contract test cases");
        Ok(stored)
    }

    /// [`Self::save_contract_cases`] under the repository's API description
    ///
    /// # Errors
    /// - `ServiceError::EmptyInput` if `cases` holds no text
    /// - `ServiceError::SpecFileNotFound` if the repository has none
    pub async fn save_contract_cases_for_repo(
        &self,
        owner: &str,
        repo: &str,
        token: &str,
        cases: &[String],
    ) -> Result<Vec<StoredTestCase>, ServiceError> {
        if cases.iter().all(|c| c.trim().is_empty()) {
            return Err(ServiceError::EmptyInput(
                "The list of contract test cases is empty.".into(),
            ));
        }
        let spec = self.locate_spec(owner, repo, token).await?;
        self.save_contract_cases(&spec.path, Some(repo), cases)
    }

    /// Ask the LLM to reconcile stored contract cases with PR changes
    ///
    /// Nothing is written; apply the entries with
    /// [`Self::apply_contract_updates`].
    ///
    /// # Errors
    /// Propagates completion and store failures
    pub async fn generate_updated_contract(
        &self,
        file_name: &str,
        pr_changes: &str,
        swagger: &str,
    ) -> Result<Vec<ReconciliationEntry>, ServiceError> {
        let existing = self.store.find_by_file(CaseKind::Contract, file_name)?;
        let blocks = self
            .complete_blocks(prompts::contract_update(
                file_name,
                swagger,
                pr_changes,
                &existing,
                &self.separator,
            ))
            .await?;
        let (entries, stats) = reconcile_with_stats(&blocks, &existing);

        tracing::info!(
            file_name,
            existing = existing.len(),
            entries = entries.len(),
            unchanged = stats.unchanged,
            skipped = stats.skipped,
            unresolved = stats.unresolved,
            "reconciled contract test cases"
        );
        Ok(entries)
    }

    /// Open pull request with the given title
    ///
    /// # Errors
    /// - `ServiceError::PullRequestNotFound` if no open PR has that title
    pub async fn find_pull_request(
        &self,
        owner: &str,
        repo: &str,
        token: &str,
        title: &str,
    ) -> Result<PullRequest, ServiceError> {
        self.host
            .open_pull_requests(owner, repo, token)
            .await?
            .into_iter()
            .find(|pr| pr.title == title)
            .ok_or_else(|| ServiceError::PullRequestNotFound(title.to_string()))
    }

    /// [`Self::generate_updated_contract`] for an open pull request
    ///
    /// When the default branch has no API description yet, the file named in
    /// the changes is used with empty original content.
    ///
    /// # Errors
    /// - `ServiceError::PullRequestNotFound` if no open PR has that title
    pub async fn generate_updated_contract_for_pr(
        &self,
        owner: &str,
        repo: &str,
        token: &str,
        pr_title: &str,
    ) -> Result<Vec<ReconciliationEntry>, ServiceError> {
        let pr = self.find_pull_request(owner, repo, token, pr_title).await?;
        let changes = self
            .host
            .pull_request_changes(owner, repo, token, pr.number)
            .await?;

        let spec = match self.locate_spec(owner, repo, token).await {
            Ok(spec) => spec,
            Err(ServiceError::SpecFileNotFound) => {
                let path = guess_spec_file_name(&changes);
                tracing::warn!(owner, repo, path, "no api description on default branch");
                SpecFile {
                    path: path.to_string(),
                    content: String::new(),
                }
            }
            Err(e) => return Err(e),
        };

        self.generate_updated_contract(&spec.path, &changes, &spec.content)
            .await
    }

    /// Apply reconciliation entries to stored contract cases
    ///
    /// # Errors
    /// - `ServiceError::EmptyInput` if `entries` is empty
    pub fn apply_contract_updates(
        &self,
        file_name: &str,
        test_repo: Option<&str>,
        entries: &[ReconciliationEntry],
    ) -> Result<ApplySummary, ServiceError> {
        if entries.is_empty() {
            return Err(ServiceError::EmptyInput(
                "The list of contract test cases is empty.".into(),
            ));
        }
        Ok(apply_entries(
            self.store.as_ref(),
            CaseKind::Contract,
            file_name,
            test_repo,
            entries,
        )?)
    }

    /// [`Self::apply_contract_updates`] under the repository's API description
    ///
    /// # Errors
    /// - `ServiceError::EmptyInput` if `entries` is empty
    /// - `ServiceError::SpecFileNotFound` if the repository has none
    pub async fn apply_contract_updates_for_repo(
        &self,
        owner: &str,
        repo: &str,
        token: &str,
        entries: &[ReconciliationEntry],
    ) -> Result<ApplySummary, ServiceError> {
        if entries.is_empty() {
            return Err(ServiceError::EmptyInput(
                "The list of contract test cases is empty.".into(),
            ));
        }
        let spec = self.locate_spec(owner, repo, token).await?;
        self.apply_contract_updates(&spec.path, Some(repo), entries)
    }

    /// Stored contract cases, optionally for one repository
    ///
    /// # Errors
    /// Propagates store failures
    pub fn list_contract_cases(&self, test_repo: Option<&str>) -> Result<Vec<StoredTestCase>, ServiceError> {
        let cases = match test_repo.filter(|r| !r.is_empty()) {
            Some(repo) => self.store.find_by_repo(CaseKind::Contract, repo)?,
            None => self.store.list(CaseKind::Contract)?,
        };
        Ok(cases)
    }

    /// Reformat one case as Markdown
    ///
    /// # Errors
    /// - `ServiceError::EmptyInput` for blank content
    pub async fn convert_to_markdown(&self, content: &str) -> Result<String, ServiceError> {
        if content.trim().is_empty() {
            return Err(ServiceError::EmptyInput("test case content is empty".into()));
        }
        let reply = self.complete(&prompts::markdown_conversion(content)).await?;
        Ok(reply.trim().to_string())
    }

    // -- repository browsing --

    /// Names of the user's repositories
    ///
    /// # Errors
    /// Propagates host failures
    pub async fn user_repository_names(&self, token: &str) -> Result<Vec<String>, ServiceError> {
        Ok(self
            .host
            .user_repositories(token)
            .await?
            .into_iter()
            .map(|r| r.name)
            .collect())
    }

    /// Owner login of one of the user's repositories
    ///
    /// # Errors
    /// - `ServiceError::RepositoryNotFound` if the user has no such repository
    pub async fn repository_owner(&self, token: &str, repo_name: &str) -> Result<String, ServiceError> {
        self.host
            .repository_owner(token, repo_name)
            .await?
            .ok_or_else(|| ServiceError::RepositoryNotFound(repo_name.to_string()))
    }

    /// Open pull requests of a repository
    ///
    /// # Errors
    /// Propagates host failures
    pub async fn open_pull_requests(
        &self,
        owner: &str,
        repo: &str,
        token: &str,
    ) -> Result<Vec<PullRequest>, ServiceError> {
        Ok(self.host.open_pull_requests(owner, repo, token).await?)
    }

    // -- login and webhooks --

    fn oauth(&self) -> Result<&GitHubOAuth, ServiceError> {
        self.oauth
            .as_ref()
            .ok_or_else(|| ServiceError::NotConfigured("github.client_id".into()))
    }

    /// GitHub authorize URL to redirect the browser to
    ///
    /// # Errors
    /// - `ServiceError::NotConfigured` without OAuth credentials
    pub fn login_redirect(&self) -> Result<String, ServiceError> {
        Ok(self.oauth()?.authorize_url(DEFAULT_SCOPE)?)
    }

    /// Exchange the callback code and identify the user
    ///
    /// # Errors
    /// - `ServiceError::NotConfigured` without OAuth credentials
    /// - `ServiceError::GitHub` if the exchange or user lookup fails
    pub async fn complete_login(&self, code: &str) -> Result<LoginResult, ServiceError> {
        let access_token = self.oauth()?.exchange_code(code).await?;
        let user_id = self.host.user_login(&access_token).await?;
        tracing::info!(%user_id, "user logged in");
        Ok(LoginResult {
            access_token,
            user_id,
        })
    }

    /// Validate and process a webhook delivery
    ///
    /// # Errors
    /// - `ServiceError::GitHub` with a rejected-event error for unsupported deliveries
    pub async fn handle_webhook(
        &self,
        event: &str,
        payload: &JsonValue,
    ) -> Result<WebhookReport, ServiceError> {
        let event = parse_pull_request_event(event, payload)?;
        self.handle_pull_request_event(&event).await
    }

    /// Regenerate end-to-end cases for every patched file of a pull request
    ///
    /// # Errors
    /// - `ServiceError::NotConfigured` without a webhook token
    pub async fn handle_pull_request_event(
        &self,
        event: &PullRequestEvent,
    ) -> Result<WebhookReport, ServiceError> {
        let token = self
            .webhook_token
            .as_deref()
            .ok_or_else(|| ServiceError::NotConfigured("github.webhook_token".into()))?;

        tracing::info!(
            owner = %event.owner,
            repo = %event.repo,
            number = event.number,
            action = %event.action,
            "handling pull request event"
        );

        let files = self
            .host
            .pull_request_files(&event.owner, &event.repo, token, event.number)
            .await?;

        let mut report = WebhookReport {
            pull_request: event.number,
            ..WebhookReport::default()
        };
        for file in &files {
            let Some(patch) = file.patch.as_deref() else {
                report.files_skipped += 1;
                continue;
            };
            let cases = self.generate_e2e_for_changes(&file.filename, patch).await?;
            report.files_processed += 1;
            report.cases_created += cases.len();
        }
        Ok(report)
    }
}

