//! HTTP routes
//!
//! Query parameter names match the browser client: `accessToken` on the
//! repository report, snake_case everywhere else.

use crate::error::{handle_rejection, reject};
use casegen_core::{ReconciliationEntry, StoredTestCase, DEFAULT_TITLE};
use casegen_service::{ConfigError, ServiceError, TestCaseService};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::{StatusCode, Uri};
use warp::reply::{Reply, Response};
use warp::{Filter, Rejection};

type Shared = Arc<TestCaseService>;

/// Largest accepted request body
pub const BODY_LIMIT: u64 = 4 * 1024 * 1024;

/// Reply to a successful save or update
pub const SAVED_MESSAGE: &str = "Contract test cases have been saved successfully.";

/// Reply when generation produced nothing
pub const NOTHING_GENERATED_MESSAGE: &str = "No contract test cases were generated.";

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub owner: String,
    pub repo: String,
    #[serde(rename = "accessToken")]
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct RepoOwnerQuery {
    pub access_token: String,
    pub repo_name: String,
}

#[derive(Debug, Deserialize)]
pub struct RepoQuery {
    pub owner: String,
    pub repo_name: String,
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct PullRequestQuery {
    pub owner: String,
    pub repo_name: String,
    pub access_token: String,
    pub pr_name: String,
}

#[derive(Debug, Deserialize)]
pub struct TestRepoQuery {
    pub test_repo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MarkdownRequest {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MarkdownResponse {
    pub markdown: String,
}

/// Open pull request as listed to the browser
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PullRequestSummary {
    pub title: String,
    pub creation_date: String,
}

/// Stored contract case as listed to the browser
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaseView {
    pub id: String,
    pub title: String,
    pub content: String,
}

impl From<StoredTestCase> for CaseView {
    fn from(case: StoredTestCase) -> Self {
        Self {
            id: case.id.to_string(),
            title: case.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            content: case.content,
        }
    }
}

fn with_service(service: Shared) -> impl Filter<Extract = (Shared,), Error = Infallible> + Clone {
    warp::any().map(move || service.clone())
}

fn json_body<T: DeserializeOwned + Send>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
    warp::body::content_length_limit(BODY_LIMIT).and(warp::body::json())
}

fn text(status: StatusCode, body: impl Into<String>) -> Response {
    warp::reply::with_status(body.into(), status).into_response()
}

/// Every route, with rejection recovery and request tracing
pub fn routes(service: Shared) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let api = warp::path("api").and(
        generate_report(service.clone())
            .or(user_repos(service.clone()))
            .unify()
            .or(repo_owner(service.clone()))
            .unify()
            .or(open_pull_requests(service.clone()))
            .unify()
            .or(generate_contract(service.clone()))
            .unify()
            .or(save_contract(service.clone()))
            .unify()
            .or(update_contract(service.clone()))
            .unify()
            .or(generate_updated_contract(service.clone()))
            .unify()
            .or(contract_cases(service.clone()))
            .unify()
            .or(markdown(service.clone()))
            .unify(),
    );

    health()
        .or(login(service.clone()))
        .unify()
        .or(callback(service.clone()))
        .unify()
        .or(api)
        .unify()
        .or(webhook(service))
        .unify()
        .recover(handle_rejection)
        .with(warp::trace::request())
}

/// `GET /health`
pub fn health() -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("health").and(warp::get()).map(|| {
        warp::reply::json(&serde_json::json!({
            "status": "ok",
            "version": crate::VERSION,
        }))
        .into_response()
    })
}

// -- auth --

fn login(service: Shared) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("auth" / "github")
        .and(warp::get())
        .and(with_service(service))
        .and_then(|service: Shared| async move {
            let url = service.login_redirect().map_err(reject)?;
            let uri: Uri = url.parse().map_err(|e: warp::http::uri::InvalidUri| {
                reject(ServiceError::Config(ConfigError::Invalid(format!(
                    "authorize url: {e}"
                ))))
            })?;
            Ok::<_, Rejection>(warp::redirect::found(uri).into_response())
        })
}

fn callback(service: Shared) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("auth" / "github" / "callback")
        .and(warp::get())
        .and(warp::query::<CallbackQuery>())
        .and(with_service(service))
        .and_then(|query: CallbackQuery, service: Shared| async move {
            let login = service.complete_login(&query.code).await.map_err(reject)?;
            let pair = [
                format!("access_token={}", login.access_token),
                format!("user_id={}", login.user_id),
            ];
            Ok::<_, Rejection>(warp::reply::json(&pair).into_response())
        })
}

// -- repository browsing --

fn generate_report(service: Shared) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("generate-ai-test-cases")
        .and(warp::get())
        .and(warp::query::<ReportQuery>())
        .and(with_service(service))
        .and_then(|q: ReportQuery, service: Shared| async move {
            let report = service
                .generate_for_repository(&q.owner, &q.repo, &q.access_token)
                .await
                .map_err(reject)?;
            Ok::<_, Rejection>(text(StatusCode::OK, report))
        })
}

fn user_repos(service: Shared) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("user" / "repos")
        .and(warp::get())
        .and(warp::query::<TokenQuery>())
        .and(with_service(service))
        .and_then(|q: TokenQuery, service: Shared| async move {
            let names = service
                .user_repository_names(&q.access_token)
                .await
                .map_err(reject)?;
            Ok::<_, Rejection>(warp::reply::json(&names).into_response())
        })
}

fn repo_owner(service: Shared) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("user" / "repo-owner")
        .and(warp::get())
        .and(warp::query::<RepoOwnerQuery>())
        .and(with_service(service))
        .and_then(|q: RepoOwnerQuery, service: Shared| async move {
            let owner = service
                .repository_owner(&q.access_token, &q.repo_name)
                .await
                .map_err(reject)?;
            Ok::<_, Rejection>(text(StatusCode::OK, owner))
        })
}

fn open_pull_requests(service: Shared) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("user" / "repo" / "prs")
        .and(warp::get())
        .and(warp::query::<RepoQuery>())
        .and(with_service(service))
        .and_then(|q: RepoQuery, service: Shared| async move {
            let prs: Vec<PullRequestSummary> = service
                .open_pull_requests(&q.owner, &q.repo_name, &q.access_token)
                .await
                .map_err(reject)?
                .into_iter()
                .filter(|pr| pr.is_open())
                .map(|pr| PullRequestSummary {
                    title: pr.title,
                    creation_date: pr.created_at,
                })
                .collect();
            Ok::<_, Rejection>(warp::reply::json(&prs).into_response())
        })
}

// -- contract cases --

fn generate_contract(service: Shared) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("generate-contract-test-cases")
        .and(warp::get())
        .and(warp::query::<RepoQuery>())
        .and(with_service(service))
        .and_then(|q: RepoQuery, service: Shared| async move {
            let drafts = service
                .generate_initial_contract_for_repo(&q.owner, &q.repo_name, &q.access_token)
                .await
                .map_err(reject)?;
            if drafts.is_empty() {
                return Ok::<_, Rejection>(text(StatusCode::NOT_FOUND, NOTHING_GENERATED_MESSAGE));
            }
            let contents: Vec<String> = drafts.into_iter().map(|d| d.content).collect();
            Ok(warp::reply::json(&contents).into_response())
        })
}

fn save_contract(service: Shared) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("save-contract-test-cases")
        .and(warp::post())
        .and(warp::query::<RepoQuery>())
        .and(json_body::<Vec<String>>())
        .and(with_service(service))
        .and_then(|q: RepoQuery, cases: Vec<String>, service: Shared| async move {
            service
                .save_contract_cases_for_repo(&q.owner, &q.repo_name, &q.access_token, &cases)
                .await
                .map_err(reject)?;
            Ok::<_, Rejection>(text(StatusCode::CREATED, SAVED_MESSAGE))
        })
}

fn update_contract(service: Shared) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("update-contract-test-cases")
        .and(warp::post())
        .and(warp::query::<RepoQuery>())
        .and(json_body::<Vec<ReconciliationEntry>>())
        .and(with_service(service))
        .and_then(
            |q: RepoQuery, entries: Vec<ReconciliationEntry>, service: Shared| async move {
                let summary = service
                    .apply_contract_updates_for_repo(&q.owner, &q.repo_name, &q.access_token, &entries)
                    .await
                    .map_err(reject)?;
                tracing::info!(
                    repo = %q.repo_name,
                    created = summary.created,
                    updated = summary.updated,
                    deleted = summary.deleted,
                    missing = summary.missing,
                    "applied contract updates"
                );
                Ok::<_, Rejection>(text(StatusCode::CREATED, SAVED_MESSAGE))
            },
        )
}

fn generate_updated_contract(
    service: Shared,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("generate-updated-contract-test-cases")
        .and(warp::get())
        .and(warp::query::<PullRequestQuery>())
        .and(with_service(service))
        .and_then(|q: PullRequestQuery, service: Shared| async move {
            let entries = service
                .generate_updated_contract_for_pr(&q.owner, &q.repo_name, &q.access_token, &q.pr_name)
                .await
                .map_err(reject)?;
            Ok::<_, Rejection>(warp::reply::json(&entries).into_response())
        })
}

fn contract_cases(service: Shared) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("contract-test-cases")
        .and(warp::get())
        .and(warp::query::<TestRepoQuery>())
        .and(with_service(service))
        .and_then(|q: TestRepoQuery, service: Shared| async move {
            let cases: Vec<CaseView> = service
                .list_contract_cases(q.test_repo.as_deref())
                .map_err(reject)?
                .into_iter()
                .map(CaseView::from)
                .collect();
            Ok::<_, Rejection>(warp::reply::json(&cases).into_response())
        })
}

fn markdown(service: Shared) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("markdown")
        .and(warp::post())
        .and(json_body::<MarkdownRequest>())
        .and(with_service(service))
        .and_then(|body: MarkdownRequest, service: Shared| async move {
            let markdown = service
                .convert_to_markdown(&body.content)
                .await
                .map_err(reject)?;
            Ok::<_, Rejection>(warp::reply::json(&MarkdownResponse { markdown }).into_response())
        })
}

// -- webhook --

fn webhook(service: Shared) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("webhook")
        .and(warp::post())
        .and(warp::header::<String>("x-github-event"))
        .and(json_body::<JsonValue>())
        .and(with_service(service))
        .and_then(|event: String, payload: JsonValue, service: Shared| async move {
            let report = service
                .handle_webhook(&event, &payload)
                .await
                .map_err(reject)?;
            Ok::<_, Rejection>(warp::reply::json(&report).into_response())
        })
}
