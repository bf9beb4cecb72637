//! GitHubClient against a local fake REST API

use casegen_github::{find_spec_file, GitHubClient, GitHubError, SourceHost};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashMap;
use warp::Filter;

// base64 of "openapi: 3.0.0\n" and "console.log(1)\n"
const SPEC_B64: &str = "b3BlbmFwaTog\nMy4wLjAK";
const APP_B64: &str = "Y29uc29sZS5sb2coMSkK";

fn fake_api() -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let contents = warp::get()
        .and(warp::path!("repos" / "acme" / "petstore" / "contents" / ..))
        .and(warp::path::tail())
        .and(warp::query::<HashMap<String, String>>())
        .map(|tail: warp::path::Tail, query: HashMap<String, String>| {
            let body = match (tail.as_str(), query.get("ref").map(String::as_str)) {
                ("", _) => json!([
                    {"path": "api", "type": "dir"},
                    {"path": "app.js", "type": "file"},
                    {"path": "vendor", "type": "submodule"}
                ]),
                ("api", _) => json!([{"path": "api/openapi.yaml", "type": "file"}]),
                ("api/openapi.yaml", Some("feature/pets")) => {
                    json!({"path": "api/openapi.yaml", "type": "file", "content": "b3BlbmFwaTogMy4xLjAK"})
                }
                ("api/openapi.yaml", _) => {
                    json!({"path": "api/openapi.yaml", "type": "file", "content": SPEC_B64})
                }
                ("app.js", _) => json!({"path": "app.js", "type": "file", "content": APP_B64}),
                _ => json!({"message": "Not Found"}),
            };
            warp::reply::json(&body)
        });

    let pulls = warp::get()
        .and(warp::path!("repos" / "acme" / "petstore" / "pulls"))
        .map(|| {
            warp::reply::json(&json!([
                {"number": 7, "title": "Add pets", "state": "open", "created_at": "2024-05-01T00:00:00Z", "head": {"ref": "feature/pets"}},
                {"number": 6, "title": "Old", "state": "closed", "created_at": "2024-04-01T00:00:00Z", "head": {"ref": "old"}}
            ]))
        });

    let pull = warp::get()
        .and(warp::path!("repos" / "acme" / "petstore" / "pulls" / u64))
        .map(|number: u64| {
            warp::reply::json(&json!({
                "number": number, "title": "Add pets", "state": "open",
                "created_at": "2024-05-01T00:00:00Z", "head": {"ref": "feature/pets"}
            }))
        });

    let pull_files = warp::get()
        .and(warp::path!("repos" / "acme" / "petstore" / "pulls" / u64 / "files"))
        .map(|number: u64| {
            let files = if number == 7 {
                json!([
                    {"filename": "api/openapi.yaml", "status": "modified", "patch": "@@ -1 +1 @@"},
                    {"filename": "old.txt", "status": "removed"}
                ])
            } else {
                json!([])
            };
            warp::reply::json(&files)
        });

    let repos = warp::get().and(warp::path!("user" / "repos")).map(|| {
        warp::reply::json(&json!([
            {"name": "petstore", "owner": {"login": "acme"}},
            {"name": "blog", "owner": {"login": "someone"}}
        ]))
    });

    let user = warp::get()
        .and(warp::path!("user"))
        .and(warp::header::<String>("authorization"))
        .map(|auth: String| {
            if auth == "Bearer good" {
                warp::reply::with_status(
                    warp::reply::json(&json!({"login": "octocat"})),
                    warp::http::StatusCode::OK,
                )
            } else {
                warp::reply::with_status(
                    warp::reply::json(&json!({"message": "Bad credentials"})),
                    warp::http::StatusCode::UNAUTHORIZED,
                )
            }
        });

    contents
        .or(pull_files)
        .or(pull)
        .or(pulls)
        .or(repos)
        .or(user)
}

fn client() -> GitHubClient {
    let (addr, server) = warp::serve(fake_api()).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    GitHubClient::new().with_api_base(format!("http://{addr}"))
}

#[tokio::test]
async fn walks_repository_recursively() {
    let host = client();
    let files = host.list_repository_files("acme", "petstore", "good").await.unwrap();

    assert_eq!(
        files.keys().cloned().collect::<Vec<_>>(),
        vec!["api/openapi.yaml".to_string(), "app.js".to_string()]
    );
    assert_eq!(files["app.js"], "console.log(1)\n");
    assert_eq!(
        find_spec_file(&files),
        Some(("api/openapi.yaml", "openapi: 3.0.0\n"))
    );
}

#[tokio::test]
async fn open_pull_requests_filters_closed() {
    let prs = client().open_pull_requests("acme", "petstore", "good").await.unwrap();
    assert_eq!(prs.len(), 1);
    assert_eq!(prs[0].title, "Add pets");
    assert_eq!(prs[0].head_ref, "feature/pets");
}

#[tokio::test]
async fn pull_request_changes_reads_head_branch() {
    let changes = client().pull_request_changes("acme", "petstore", "good", 7).await.unwrap();
    assert_eq!(changes, "### File: api/openapi.yaml\nopenapi: 3.1.0\n\n\n");
}

#[tokio::test]
async fn pull_request_without_files_is_an_error() {
    let err = client()
        .pull_request_changes("acme", "petstore", "good", 8)
        .await
        .unwrap_err();
    assert!(matches!(err, GitHubError::NoChangedFiles(8)));
}

#[tokio::test]
async fn repository_owner_lookup() {
    let host = client();
    assert_eq!(
        host.repository_owner("good", "blog").await.unwrap().as_deref(),
        Some("someone")
    );
    assert_eq!(host.repository_owner("good", "missing").await.unwrap(), None);
}

#[tokio::test]
async fn bad_credentials_surface_status() {
    let host = client();
    assert_eq!(host.user_login("good").await.unwrap(), "octocat");
    let err = host.user_login("bad").await.unwrap_err();
    assert!(matches!(err, GitHubError::Status { status: 401, .. }));
}
