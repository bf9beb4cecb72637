//! End-to-end flow tests over scripted collaborators

use casegen_core::{CaseKind, ReconciliationEntry, DEFAULT_TITLE};
use casegen_github::{GitHubError, MockSourceHost};
use casegen_service::{E2eOutcome, ServiceError, TestCaseService, SKIPPED_E2E_MESSAGE};
use casegen_store::{MemoryStore, TestCaseStore};
use casegen_test_utils::{
    changed_file, host_with_files, pull_request, repo_files, seeded_contract_store, update_reply,
    ScriptedCompletionClient, INITIAL_CONTRACT_REPLY, SWAGGER, SWAGGER_PATH,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

struct Harness {
    llm: Arc<ScriptedCompletionClient>,
    store: Arc<MemoryStore>,
    service: TestCaseService,
}

fn harness(host: MockSourceHost, store: Arc<MemoryStore>, replies: &[&str]) -> Harness {
    let llm = Arc::new(ScriptedCompletionClient::with_replies(replies.iter().copied()));
    let service = TestCaseService::new(llm.clone(), Arc::new(host), store.clone());
    Harness {
        llm,
        store,
        service,
    }
}

fn host_with_pr(title: &'static str, changes: &'static str) -> MockSourceHost {
    let mut host = host_with_files(repo_files(&[(SWAGGER_PATH, SWAGGER), ("src/main.rs", "fn main() {}")]));
    host.expect_open_pull_requests()
        .returning(move |_, _, _| Ok(vec![pull_request(12, title)]));
    host.expect_pull_request_changes()
        .returning(move |_, _, _, _| Ok(changes.to_string()));
    host
}

#[tokio::test]
async fn e2e_generation_stores_each_block() {
    let h = harness(
        MockSourceHost::new(),
        Arc::new(MemoryStore::new()),
        &["Yes", "Login works ROW_SEPARATOR\nLogout works ROW_SEPARATOR\n"],
    );

    let outcome = h.service.generate_e2e("app.js", "<button/>").await.unwrap();
    let E2eOutcome::Generated(cases) = outcome else {
        panic!("expected generated cases");
    };
    assert_eq!(cases.len(), 2);
    assert_eq!(cases[0].content, "Login works");
    assert_eq!(h.store.find_by_file(CaseKind::E2e, "app.js").unwrap().len(), 2);

    let requests = h.llm.requests();
    assert_eq!(requests[0].temperature, 0.0);
    assert!(requests[1].prompt.contains("<button/>"));
}

#[tokio::test]
async fn irrelevant_file_is_skipped() {
    let h = harness(MockSourceHost::new(), Arc::new(MemoryStore::new()), &[" no "]);

    let outcome = h.service.generate_e2e("styles.css", "body {}").await.unwrap();
    assert_eq!(outcome, E2eOutcome::Skipped);
    assert!(h.store.is_empty());
    assert_eq!(h.llm.remaining(), 0);
}

#[tokio::test]
async fn repository_report_has_one_section_per_file() {
    let host = host_with_files(repo_files(&[("a.js", "click()"), ("b.css", "p {}")]));
    let h = harness(
        host,
        Arc::new(MemoryStore::new()),
        &["Yes", "Click case ROW_SEPARATOR\n", "No"],
    );

    let report = h
        .service
        .generate_for_repository("acme", "web", "tok")
        .await
        .unwrap();
    assert_eq!(
        report,
        format!("File: a.js\nClick case\n\nFile: b.css\n{SKIPPED_E2E_MESSAGE}\n\n")
    );
    let rows = h.store.find_by_repo(CaseKind::E2e, "web").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].file_name, "a.js");
}

#[tokio::test]
async fn e2e_update_sees_existing_cases() {
    let store = Arc::new(MemoryStore::new());
    store
        .create(casegen_core::NewTestCase::new(CaseKind::E2e, "app.js", "Old login case"))
        .unwrap();
    let h = harness(MockSourceHost::new(), store, &["New login case ROW_SEPARATOR\n"]);

    let cases = h
        .service
        .generate_e2e_for_changes("app.js", "+ <input/>")
        .await
        .unwrap();
    assert_eq!(cases.len(), 1);
    assert!(h.llm.requests()[0].prompt.contains("Old login case"));
    assert_eq!(h.store.len(), 2);
}

#[tokio::test]
async fn initial_contract_drafts_carry_titles() {
    let host = host_with_files(repo_files(&[(SWAGGER_PATH, SWAGGER)]));
    let h = harness(host, Arc::new(MemoryStore::new()), &[INITIAL_CONTRACT_REPLY]);

    let drafts = h
        .service
        .generate_initial_contract_for_repo("acme", "pets", "tok")
        .await
        .unwrap();
    assert_eq!(drafts.len(), 2);
    assert_eq!(drafts[0].title, "List pets returns 200");
    assert!(h.llm.requests()[0].prompt.contains("/pets"));
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn missing_spec_file_is_not_found() {
    let host = host_with_files(repo_files(&[("README.md", "hi")]));
    let h = harness(host, Arc::new(MemoryStore::new()), &[]);

    let err = h
        .service
        .generate_initial_contract_for_repo("acme", "pets", "tok")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::SpecFileNotFound));
    assert!(err.is_not_found());
}

#[tokio::test]
async fn save_contract_cases_under_spec_path() {
    let host = host_with_files(repo_files(&[(SWAGGER_PATH, SWAGGER)]));
    let h = harness(host, Arc::new(MemoryStore::new()), &[]);

    let cases = vec![
        "## Test Case Title: List pets\nbody".to_string(),
        "   ".to_string(),
        "no title here".to_string(),
    ];
    let stored = h
        .service
        .save_contract_cases_for_repo("acme", "pets", "tok", &cases)
        .await
        .unwrap();

    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].title.as_deref(), Some("List pets"));
    assert_eq!(stored[1].title.as_deref(), Some(DEFAULT_TITLE));
    assert!(stored.iter().all(|c| c.file_name == SWAGGER_PATH));
    assert_eq!(h.service.list_contract_cases(Some("pets")).unwrap().len(), 2);
    assert!(h.service.list_contract_cases(Some("other")).unwrap().is_empty());
}

#[tokio::test]
async fn save_rejects_empty_list() {
    let h = harness(MockSourceHost::new(), Arc::new(MemoryStore::new()), &[]);
    let err = h
        .service
        .save_contract_cases_for_repo("acme", "pets", "tok", &[])
        .await
        .unwrap_err();
    assert!(err.is_bad_request());
    assert_eq!(err.to_string(), "The list of contract test cases is empty.");
}

#[tokio::test]
async fn contract_update_round_trip() {
    let (store, rows) = seeded_contract_store(
        &[
            "## Test Case Title: List pets returns 200\n- **Endpoint**: /pets",
            "## Test Case Title: List pets rejects bad limit\n- **Endpoint**: /pets?limit=-1",
            "## Test Case Title: Old endpoint",
        ],
        "pets",
    );
    let reply = update_reply(rows[0].id, rows[1].id, rows[2].id);
    let host = host_with_pr("Add POST /pets", "### File: api/swagger.json\n+post\n\n");
    let h = harness(host, store, &[reply.as_str()]);

    let entries = h
        .service
        .generate_updated_contract_for_pr("acme", "pets", "tok", "Add POST /pets")
        .await
        .unwrap();
    assert_eq!(
        entries,
        vec![
            ReconciliationEntry::updated(
                rows[1].id.to_string(),
                rows[1].content.clone(),
                "## Test Case Title: List pets rejects bad limit\n- **Endpoint**: /pets?limit=0",
            ),
            ReconciliationEntry::deleted(rows[2].id.to_string(), rows[2].content.clone()),
            ReconciliationEntry::added(
                "## Test Case Title: Create pet returns 201\n- **Endpoint**: POST /pets"
            ),
        ]
    );
    let prompt = &h.llm.requests()[0].prompt;
    assert!(prompt.contains(&format!("[Stored ID: {}]", rows[2].id)));
    assert!(prompt.contains("+post"));

    let summary = h
        .service
        .apply_contract_updates_for_repo("acme", "pets", "tok", &entries)
        .await
        .unwrap();
    assert_eq!((summary.created, summary.updated, summary.deleted), (1, 1, 1));

    let remaining = h.store.find_by_file(CaseKind::Contract, SWAGGER_PATH).unwrap();
    assert_eq!(remaining.len(), 3);
    assert_eq!(remaining[0], rows[0]);
    assert!(remaining[1].content.ends_with("limit=0"));
    assert_eq!(remaining[2].title.as_deref(), Some("Create pet returns 201"));
    assert_eq!(remaining[2].test_repo.as_deref(), Some("pets"));
}

#[tokio::test]
async fn unknown_pull_request_title() {
    let h = harness(host_with_pr("Other", ""), Arc::new(MemoryStore::new()), &[]);
    let err = h
        .service
        .generate_updated_contract_for_pr("acme", "pets", "tok", "Missing")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "PR not found: Missing");
    assert_eq!(h.llm.requests().len(), 0);
}

#[tokio::test]
async fn pr_introducing_spec_file_uses_changed_name() {
    let mut host = host_with_files(repo_files(&[("README.md", "hi")]));
    host.expect_open_pull_requests()
        .returning(|_, _, _| Ok(vec![pull_request(3, "Add API")]));
    host.expect_pull_request_changes()
        .returning(|_, _, _, _| Ok("### File: openapi.yaml\nopenapi: 3.0.0\n\n".to_string()));
    let h = harness(host, Arc::new(MemoryStore::new()), &["New case\n- ChangeType: ADDED\nROW_SEPARATOR\n"]);

    let entries = h
        .service
        .generate_updated_contract_for_pr("acme", "pets", "tok", "Add API")
        .await
        .unwrap();
    assert_eq!(entries, vec![ReconciliationEntry::added("New case")]);
    assert!(h.llm.requests()[0].prompt.contains("openapi.yaml"));
}

#[tokio::test]
async fn apply_rejects_empty_entries() {
    let h = harness(MockSourceHost::new(), Arc::new(MemoryStore::new()), &[]);
    let err = h.service.apply_contract_updates(SWAGGER_PATH, None, &[]).unwrap_err();
    assert!(matches!(err, ServiceError::EmptyInput(_)));
}

#[tokio::test]
async fn webhook_regenerates_patched_files() {
    let mut host = MockSourceHost::new();
    host.expect_pull_request_files()
        .times(1)
        .returning(|owner, repo, token, number| {
            assert_eq!((owner, repo, token, number), ("acme", "web", "hook-token", 3));
            Ok(vec![
                changed_file("src/app.js", Some("+ click()")),
                changed_file("logo.png", None),
            ])
        });
    let llm = Arc::new(ScriptedCompletionClient::with_replies(["Click ROW_SEPARATOR\nHover ROW_SEPARATOR\n"]));
    let service = TestCaseService::new(llm, Arc::new(host), Arc::new(MemoryStore::new()))
        .with_webhook_token("hook-token");

    let payload = json!({
        "action": "synchronize",
        "pull_request": {"number": 3, "title": "Tweak"},
        "repository": {"name": "web", "owner": {"login": "acme"}}
    });
    let report = service.handle_webhook("pull_request", &payload).await.unwrap();
    assert_eq!(report.pull_request, 3);
    assert_eq!(report.files_processed, 1);
    assert_eq!(report.files_skipped, 1);
    assert_eq!(report.cases_created, 2);
}

#[tokio::test]
async fn webhook_rejections() {
    let h = harness(MockSourceHost::new(), Arc::new(MemoryStore::new()), &[]);
    let payload = json!({"action": "closed"});

    let err = h.service.handle_webhook("push", &payload).await.unwrap_err();
    assert!(err.is_bad_request());
    assert!(matches!(err, ServiceError::GitHub(GitHubError::UnsupportedEvent(_))));

    let err = h.service.handle_webhook("pull_request", &payload).await.unwrap_err();
    assert!(err.is_bad_request());

    let payload = json!({
        "action": "opened",
        "pull_request": {"number": 1, "title": "x"},
        "repository": {"name": "web", "owner": {"login": "acme"}}
    });
    let err = h.service.handle_webhook("pull_request", &payload).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotConfigured(_)));
}

#[tokio::test]
async fn markdown_conversion_trims_reply() {
    let h = harness(MockSourceHost::new(), Arc::new(MemoryStore::new()), &["\n# TC_1\n"]);
    assert_eq!(h.service.convert_to_markdown("TC_1 body").await.unwrap(), "# TC_1");
    assert!(matches!(
        h.service.convert_to_markdown("  ").await,
        Err(ServiceError::EmptyInput(_))
    ));
}

#[tokio::test]
async fn llm_failure_propagates() {
    let llm = Arc::new(ScriptedCompletionClient::new());
    llm.push_failure(500);
    let service = TestCaseService::new(llm, Arc::new(MockSourceHost::new()), Arc::new(MemoryStore::new()));

    let err = service.generate_e2e("a.js", "x").await.unwrap_err();
    assert!(matches!(err, ServiceError::Llm(_)));
}

#[tokio::test]
async fn custom_separator_is_requested_and_split() {
    let llm = Arc::new(ScriptedCompletionClient::with_replies(["one\n---CASE---\ntwo\n---CASE---\n"]));
    let service = TestCaseService::new(llm.clone(), Arc::new(MockSourceHost::new()), Arc::new(MemoryStore::new()))
        .with_separator("---CASE---")
        .with_model("gpt-4o");

    let drafts = service.generate_initial_contract("swagger.json", SWAGGER).await.unwrap();
    assert_eq!(drafts.len(), 2);
    let request = &llm.requests()[0];
    assert!(request.prompt.contains("---CASE---"));
    assert_eq!(request.model.as_deref(), Some("gpt-4o"));
}

#[tokio::test]
async fn repository_lookups() {
    let mut host = MockSourceHost::new();
    host.expect_repository_owner()
        .returning(|_, name| Ok((name == "web").then(|| "acme".to_string())));
    let h = harness(host, Arc::new(MemoryStore::new()), &[]);

    assert_eq!(h.service.repository_owner("tok", "web").await.unwrap(), "acme");
    let err = h.service.repository_owner("tok", "nope").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn custom_separator_leaves_embedded_content_alone() {
    let llm = Arc::new(ScriptedCompletionClient::with_replies(["case\n---CASE---\n"]));
    let service = TestCaseService::new(llm.clone(), Arc::new(MockSourceHost::new()), Arc::new(MemoryStore::new()))
        .with_separator("---CASE---");

    let swagger = r#"{"info":{"description":"rows end with ROW_SEPARATOR"}}"#;
    service.generate_initial_contract("swagger.json", swagger).await.unwrap();
    assert!(llm.requests()[0].prompt.contains(swagger));
}
