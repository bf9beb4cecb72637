//! Testing utilities for the casegen workspace
//!
//! Scripted LLM client, source-host mocks and canned LLM responses.

#![allow(missing_docs)]

use async_trait::async_trait;
use casegen_core::{CaseKind, NewTestCase, StoredTestCase};
use casegen_github::{ChangedFile, MockSourceHost, PullRequest};
use casegen_llm::{CompletionClient, CompletionRequest, LlmError, LlmProvider};
use casegen_store::{MemoryStore, TestCaseStore};
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

/// Completion client that replays queued replies in order
#[derive(Debug, Default)]
pub struct ScriptedCompletionClient {
    replies: Mutex<VecDeque<Result<String, u16>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletionClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Client preloaded with successful replies
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let client = Self::new();
        for reply in replies {
            client.push_reply(reply);
        }
        client
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.replies.lock().push_back(Ok(reply.into()));
    }

    /// Queue an HTTP failure with the given status
    pub fn push_failure(&self, status: u16) {
        self.replies.lock().push_back(Err(status));
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }

    /// Replies not yet consumed
    pub fn remaining(&self) -> usize {
        self.replies.lock().len()
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        self.requests.lock().push(request);
        match self.replies.lock().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(status)) => Err(LlmError::Status {
                status,
                body: "scripted failure".into(),
            }),
            None => Err(LlmError::malformed("no scripted reply left")),
        }
    }

    fn provider(&self) -> LlmProvider {
        LlmProvider::OpenAi
    }
}

pub const SWAGGER_PATH: &str = "api/swagger.json";

pub const SWAGGER: &str = r#"{"openapi":"3.0.0","paths":{"/pets":{"get":{"responses":{"200":{}}}}}}"#;

/// Initial contract reply with two titled cases
pub const INITIAL_CONTRACT_REPLY: &str = "\
## Test Case Title: List pets returns 200
- **Endpoint**: /pets
- **Expected Response**: 200
ROW_SEPARATOR
## Test Case Title: List pets rejects bad limit
- **Endpoint**: /pets?limit=-1
- **Expected Response**: 400
ROW_SEPARATOR
";

/// Annotated update reply for stored ids `keep`, `changed` and `removed`
pub fn update_reply(keep: i64, changed: i64, removed: i64) -> String {
    format!(
        "## Test Case Title: List pets returns 200\n- **Endpoint**: /pets\n- ChangeType: SAME\n- ID: {keep}\n\
         ROW_SEPARATOR\n\
         ## Test Case Title: List pets rejects bad limit\n- **Endpoint**: /pets?limit=0\n- ChangeType: UPDATED\n- ID: {changed}\n\
         ROW_SEPARATOR\n\
         ## Test Case Title: Old endpoint\n- ChangeType: DELETED\n- ID: {removed}\n\
         ROW_SEPARATOR\n\
         ## Test Case Title: Create pet returns 201\n- **Endpoint**: POST /pets\n- ChangeType: ADDED\n\
         ROW_SEPARATOR\n"
    )
}

pub fn stored_case(id: i64, kind: CaseKind, file_name: &str, content: &str) -> StoredTestCase {
    StoredTestCase {
        id,
        kind,
        file_name: file_name.to_string(),
        content: content.to_string(),
        title: None,
        test_repo: None,
    }
}

/// Memory store seeded with contract cases for [`SWAGGER_PATH`]
pub fn seeded_contract_store(contents: &[&str], repo: &str) -> (Arc<MemoryStore>, Vec<StoredTestCase>) {
    let store = Arc::new(MemoryStore::new());
    let rows = contents
        .iter()
        .map(|content| {
            store
                .create(NewTestCase::new(CaseKind::Contract, SWAGGER_PATH, *content).with_repo(repo))
                .unwrap()
        })
        .collect();
    (store, rows)
}

pub fn repo_files(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(path, content)| (path.to_string(), content.to_string()))
        .collect()
}

pub fn pull_request(number: u64, title: &str) -> PullRequest {
    PullRequest {
        number,
        title: title.to_string(),
        state: "open".to_string(),
        created_at: "2024-05-01T00:00:00Z".to_string(),
        head_ref: format!("pr-{number}"),
    }
}

pub fn changed_file(filename: &str, patch: Option<&str>) -> ChangedFile {
    ChangedFile {
        filename: filename.to_string(),
        status: "modified".to_string(),
        patch: patch.map(str::to_string),
    }
}

/// Host mock whose repository walk returns `files`
pub fn host_with_files(files: BTreeMap<String, String>) -> MockSourceHost {
    let mut host = MockSourceHost::new();
    host.expect_list_repository_files()
        .returning(move |_, _, _| Ok(files.clone()));
    host
}
