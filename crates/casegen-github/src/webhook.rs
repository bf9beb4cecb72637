//! Pull-request webhook payloads

use crate::error::GitHubError;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Event header value handled by the service
pub const PULL_REQUEST_EVENT: &str = "pull_request";

/// Pull-request actions that trigger regeneration
pub const HANDLED_ACTIONS: [&str; 3] = ["opened", "synchronize", "edited"];

/// Pull-request event the service reacts to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestEvent {
    /// `opened`, `synchronize` or `edited`
    pub action: String,
    /// Repository owner login
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// PR number
    pub number: u64,
    /// PR title
    pub title: String,
}

fn str_at<'a>(payload: &'a JsonValue, pointer: &str) -> Result<&'a str, GitHubError> {
    payload
        .pointer(pointer)
        .and_then(JsonValue::as_str)
        .ok_or_else(|| GitHubError::InvalidPayload(format!("missing {pointer}")))
}

/// Validate the event header and action, then extract the pull request
///
/// # Errors
/// - `GitHubError::UnsupportedEvent` for any event other than `pull_request`
/// - `GitHubError::UnsupportedAction` for actions outside [`HANDLED_ACTIONS`]
/// - `GitHubError::InvalidPayload` if required fields are missing
pub fn parse_pull_request_event(
    event: &str,
    payload: &JsonValue,
) -> Result<PullRequestEvent, GitHubError> {
    if event != PULL_REQUEST_EVENT {
        return Err(GitHubError::UnsupportedEvent(event.to_string()));
    }

    let action = str_at(payload, "/action")?;
    if !HANDLED_ACTIONS.contains(&action) {
        return Err(GitHubError::UnsupportedAction(action.to_string()));
    }

    let number = payload
        .pointer("/pull_request/number")
        .and_then(JsonValue::as_u64)
        .ok_or_else(|| GitHubError::InvalidPayload("missing /pull_request/number".into()))?;

    Ok(PullRequestEvent {
        action: action.to_string(),
        owner: str_at(payload, "/repository/owner/login")?.to_string(),
        repo: str_at(payload, "/repository/name")?.to_string(),
        number,
        title: str_at(payload, "/pull_request/title")
            .unwrap_or_default()
            .to_string(),
    })
}
