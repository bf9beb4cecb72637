//! Prompt templates
//!
//! Every template records the temperature it is sent with and the
//! [`SplitStyle`] that parses the reply, so the splitting convention and
//! the instructions that request it live side by side.

use crate::splitter::SplitStyle;
use crate::types::{ChangeType, StoredTestCase};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Answer to [`e2e_relevance`] meaning no end-to-end tests are needed
pub const NOT_RELEVANT_ANSWER: &str = "No";

/// Placeholder used when no test cases are stored yet
pub const NO_EXISTING_CASES: &str = "No existing test cases found.";

/// A rendered prompt ready to send
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    /// Prompt text
    pub text: String,
    /// Sampling temperature
    pub temperature: f32,
    /// How to split the reply
    pub split_style: SplitStyle,
}

impl Prompt {
    fn new(text: String, temperature: f32, split_style: SplitStyle) -> Self {
        Self {
            text,
            temperature,
            split_style,
        }
    }
}

/// Whether an [`e2e_relevance`] reply means "skip this file"
#[must_use]
pub fn is_not_relevant(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case(NOT_RELEVANT_ANSWER)
}

const CONTRACT_CASE_STRUCTURE: &str = r#"## Test Case Title: <short human-readable title>

- **Test Case ID**: Unique identifier (e.g., `TC_<EndpointName>_<StatusCode>`)
- **Endpoint**: Full API endpoint path (e.g., `/api/v1/resource`)
- **Description**: What this test case verifies.
- **Preconditions**: Setup or prerequisites.
- **Request Data**:
  - **Method**: HTTP method (e.g., GET, POST)
  - **Headers**: Required headers with example values.
  - **Query Parameters**: Valid and invalid example values (if applicable).
  - **Body Parameters**: Sample payload for POST/PUT requests (if applicable).
- **Expected Response**:
  - **Status Code**: Expected HTTP status code (e.g., 200, 400).
  - **Response Body**: Example JSON structure.
  - **Headers**: Required response headers (e.g., `Content-Type: application/json`).
- **Validation Rules**:
  - Presence and correctness of key response fields and types.
  - Compliance with the schema declared in the API description."#;

/// Ask whether a file needs end-to-end tests at all
#[must_use]
pub fn e2e_relevance(file_content: &str) -> Prompt {
    let text = format!(
        "Analyze the following code to decide whether it needs end-to-end (e2e) test cases. \
         E2e tests are warranted only when the code contains interactive or functional \
         behaviour that users exercise directly. If the content only covers styling, layout \
         or static display, e2e tests are unnecessary. \
         Answer with exactly 'Yes' if e2e tests are needed and 'No' if not.\n\n{file_content}"
    );
    Prompt::new(text, 0.0, SplitStyle::Whole)
}

/// Generate end-to-end test cases for one file
#[must_use]
pub fn e2e_generation(file_content: &str, separator: &str) -> Prompt {
    let text = format!(
        "Generate only end-to-end test cases for the following code. Focus on functional and \
         interactive tests that simulate real user interactions. Do not produce test cases that \
         check CSS styling, layout properties or the static appearance of elements. \
         Write each test case in Markdown and put the exact string `{separator}` on its \
         own line after every test case.\n\n{file_content}"
    );
    Prompt::new(text, 0.7, SplitStyle::Delimited(separator.to_string()))
}

/// Numbered-list variant of [`e2e_generation`]
#[must_use]
pub fn numbered_generation(file_content: &str) -> Prompt {
    let text = format!(
        "Generate only end-to-end test cases for the following code, focusing on functional \
         user interactions. Return them as a numbered list: start every test case on a new line \
         with its number followed by a period and a space (`1. `, `2. `, ...). Do not number \
         anything else at the start of a line.\n\n{file_content}"
    );
    Prompt::new(text, 0.7, SplitStyle::Numbered)
}

/// Render stored cases as prompt context
fn render_existing(file_name: &str, existing: &[StoredTestCase], with_ids: bool) -> String {
    if existing.is_empty() {
        return NO_EXISTING_CASES.to_string();
    }

    let mut out = format!("Here are the existing test cases for {file_name}:\n\n");
    for case in existing {
        if with_ids {
            let _ = writeln!(out, "[Stored ID: {}]", case.id);
        }
        let _ = write!(out, "{}\n\n", case.content);
    }
    out
}

/// Update manual end-to-end test cases for a diff
#[must_use]
pub fn e2e_update(
    file_name: &str,
    changes: &str,
    existing: &[StoredTestCase],
    separator: &str,
) -> Prompt {
    let existing = render_existing(file_name, existing, false);
    let text = format!(
        "The file {file_name} has the following changes:\n{changes}\n\
         These manual test cases were written before the changes were made:\n\n{existing}\n\
         Update the existing manual test cases to reflect these changes, and add new test cases \
         where needed. Put the exact string `{separator}` on its own line after every \
         test case."
    );
    Prompt::new(text, 0.7, SplitStyle::Delimited(separator.to_string()))
}

/// Generate the initial contract test cases for an API description
#[must_use]
pub fn contract_initial(swagger_content: &str, separator: &str) -> Prompt {
    let text = format!(
        "Generate a comprehensive set of initial contract test cases for the following \
         Swagger/OpenAPI file.\n\n\
         Swagger File Content:\n{swagger_content}\n\n\
         ### Instructions:\n\
         - Identify every endpoint, method and response code.\n\
         - For each method, cover:\n\
         \x20 1. **Successful scenarios**: at least one test case per success code (e.g., 200, 201).\n\
         \x20 2. **Error scenarios**: at least one test case per error code (e.g., 400, 404).\n\
         \x20 3. **Edge cases**: boundary, invalid and missing query parameters; required, \
         mistyped and missing body fields.\n\
         - Each test case covers exactly one scenario.\n\n\
         ### Test Case Structure:\n{CONTRACT_CASE_STRUCTURE}\n\n\
         ### Output:\n\
         - Use Markdown and start every test case with its `## Test Case Title:` line.\n\
         - Put the exact string `{separator}` on its own line after every test case.\n\
         - Begin directly with the first test case."
    );
    Prompt::new(text, 0.0, SplitStyle::Delimited(separator.to_string()))
}

/// Reconcile stored contract test cases with pull-request changes
///
/// Stored cases are listed with their identifiers; the reply annotates every
/// case with a `- ChangeType:` line and, unless ADDED, an `- ID:` line.
#[must_use]
pub fn contract_update(
    file_name: &str,
    swagger_content: &str,
    pr_changes: &str,
    existing: &[StoredTestCase],
    separator: &str,
) -> Prompt {
    let existing = render_existing(file_name, existing, true);
    let kinds = ChangeType::ALL
        .iter()
        .map(ChangeType::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    let text = format!(
        "Update the existing contract test cases based on the following inputs.\n\n\
         ### Inputs:\n\
         1. **Initial Swagger File Content**:\n{swagger_content}\n\n\
         2. **PR Changes** (the Swagger file as changed by the pull request):\n{pr_changes}\n\n\
         3. **Existing Test Cases in the Database** (each preceded by its stored ID):\n{existing}\n\
         ### Instructions:\n\
         - Find the endpoints, methods and response codes the PR adds, modifies or removes.\n\
         - If the PR removes an endpoint, method or response code, mark the matching test case DELETED.\n\
         - If the PR modifies one, rewrite the matching test case and mark it UPDATED.\n\
         - If the PR introduces one, write a new test case and mark it ADDED.\n\
         - Return every other test case unchanged and mark it SAME.\n\
         - Keep the order of the existing test cases; put ADDED test cases last.\n\n\
         ### Test Case Structure:\n{CONTRACT_CASE_STRUCTURE}\n\n\
         ### Annotation:\n\
         End every test case with these lines, exactly:\n\
         - ChangeType: <one of {kinds}>\n\
         - ID: <stored ID of the test case>\n\
         Omit the `- ID:` line only for ADDED test cases.\n\n\
         ### Output:\n\
         - Use Markdown and start every test case with its `## Test Case Title:` line.\n\
         - Put the exact string `{separator}` on its own line after every test case, \
         including DELETED ones."
    );
    Prompt::new(text, 0.0, SplitStyle::Delimited(separator.to_string()))
}

/// Reformat a test case as structured Markdown
#[must_use]
pub fn markdown_conversion(test_case: &str) -> Prompt {
    let text = format!(
        "Convert the following test case into well-structured Markdown. Use a heading for the \
         test case ID, bold labels for each field and code blocks for JSON data:\n\n{test_case}"
    );
    Prompt::new(text, 0.5, SplitStyle::Whole)
}
