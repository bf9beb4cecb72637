//! casegen LLM - chat-completion clients
//!
//! A single async seam, [`CompletionClient`], with OpenAI and Gemini
//! implementations. Endpoint URLs and keys are injected through
//! [`LlmSettings`]; nothing is read from the environment here.
//!
//! # Example
//!
//! ```rust,ignore
//! use casegen_llm::{build_client, CompletionRequest, LlmSettings};
//!
//! let client = build_client(&LlmSettings::new().with_api_key(key))?;
//! let text = client.complete(CompletionRequest::new("Say hi", 0.0)).await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod client;
pub mod error;
pub mod gemini;
pub mod openai;

pub use client::{build_client, CompletionClient, CompletionRequest, LlmProvider, LlmSettings};
pub use error::LlmError;
pub use gemini::{parse_gemini_completion, GeminiClient};
pub use openai::{parse_openai_completion, OpenAiClient};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
