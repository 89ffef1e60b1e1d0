//! Anthropic Messages API client for the storefront chat assistant.
//!
//! Only plain-text, non-streaming completions are used: the assistant answers
//! questions about the catalog from a system prompt, without tools.

mod client;
mod error;
mod types;

pub use client::ClaudeClient;
pub use error::{ApiError, ApiErrorResponse, ClaudeError};
pub use types::{ChatRequest, ChatResponse, ContentBlock, Message, Role, StopReason, Usage};
