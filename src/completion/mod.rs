use anyhow::Result;
use axum::async_trait;
use serde_json::Value;

pub(crate) mod client;
pub(crate) mod endpoints;
pub(crate) mod pipeline;
pub(crate) mod wire;

/// How a prompt is wrapped before it is sent upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStyle {
    /// Bare `prompt` field against the text completion endpoint
    Completion,
    /// Single user-role message against the chat completion endpoint
    Chat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub style: PromptStyle,
}

/// What the upstream answered. Transport and decoding failures are reported through `Err` instead.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    /// Text of the first choice, untouched
    Answered(String),
    /// The upstream replied without any choice, carries the raw body
    NoChoices(Value),
}

#[async_trait]
pub trait CompletionHandler: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionOutcome>;
}
