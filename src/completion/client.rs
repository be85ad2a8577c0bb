use anyhow::{Context, Result};
use axum::async_trait;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::completion::wire::{read_outcome, ChatCompletionRequest, TextCompletionRequest};
use crate::completion::{CompletionHandler, CompletionOutcome, CompletionRequest, PromptStyle};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// An upstream endpoint together with the model requested from it
#[derive(Debug, Clone)]
pub struct Upstream {
    pub url: Url,
    pub model: String,
}

impl Upstream {
    pub fn parse(url: &str, model: &str) -> Result<Self> {
        let url = Url::parse(url).with_context(|| format!("Invalid upstream URL {url}"))?;
        Ok(Self {
            url,
            model: model.to_string(),
        })
    }
}

/// Client for OpenAI compatible completion APIs.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    completion: Upstream,
    chat: Upstream,
}

impl OpenAiClient {
    pub fn new(api_key: Option<&str>, completion: Upstream, chat: Upstream) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()?;
        if api_key.is_none() {
            warn!("No completion API key configured");
        }

        Ok(Self {
            http,
            api_key: api_key.map(str::to_string),
            completion,
            chat,
        })
    }
}

#[async_trait]
impl CompletionHandler for OpenAiClient {
    #[tracing::instrument(
        level = "info",
        skip(self, request),
        fields(style = ?request.style, max_tokens = request.max_tokens)
    )]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionOutcome> {
        let builder = match request.style {
            PromptStyle::Completion => {
                let body = TextCompletionRequest {
                    model: &self.completion.model,
                    prompt: &request.prompt,
                    max_tokens: request.max_tokens,
                };
                self.http.post(self.completion.url.clone()).json(&body)
            }
            PromptStyle::Chat => {
                let body = ChatCompletionRequest::single_user_message(
                    &self.chat.model,
                    &request.prompt,
                    request.max_tokens,
                );
                self.http.post(self.chat.url.clone()).json(&body)
            }
        };
        let builder = match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        };

        let response = builder
            .send()
            .await
            .context("Failed to reach the completion API")?;
        let status = response.status();
        let raw: Value = response
            .json()
            .await
            .with_context(|| format!("Completion API answered {status} without a JSON body"))?;
        if !status.is_success() {
            warn!(%status, "Completion API answered with an error status");
        }
        debug!(%status, "Completion API answered");

        read_outcome(raw)
    }
}
