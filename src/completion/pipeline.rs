use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::completion::endpoints::{OutputShape, PromptEndpoint};
use crate::completion::{CompletionHandler, CompletionOutcome, CompletionRequest};

pub const NO_CHOICES_MESSAGE: &str = "No 'choices' in API response";

#[derive(Deserialize, Debug)]
pub struct PromptRequest {
    #[serde(rename = "inputText")]
    pub input_text: String,
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(untagged)]
pub enum PromptResponse {
    Items { predicted_items: PredictedItems },
    Error { error: String },
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(untagged)]
pub enum PredictedItems {
    Lines(Vec<String>),
    Text(String),
}

/// Flattens list-like input such as `"x, y, z"` into `"x y z"`.
pub fn normalize_input(input: &str) -> String {
    input.split(", ").collect::<Vec<_>>().join(" ")
}

pub fn compose_prompt(template: &str, input: &str) -> String {
    format!("{} {}", template, normalize_input(input))
}

/// Splits on `\n`, keeping blank lines in between. A trailing `\r` is dropped per line.
pub fn split_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}

pub fn shape_outcome(outcome: CompletionOutcome, shape: OutputShape) -> PromptResponse {
    match outcome {
        CompletionOutcome::Answered(text) => {
            let text = text.trim();
            let predicted_items = match shape {
                OutputShape::Lines => PredictedItems::Lines(split_lines(text)),
                OutputShape::Text => PredictedItems::Text(text.to_string()),
            };
            PromptResponse::Items { predicted_items }
        }
        CompletionOutcome::NoChoices(raw) => {
            warn!(response = %raw, "{}", NO_CHOICES_MESSAGE);
            PromptResponse::Error {
                error: NO_CHOICES_MESSAGE.to_string(),
            }
        }
    }
}

/// Templates the caller's text for `endpoint`, asks the upstream and shapes its answer.
#[tracing::instrument(level = "info", skip(handler, endpoint, input), fields(path = endpoint.path))]
pub async fn run_prompt(
    handler: &dyn CompletionHandler,
    endpoint: &PromptEndpoint,
    input: &str,
) -> Result<PromptResponse> {
    let request = CompletionRequest {
        prompt: compose_prompt(endpoint.template, input),
        max_tokens: endpoint.max_tokens,
        style: endpoint.style,
    };
    let outcome = handler.complete(request).await?;
    Ok(shape_outcome(outcome, endpoint.shape))
}
