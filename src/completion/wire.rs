use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::completion::CompletionOutcome;

#[derive(Serialize, Debug)]
pub(crate) struct TextCompletionRequest<'a> {
    pub(crate) model: &'a str,
    pub(crate) prompt: &'a str,
    pub(crate) max_tokens: u32,
}

#[derive(Serialize, Debug)]
pub(crate) struct ChatCompletionRequest<'a> {
    pub(crate) model: &'a str,
    pub(crate) messages: Vec<ChatMessage<'a>>,
    pub(crate) max_tokens: u32,
}

#[derive(Serialize, Debug)]
pub(crate) struct ChatMessage<'a> {
    pub(crate) role: &'a str,
    pub(crate) content: &'a str,
}

impl<'a> ChatCompletionRequest<'a> {
    pub(crate) fn single_user_message(model: &'a str, prompt: &'a str, max_tokens: u32) -> Self {
        Self {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
        }
    }
}

#[derive(Deserialize, Debug)]
struct CompletionResponse {
    #[serde(default)]
    choices: Option<Vec<Choice>>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize, Debug)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl Choice {
    fn into_text(self) -> Option<String> {
        self.text
            .or_else(|| self.message.and_then(|message| message.content))
    }
}

/// Reads the first choice of a completion or chat completion body.
pub(crate) fn read_outcome(raw: Value) -> Result<CompletionOutcome> {
    if !raw.is_object() {
        return Ok(CompletionOutcome::NoChoices(raw));
    }
    let response: CompletionResponse = serde_json::from_value(raw.clone())
        .context("Completion API response has an unexpected shape")?;

    let Some(first) = response.choices.and_then(|c| c.into_iter().next()) else {
        return Ok(CompletionOutcome::NoChoices(raw));
    };
    match first.into_text() {
        Some(text) => Ok(CompletionOutcome::Answered(text)),
        None => bail!("First completion choice carries no text"),
    }
}
