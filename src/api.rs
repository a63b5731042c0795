//! Chat-completion wire payloads.

use serde::{Deserialize, Serialize};

use crate::core::message::Message;
use crate::core::params::GenerationParameters;

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    pub frequency_penalty: f64,
}

impl ChatRequest {
    pub fn new(
        params: &GenerationParameters,
        messages: Vec<ChatMessage>,
        include_top_k: bool,
    ) -> Self {
        Self {
            model: params.model.clone(),
            messages,
            stream: true,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
            top_k: include_top_k.then_some(params.top_k),
            frequency_penalty: params.frequency_penalty,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct ChatResponseDelta {
    pub content: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ChatResponseChoice {
    pub delta: ChatResponseDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// One `data:` event of a streamed completion.
#[derive(Deserialize, Debug)]
pub struct ChatResponse {
    pub choices: Vec<ChatResponseChoice>,
}

#[derive(Deserialize, Debug)]
pub struct ChatCompletionMessage {
    pub content: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ChatCompletionChoice {
    pub message: ChatCompletionMessage,
}

/// A whole, non-streamed completion.
#[derive(Deserialize, Debug)]
pub struct ChatCompletion {
    pub choices: Vec<ChatCompletionChoice>,
}
