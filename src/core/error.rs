//! Failures surfaced by the completion client.

use std::fmt;

/// Everything that can go wrong between pressing Enter and the last fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    /// No API key was supplied; nothing was sent.
    MissingApiKey,

    /// The remote service rejected the credential (HTTP 401/403).
    Authentication { status: u16, message: String },

    /// Network failure, timeout, or an interrupted response body.
    Transport(String),

    /// The service answered with an error: a non-success status, or an error
    /// object inside the stream (`status` is `None` in that case).
    Api {
        status: Option<u16>,
        message: String,
    },
}

/// Coarse classification used to pick how an error is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Authentication,
    Transport,
}

impl CompletionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompletionError::MissingApiKey | CompletionError::Authentication { .. } => {
                ErrorKind::Authentication
            }
            CompletionError::Transport(_) | CompletionError::Api { .. } => ErrorKind::Transport,
        }
    }

    pub fn is_auth(&self) -> bool {
        self.kind() == ErrorKind::Authentication
    }

    pub(crate) fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            CompletionError::Transport("request timed out".to_string())
        } else if err.is_connect() {
            CompletionError::Transport(format!("could not connect: {err}"))
        } else {
            CompletionError::Transport(err.to_string())
        }
    }

    /// Map a non-success HTTP status and its body.
    pub(crate) fn from_status(status: u16, body: &str) -> Self {
        let message = summarize_api_error(body);
        if status == 401 || status == 403 {
            CompletionError::Authentication { status, message }
        } else {
            CompletionError::Api {
                status: Some(status),
                message,
            }
        }
    }
}

impl fmt::Display for CompletionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionError::MissingApiKey => write!(f, "Please add your API key to continue."),
            CompletionError::Authentication { status, message } => {
                write!(f, "Authentication failed (HTTP {status}): {message}")
            }
            CompletionError::Transport(message) => write!(f, "Connection error: {message}"),
            CompletionError::Api {
                status: Some(status),
                message,
            } => write!(f, "API error (HTTP {status}): {message}"),
            CompletionError::Api {
                status: None,
                message,
            } => write!(f, "API error: {message}"),
        }
    }
}

impl std::error::Error for CompletionError {}

const MAX_RAW_ERROR_CHARS: usize = 300;

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value.get("error").and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.to_string()),
                _ => None,
            })
        })
        .or_else(|| {
            value
                .get("message")
                .or_else(|| value.get("detail"))
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// One-line description of an error body: the JSON `message` when there is
/// one, otherwise the collapsed and shortened raw text.
pub(crate) fn summarize_api_error(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty response>".to_string();
    }

    if let Ok(json_value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(summary) = extract_error_summary(&json_value) {
            if !summary.is_empty() {
                return summary;
            }
        }
    }

    let collapsed = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > MAX_RAW_ERROR_CHARS {
        let mut short: String = collapsed.chars().take(MAX_RAW_ERROR_CHARS).collect();
        short.push('…');
        short
    } else {
        collapsed
    }
}
