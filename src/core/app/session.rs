use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::core::chat_stream::{CompletionBackend, CompletionRequest};
use crate::core::config::Config;
use crate::core::error::CompletionError;
use crate::core::models::ModelCatalog;
use crate::core::params::{GenerationParameters, SamplingSettings};
use crate::core::preset::PresetCatalog;
use crate::core::transcript::Transcript;

/// Where the current turn stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TurnState {
    /// Nothing typed yet, nothing in flight.
    #[default]
    Idle,
    /// The input holds a draft.
    AwaitingUserInput,
    /// A response is being streamed into the pending bubble.
    StreamingResponse,
    /// The last turn failed; the error stays up until dismissed or retried.
    ErrorDisplayed(CompletionError),
}

/// The assistant reply of the turn in flight. Nothing here is part of the
/// transcript until the stream completes.
#[derive(Debug, Clone)]
pub struct PendingResponse {
    pub stream_id: u64,
    pub text: String,
    /// Transcript length before the user message of this turn was appended.
    pub turn_start: usize,
    /// The submitted text, handed back to the input if the turn is undone.
    pub prompt: String,
}

pub struct SessionContext {
    pub backend: Arc<dyn CompletionBackend>,
    pub base_url: String,
    api_key: String,
    pub models: ModelCatalog,
    pub settings: SamplingSettings,
    pub presets: PresetCatalog,
    pub transcript: Transcript,
    pub turn: TurnState,
    pub pending: Option<PendingResponse>,
    pub stream_cancel_token: Option<CancellationToken>,
    pub current_stream_id: u64,
}

impl SessionContext {
    pub fn new(
        config: &Config,
        base_url: String,
        preferred_model: Option<&str>,
        backend: Arc<dyn CompletionBackend>,
    ) -> Self {
        let preferred_model = preferred_model.or(config.default_model.as_deref());
        Self {
            backend,
            base_url,
            api_key: String::new(),
            models: ModelCatalog::new(config.model_choices(), preferred_model),
            settings: config.parameters.clamped(),
            presets: PresetCatalog::from_config(config),
            transcript: Transcript::new(),
            turn: TurnState::Idle,
            pending: None,
            stream_cancel_token: None,
            current_stream_id: 0,
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn set_api_key(&mut self, key: &str) {
        self.api_key = key.trim().to_string();
    }

    pub fn forget_api_key(&mut self) {
        self.api_key.clear();
    }

    pub fn is_streaming(&self) -> bool {
        self.turn == TurnState::StreamingResponse
    }

    pub fn current_error(&self) -> Option<&CompletionError> {
        match &self.turn {
            TurnState::ErrorDisplayed(err) => Some(err),
            _ => None,
        }
    }

    /// Text received so far for the turn in flight.
    pub fn pending_text(&self) -> Option<&str> {
        self.pending.as_ref().map(|pending| pending.text.as_str())
    }

    /// Snapshot the widget state into a request over the current transcript.
    pub fn build_request(&self) -> CompletionRequest {
        CompletionRequest {
            api_key: self.api_key.clone(),
            system_prompt: self.presets.system_message(),
            history: self.transcript.messages().to_vec(),
            params: GenerationParameters::from_settings(self.models.selected_id(), &self.settings),
        }
    }
}
