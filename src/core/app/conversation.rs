use super::session::{PendingResponse, SessionContext, TurnState};
use crate::core::chat_stream::StreamParams;
use crate::core::error::CompletionError;
use crate::core::message::Message;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Why a submission did not start a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitRejection {
    EmptyMessage,
    /// A response is still streaming.
    Busy,
    MissingApiKey,
}

/// Turn bookkeeping on top of the session: appends the user message, hands
/// out stream parameters, and commits or rolls back when the stream ends.
pub struct ConversationController<'a> {
    session: &'a mut SessionContext,
}

impl<'a> ConversationController<'a> {
    pub fn new(session: &'a mut SessionContext) -> Self {
        Self { session }
    }

    /// Append `text` as a user message and prepare the stream for the reply.
    pub fn submit(&mut self, text: String) -> Result<StreamParams, SubmitRejection> {
        if text.trim().is_empty() {
            return Err(SubmitRejection::EmptyMessage);
        }
        if self.session.is_streaming() {
            return Err(SubmitRejection::Busy);
        }
        if !self.session.has_api_key() {
            self.session.turn = TurnState::ErrorDisplayed(CompletionError::MissingApiKey);
            return Err(SubmitRejection::MissingApiKey);
        }

        let turn_start = self.session.transcript.len();
        self.session.transcript.push(Message::user(text.clone()));
        let request = self.session.build_request();

        let (cancel_token, stream_id) = self.start_new_stream();
        self.session.pending = Some(PendingResponse {
            stream_id,
            text: String::new(),
            turn_start,
            prompt: text,
        });
        self.session.turn = TurnState::StreamingResponse;
        debug!(
            stream_id,
            model = %request.params.model,
            history = request.history.len(),
            "turn started"
        );

        Ok(StreamParams {
            backend: self.session.backend.clone(),
            request,
            cancel_token,
            stream_id,
        })
    }

    fn start_new_stream(&mut self) -> (CancellationToken, u64) {
        if let Some(token) = self.session.stream_cancel_token.take() {
            token.cancel();
        }
        self.session.current_stream_id = self.session.current_stream_id.wrapping_add(1);
        let token = CancellationToken::new();
        self.session.stream_cancel_token = Some(token.clone());
        (token, self.session.current_stream_id)
    }

    pub fn is_current_stream(&self, stream_id: u64) -> bool {
        self.session
            .pending
            .as_ref()
            .is_some_and(|pending| pending.stream_id == stream_id)
    }

    pub fn append_fragment(&mut self, stream_id: u64, fragment: &str) {
        if let Some(pending) = self.session.pending.as_mut() {
            if pending.stream_id == stream_id {
                pending.text.push_str(fragment);
            }
        }
    }

    /// Commit the accumulated reply as one assistant message.
    pub fn complete(&mut self, stream_id: u64) -> bool {
        if !self.is_current_stream(stream_id) {
            return false;
        }
        let Some(pending) = self.session.pending.take() else {
            return false;
        };
        self.session.transcript.push(Message::assistant(pending.text));
        self.session.stream_cancel_token = None;
        self.session.turn = TurnState::Idle;
        debug!(stream_id, messages = self.session.transcript.len(), "turn committed");
        true
    }

    /// Abandon the turn because of `error`. Returns the prompt to restore.
    pub fn fail(&mut self, stream_id: u64, error: CompletionError) -> Option<String> {
        if !self.is_current_stream(stream_id) {
            return None;
        }
        let prompt = self.roll_back();
        self.session.turn = TurnState::ErrorDisplayed(error);
        prompt
    }

    /// Stop the stream in flight, if any. Returns the prompt to restore.
    pub fn cancel_current_stream(&mut self) -> Option<String> {
        if let Some(token) = self.session.stream_cancel_token.take() {
            token.cancel();
        }
        let prompt = self.roll_back();
        if prompt.is_some() {
            self.session.turn = TurnState::Idle;
        }
        prompt
    }

    fn roll_back(&mut self) -> Option<String> {
        let pending = self.session.pending.take()?;
        self.session.stream_cancel_token = None;
        self.session.transcript.truncate(pending.turn_start);
        debug!(
            stream_id = pending.stream_id,
            discarded = pending.text.len(),
            "turn rolled back"
        );
        Some(pending.prompt)
    }

    /// Empty the transcript. A turn in flight is cancelled first.
    pub fn clear(&mut self) {
        if let Some(token) = self.session.stream_cancel_token.take() {
            token.cancel();
        }
        self.session.pending = None;
        self.session.transcript.clear();
        self.session.turn = TurnState::Idle;
    }

    pub fn dismiss_error(&mut self) {
        if matches!(self.session.turn, TurnState::ErrorDisplayed(_)) {
            self.session.turn = TurnState::Idle;
        }
    }

    /// Track whether the input holds a draft while nothing is in flight.
    pub fn note_draft(&mut self, has_draft: bool) {
        match self.session.turn {
            TurnState::Idle if has_draft => self.session.turn = TurnState::AwaitingUserInput,
            TurnState::AwaitingUserInput if !has_draft => self.session.turn = TurnState::Idle,
            _ => {}
        }
    }
}
