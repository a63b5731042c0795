use super::{App, AppAction, AppCommand};
use crate::core::app::conversation::SubmitRejection;
use crate::core::error::CompletionError;
use tracing::{debug, warn};

pub(super) fn handle_streaming_action(app: &mut App, action: AppAction) -> Option<AppCommand> {
    match action {
        AppAction::StreamChunk { content, stream_id } => {
            if content.is_empty() {
                return None;
            }
            app.conversation().append_fragment(stream_id, &content);
            None
        }
        AppAction::StreamErrored { error, stream_id } => {
            handle_stream_error(app, error, stream_id);
            None
        }
        AppAction::StreamCompleted { stream_id } => {
            if app.conversation().complete(stream_id) {
                app.ui.clear_status();
            } else {
                debug!(stream_id, "ignoring completion of a stale stream");
            }
            None
        }
        AppAction::SubmitMessage { message } => spawn_stream_for_message(app, message),
        AppAction::CancelStreaming => {
            if let Some(prompt) = app.conversation().cancel_current_stream() {
                restore_prompt(app, prompt);
                app.ui.set_status("Response cancelled");
            }
            None
        }
        AppAction::ClearChat => {
            app.conversation().clear();
            app.ui.scroll_to_bottom();
            app.ui.set_status("Chat cleared");
            None
        }
        _ => unreachable!("non-streaming action routed to streaming handler"),
    }
}

fn spawn_stream_for_message(app: &mut App, message: String) -> Option<AppCommand> {
    match app.conversation().submit(message) {
        Ok(params) => {
            app.ui.clear_input();
            app.ui.clear_status();
            app.ui.begin_streaming();
            Some(AppCommand::SpawnStream(params))
        }
        Err(SubmitRejection::EmptyMessage) => None,
        Err(SubmitRejection::Busy) => {
            app.ui
                .set_status("A response is still streaming (Esc to stop it)");
            None
        }
        Err(SubmitRejection::MissingApiKey) => {
            app.ui.set_status(CompletionError::MissingApiKey.to_string());
            app.ui.show_key_gate();
            None
        }
    }
}

fn handle_stream_error(app: &mut App, error: CompletionError, stream_id: u64) {
    warn!(stream_id, "chat completion failed: {error}");
    let Some(prompt) = app.conversation().fail(stream_id, error) else {
        debug!(stream_id, "ignoring error from a stale stream");
        return;
    };
    restore_prompt(app, prompt);
}

/// Put an undone prompt back into the input unless the user already typed
/// something new.
fn restore_prompt(app: &mut App, prompt: String) {
    if !app.ui.has_draft() {
        app.ui.set_input_text(prompt);
    }
    app.ui.focus_input();
}
