use super::{App, AppAction, AppCommand};
use crate::core::error::CompletionError;
use tracing::info;

pub(super) fn handle_control_action(app: &mut App, action: AppAction) -> Option<AppCommand> {
    match action {
        AppAction::SubmitApiKey { key } => {
            submit_api_key(app, key);
            None
        }
        AppAction::ForgetApiKey => {
            if let Some(prompt) = app.conversation().cancel_current_stream() {
                app.ui.set_input_text(prompt);
            }
            app.session.forget_api_key();
            app.ui.set_key_text("");
            app.ui.clear_status();
            app.ui.show_key_gate();
            None
        }
        AppAction::AdjustParameter { parameter, steps } => {
            app.session.settings.adjust(parameter, steps);
            None
        }
        AppAction::ResetParameter { parameter } => {
            app.session.settings.reset(parameter);
            None
        }
        AppAction::SelectModel { delta } => {
            app.session.models.cycle(delta);
            info!(model = %app.session.models.selected_id(), "model selected");
            None
        }
        AppAction::SelectPreset { delta } => {
            app.session.presets.cycle(delta);
            info!(preset = %app.session.presets.active_label(), "preset selected");
            None
        }
        AppAction::DismissNotice => {
            dismiss_notice(app);
            None
        }
        AppAction::InputEdited => {
            let has_draft = app.ui.has_draft();
            app.conversation().note_draft(has_draft);
            None
        }
        AppAction::SetStatus { message } => {
            app.ui.set_status(message);
            None
        }
        AppAction::ClearStatus => {
            app.ui.clear_status();
            None
        }
        _ => unreachable!("streaming action routed to control handler"),
    }
}

fn submit_api_key(app: &mut App, key: String) {
    if key.trim().is_empty() {
        app.ui.set_status(CompletionError::MissingApiKey.to_string());
        return;
    }
    app.session.set_api_key(&key);
    app.conversation().dismiss_error();
    app.ui.clear_status();
    app.ui.show_chat();
}

/// Close the current notice. An authentication problem sends the user back
/// to the key field.
fn dismiss_notice(app: &mut App) {
    let auth_failure = app
        .session
        .current_error()
        .is_some_and(CompletionError::is_auth);
    app.conversation().dismiss_error();
    app.ui.clear_status();
    if auth_failure {
        app.ui.set_key_text(app.session.api_key());
        app.ui.show_key_gate();
    }
}
