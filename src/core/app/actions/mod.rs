mod controls;
mod streaming;

use super::App;
use crate::core::chat_stream::StreamParams;
use crate::core::error::CompletionError;
use crate::core::params::Parameter;

pub enum AppAction {
    StreamChunk {
        content: String,
        stream_id: u64,
    },
    StreamErrored {
        error: CompletionError,
        stream_id: u64,
    },
    StreamCompleted {
        stream_id: u64,
    },
    SubmitMessage {
        message: String,
    },
    CancelStreaming,
    ClearChat,
    SubmitApiKey {
        key: String,
    },
    ForgetApiKey,
    AdjustParameter {
        parameter: Parameter,
        steps: i32,
    },
    ResetParameter {
        parameter: Parameter,
    },
    SelectModel {
        delta: i32,
    },
    SelectPreset {
        delta: i32,
    },
    DismissNotice,
    InputEdited,
    SetStatus {
        message: String,
    },
    ClearStatus,
}

pub enum AppCommand {
    SpawnStream(StreamParams),
}

pub fn apply_actions(app: &mut App, actions: impl IntoIterator<Item = AppAction>) -> Vec<AppCommand> {
    let mut commands = Vec::new();
    for action in actions {
        if let Some(cmd) = apply_action(app, action) {
            commands.push(cmd);
        }
    }
    commands
}

pub fn apply_action(app: &mut App, action: AppAction) -> Option<AppCommand> {
    match action {
        AppAction::StreamChunk { .. }
        | AppAction::StreamErrored { .. }
        | AppAction::StreamCompleted { .. }
        | AppAction::SubmitMessage { .. }
        | AppAction::CancelStreaming
        | AppAction::ClearChat => streaming::handle_streaming_action(app, action),

        AppAction::SubmitApiKey { .. }
        | AppAction::ForgetApiKey
        | AppAction::AdjustParameter { .. }
        | AppAction::ResetParameter { .. }
        | AppAction::SelectModel { .. }
        | AppAction::SelectPreset { .. }
        | AppAction::DismissNotice
        | AppAction::InputEdited
        | AppAction::SetStatus { .. }
        | AppAction::ClearStatus => controls::handle_control_action(app, action),
    }
}
