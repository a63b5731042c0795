//! Key presses to app actions.
//!
//! Text editing and focus/scroll changes are applied to the UI state
//! directly; anything that touches the session goes out as an [`AppAction`].

use crate::core::app::{App, AppAction, Screen, SidebarRow, UiFocus};
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tui_textarea::Input as TAInput;

/// Slider steps per Left/Right press with Shift held.
const LARGE_STEP: i32 = 10;

/// Handle one key press. `page_rows` is how far PageUp/PageDown scroll.
pub fn handle_key_event(app: &mut App, key: KeyEvent, page_rows: u16) -> Vec<AppAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('c') {
        app.ui.exit_requested = true;
        return Vec::new();
    }

    match app.ui.screen {
        Screen::KeyGate => handle_key_gate(app, key),
        Screen::Chat => handle_chat(app, key, page_rows),
    }
}

/// Keys that would insert a line break; the key field is single-line.
fn is_newline_key(key: &KeyEvent) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    matches!(key.code, KeyCode::Enter) || (ctrl && matches!(key.code, KeyCode::Char('m' | 'j')))
}

fn handle_key_gate(app: &mut App, key: KeyEvent) -> Vec<AppAction> {
    if key.code == KeyCode::Enter {
        return vec![AppAction::SubmitApiKey {
            key: app.ui.key_text(),
        }];
    }
    if is_newline_key(&key) {
        return Vec::new();
    }
    if app.ui.key_input_mut().input(TAInput::from(key)) {
        vec![AppAction::ClearStatus]
    } else {
        Vec::new()
    }
}

fn handle_chat(app: &mut App, key: KeyEvent, page_rows: u16) -> Vec<AppAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // The auth popup swallows everything until it is dismissed.
    if app.session.current_error().is_some_and(|err| err.is_auth()) {
        return match key.code {
            KeyCode::Esc | KeyCode::Enter => vec![AppAction::DismissNotice],
            _ => Vec::new(),
        };
    }

    match key.code {
        KeyCode::Char('l') if ctrl => return vec![AppAction::ClearChat],
        KeyCode::Char('k') if ctrl => return vec![AppAction::ForgetApiKey],
        KeyCode::Esc => return handle_escape(app),
        KeyCode::Tab | KeyCode::BackTab => {
            app.ui.toggle_focus();
            return Vec::new();
        }
        KeyCode::PageUp => {
            app.ui.scroll_up(page_rows.max(1));
            return Vec::new();
        }
        KeyCode::PageDown => {
            app.ui.scroll_down(page_rows.max(1));
            return Vec::new();
        }
        _ => {}
    }

    match app.ui.focus {
        UiFocus::Sidebar => handle_sidebar(app, key),
        UiFocus::Input => handle_input(app, key),
    }
}

fn handle_escape(app: &mut App) -> Vec<AppAction> {
    if app.session.is_streaming() {
        vec![AppAction::CancelStreaming]
    } else if app.session.current_error().is_some() {
        vec![AppAction::DismissNotice]
    } else if app.ui.status.is_some() {
        vec![AppAction::ClearStatus]
    } else {
        if app.ui.focus == UiFocus::Sidebar {
            app.ui.focus_input();
        }
        Vec::new()
    }
}

fn handle_sidebar(app: &mut App, key: KeyEvent) -> Vec<AppAction> {
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);
    let direction = match key.code {
        KeyCode::Left => -1,
        KeyCode::Right => 1,
        KeyCode::Up => {
            app.ui.move_selection(-1);
            return Vec::new();
        }
        KeyCode::Down => {
            app.ui.move_selection(1);
            return Vec::new();
        }
        KeyCode::Enter => {
            return match app.ui.selected_row() {
                SidebarRow::ClearChat => vec![AppAction::ClearChat],
                SidebarRow::Model => vec![AppAction::SelectModel { delta: 1 }],
                SidebarRow::Preset => vec![AppAction::SelectPreset { delta: 1 }],
                SidebarRow::Parameter(_) => {
                    app.ui.focus_input();
                    Vec::new()
                }
            };
        }
        KeyCode::Backspace | KeyCode::Delete => {
            return match app.ui.selected_row() {
                SidebarRow::Parameter(parameter) => vec![AppAction::ResetParameter { parameter }],
                _ => Vec::new(),
            };
        }
        _ => return Vec::new(),
    };

    match app.ui.selected_row() {
        SidebarRow::Model => vec![AppAction::SelectModel { delta: direction }],
        SidebarRow::Preset => vec![AppAction::SelectPreset { delta: direction }],
        SidebarRow::Parameter(parameter) => {
            let scale = if shift { LARGE_STEP } else { 1 };
            vec![AppAction::AdjustParameter {
                parameter,
                steps: direction * scale,
            }]
        }
        SidebarRow::ClearChat => Vec::new(),
    }
}

fn handle_input(app: &mut App, key: KeyEvent) -> Vec<AppAction> {
    if key.code == KeyCode::Enter {
        if key.modifiers.contains(KeyModifiers::ALT) {
            app.ui.textarea_mut().insert_newline();
            return vec![AppAction::InputEdited];
        }
        return vec![AppAction::SubmitMessage {
            message: app.ui.get_input_text(),
        }];
    }

    if app.ui.textarea_mut().input(TAInput::from(key)) {
        vec![AppAction::InputEdited]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::app::TurnState;
    use crate::core::error::CompletionError;
    use crate::core::params::Parameter;
    use crate::utils::test_utils::create_test_app;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn press_with(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            handle_key_event(app, press(KeyCode::Char(ch)), 10);
        }
    }

    #[test]
    fn ctrl_c_requests_exit_on_any_screen() {
        let mut app = create_test_app();
        app.ui.show_key_gate();
        handle_key_event(&mut app, press_with(KeyCode::Char('c'), KeyModifiers::CONTROL), 10);
        assert!(app.ui.exit_requested);
    }

    #[test]
    fn key_gate_enter_submits_typed_key() {
        let mut app = create_test_app();
        app.ui.show_key_gate();
        app.ui.set_key_text("");
        type_text(&mut app, "sk-1");
        let actions = handle_key_event(&mut app, press(KeyCode::Enter), 10);
        assert!(matches!(
            actions.as_slice(),
            [AppAction::SubmitApiKey { key }] if key == "sk-1"
        ));
    }

    #[test]
    fn enter_submits_and_alt_enter_adds_newline() {
        let mut app = create_test_app();
        type_text(&mut app, "hi");
        let actions = handle_key_event(&mut app, press_with(KeyCode::Enter, KeyModifiers::ALT), 10);
        assert!(matches!(actions.as_slice(), [AppAction::InputEdited]));
        type_text(&mut app, "there");
        let actions = handle_key_event(&mut app, press(KeyCode::Enter), 10);
        assert!(matches!(
            actions.as_slice(),
            [AppAction::SubmitMessage { message }] if message == "hi\nthere"
        ));
    }

    #[test]
    fn typing_reports_input_edits() {
        let mut app = create_test_app();
        let actions = handle_key_event(&mut app, press(KeyCode::Char('x')), 10);
        assert!(matches!(actions.as_slice(), [AppAction::InputEdited]));
        assert_eq!(app.ui.get_input_text(), "x");
    }

    #[test]
    fn sidebar_arrows_adjust_the_selected_slider() {
        let mut app = create_test_app();
        handle_key_event(&mut app, press(KeyCode::Tab), 10);
        assert_eq!(app.ui.focus, UiFocus::Sidebar);
        handle_key_event(&mut app, press(KeyCode::Down), 10);
        handle_key_event(&mut app, press(KeyCode::Down), 10);
        handle_key_event(&mut app, press(KeyCode::Down), 10);
        assert_eq!(app.ui.selected_row(), SidebarRow::Parameter(Parameter::Temperature));

        let actions = handle_key_event(&mut app, press(KeyCode::Right), 10);
        assert!(matches!(
            actions.as_slice(),
            [AppAction::AdjustParameter { parameter: Parameter::Temperature, steps: 1 }]
        ));
        let actions =
            handle_key_event(&mut app, press_with(KeyCode::Left, KeyModifiers::SHIFT), 10);
        assert!(matches!(
            actions.as_slice(),
            [AppAction::AdjustParameter { parameter: Parameter::Temperature, steps: -10 }]
        ));
    }

    #[test]
    fn sidebar_cycles_model_and_preset() {
        let mut app = create_test_app();
        app.ui.toggle_focus();
        let actions = handle_key_event(&mut app, press(KeyCode::Left), 10);
        assert!(matches!(actions.as_slice(), [AppAction::SelectModel { delta: -1 }]));
        handle_key_event(&mut app, press(KeyCode::Down), 10);
        let actions = handle_key_event(&mut app, press(KeyCode::Right), 10);
        assert!(matches!(actions.as_slice(), [AppAction::SelectPreset { delta: 1 }]));
    }

    #[test]
    fn sidebar_clear_row_clears_chat() {
        let mut app = create_test_app();
        app.ui.toggle_focus();
        app.ui.move_selection(100);
        let actions = handle_key_event(&mut app, press(KeyCode::Enter), 10);
        assert!(matches!(actions.as_slice(), [AppAction::ClearChat]));
    }

    #[test]
    fn escape_cancels_while_streaming() {
        let mut app = create_test_app();
        app.session.turn = TurnState::StreamingResponse;
        let actions = handle_key_event(&mut app, press(KeyCode::Esc), 10);
        assert!(matches!(actions.as_slice(), [AppAction::CancelStreaming]));
    }

    #[test]
    fn auth_popup_swallows_typing() {
        let mut app = create_test_app();
        app.session.turn = TurnState::ErrorDisplayed(CompletionError::Authentication {
            status: 401,
            message: "nope".to_string(),
        });
        assert!(handle_key_event(&mut app, press(KeyCode::Char('a')), 10).is_empty());
        assert_eq!(app.ui.get_input_text(), "");
        let actions = handle_key_event(&mut app, press(KeyCode::Esc), 10);
        assert!(matches!(actions.as_slice(), [AppAction::DismissNotice]));
    }

    #[test]
    fn page_keys_scroll_within_bounds() {
        let mut app = create_test_app();
        app.ui.update_scroll_bounds(25);
        handle_key_event(&mut app, press(KeyCode::PageUp), 10);
        assert_eq!(app.ui.scroll_from_bottom, 10);
        handle_key_event(&mut app, press(KeyCode::PageDown), 4);
        assert_eq!(app.ui.scroll_from_bottom, 6);
    }

    #[test]
    fn control_shortcuts_map_to_actions() {
        let mut app = create_test_app();
        let actions =
            handle_key_event(&mut app, press_with(KeyCode::Char('l'), KeyModifiers::CONTROL), 10);
        assert!(matches!(actions.as_slice(), [AppAction::ClearChat]));
        let actions =
            handle_key_event(&mut app, press_with(KeyCode::Char('k'), KeyModifiers::CONTROL), 10);
        assert!(matches!(actions.as_slice(), [AppAction::ForgetApiKey]));
    }
}
