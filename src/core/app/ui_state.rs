use crate::core::params::Parameter;
use crate::ui::theme::Theme;
use ratatui::widgets::{Block, Borders};
use std::time::Instant;
use tui_textarea::{CursorMove, TextArea};

pub const INPUT_PLACEHOLDER: &str = "What is up?";
const API_KEY_MASK: char = '•';

/// Which top-level screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// The API key prompt shown before any chatting.
    KeyGate,
    Chat,
}

/// Which pane receives key presses on the chat screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiFocus {
    Input,
    Sidebar,
}

/// One selectable row of the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarRow {
    Model,
    Preset,
    Parameter(Parameter),
    ClearChat,
}

impl SidebarRow {
    pub const ALL: [SidebarRow; 8] = [
        SidebarRow::Model,
        SidebarRow::Preset,
        SidebarRow::Parameter(Parameter::MaxTokens),
        SidebarRow::Parameter(Parameter::Temperature),
        SidebarRow::Parameter(Parameter::TopP),
        SidebarRow::Parameter(Parameter::TopK),
        SidebarRow::Parameter(Parameter::FrequencyPenalty),
        SidebarRow::ClearChat,
    ];
}

pub struct UiState {
    pub screen: Screen,
    pub focus: UiFocus,
    pub sidebar_index: usize,
    textarea: TextArea<'static>,
    key_input: TextArea<'static>,
    pub theme: Theme,
    pub status: Option<String>,
    pub status_set_at: Option<Instant>,
    /// Lines scrolled up from the bottom of the transcript; 0 follows new output.
    pub scroll_from_bottom: u16,
    /// Largest useful `scroll_from_bottom`, as of the last frame.
    pub max_scroll: u16,
    pub pulse_start: Instant,
    pub exit_requested: bool,
}

impl UiState {
    pub fn new(theme: Theme) -> Self {
        let mut ui = Self {
            screen: Screen::KeyGate,
            focus: UiFocus::Input,
            sidebar_index: 0,
            textarea: TextArea::default(),
            key_input: TextArea::default(),
            theme,
            status: None,
            status_set_at: None,
            scroll_from_bottom: 0,
            max_scroll: 0,
            pulse_start: Instant::now(),
            exit_requested: false,
        };
        ui.configure_textarea();
        ui.configure_key_input();
        ui
    }

    pub(crate) fn configure_textarea(&mut self) {
        self.textarea.set_style(
            self.theme
                .input_text_style
                .patch(ratatui::style::Style::default().bg(self.theme.background_color)),
        );
        self.textarea.set_cursor_style(self.theme.input_cursor_style);
        self.textarea
            .set_cursor_line_style(ratatui::style::Style::default());
        self.textarea.set_placeholder_text(INPUT_PLACEHOLDER);
        self.textarea
            .set_placeholder_style(self.theme.input_placeholder_style);
        let border = if self.focus == UiFocus::Input {
            self.theme.focused_border_style
        } else {
            self.theme.border_style
        };
        self.textarea.set_block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(" Message "),
        );
    }

    fn configure_key_input(&mut self) {
        self.key_input.set_mask_char(API_KEY_MASK);
        self.key_input.set_style(self.theme.input_text_style);
        self.key_input.set_cursor_style(self.theme.input_cursor_style);
        self.key_input
            .set_cursor_line_style(ratatui::style::Style::default());
        self.key_input.set_placeholder_text("API key");
        self.key_input
            .set_placeholder_style(self.theme.input_placeholder_style);
        self.key_input.set_block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(self.theme.focused_border_style)
                .title(" API key "),
        );
    }

    pub fn textarea(&self) -> &TextArea<'static> {
        &self.textarea
    }

    pub fn textarea_mut(&mut self) -> &mut TextArea<'static> {
        &mut self.textarea
    }

    pub fn key_input(&self) -> &TextArea<'static> {
        &self.key_input
    }

    pub fn key_input_mut(&mut self) -> &mut TextArea<'static> {
        &mut self.key_input
    }

    pub fn get_input_text(&self) -> String {
        self.textarea.lines().join("\n")
    }

    pub fn has_draft(&self) -> bool {
        self.textarea.lines().iter().any(|line| !line.trim().is_empty())
    }

    /// Replace the input contents, leaving the cursor at the end.
    pub fn set_input_text(&mut self, text: String) {
        let lines: Vec<String> = if text.is_empty() {
            Vec::new()
        } else {
            text.split('\n').map(str::to_string).collect()
        };
        self.textarea = TextArea::from(lines);
        self.textarea.move_cursor(CursorMove::Bottom);
        self.textarea.move_cursor(CursorMove::End);
        self.configure_textarea();
    }

    pub fn clear_input(&mut self) {
        self.set_input_text(String::new());
    }

    /// Number of text rows the input box wants, borders excluded.
    pub fn input_rows(&self, max_rows: u16) -> u16 {
        (self.textarea.lines().len() as u16).clamp(1, max_rows.max(1))
    }

    pub fn key_text(&self) -> String {
        self.key_input.lines().concat()
    }

    pub fn set_key_text(&mut self, key: &str) {
        self.key_input = TextArea::from([key.trim().to_string()]);
        self.key_input.move_cursor(CursorMove::End);
        self.configure_key_input();
    }

    pub fn show_key_gate(&mut self) {
        self.screen = Screen::KeyGate;
    }

    pub fn show_chat(&mut self) {
        self.screen = Screen::Chat;
        self.focus_input();
    }

    pub fn focus_input(&mut self) {
        self.focus = UiFocus::Input;
        self.configure_textarea();
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            UiFocus::Input => UiFocus::Sidebar,
            UiFocus::Sidebar => UiFocus::Input,
        };
        self.configure_textarea();
    }

    pub fn selected_row(&self) -> SidebarRow {
        SidebarRow::ALL[self.sidebar_index.min(SidebarRow::ALL.len() - 1)]
    }

    pub fn move_selection(&mut self, delta: i32) {
        let len = SidebarRow::ALL.len() as i32;
        self.sidebar_index = (self.sidebar_index as i32 + delta).clamp(0, len - 1) as usize;
    }

    pub fn set_status<S: Into<String>>(&mut self, status: S) {
        self.status = Some(status.into());
        self.status_set_at = Some(Instant::now());
    }

    pub fn clear_status(&mut self) {
        self.status = None;
        self.status_set_at = None;
    }

    pub fn begin_streaming(&mut self) {
        self.pulse_start = Instant::now();
        self.scroll_to_bottom();
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll_from_bottom = self
            .scroll_from_bottom
            .saturating_add(lines)
            .min(self.max_scroll);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(lines);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_from_bottom = 0;
    }

    pub fn is_following_output(&self) -> bool {
        self.scroll_from_bottom == 0
    }

    /// Record the scroll range of the frame just drawn.
    pub fn update_scroll_bounds(&mut self, max_scroll: u16) {
        self.max_scroll = max_scroll;
        self.scroll_from_bottom = self.scroll_from_bottom.min(max_scroll);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ui() -> UiState {
        UiState::new(Theme::dark_default())
    }

    #[test]
    fn starts_on_key_gate_with_empty_input() {
        let ui = ui();
        assert_eq!(ui.screen, Screen::KeyGate);
        assert_eq!(ui.get_input_text(), "");
        assert!(!ui.has_draft());
    }

    #[test]
    fn set_input_text_round_trips_multiline() {
        let mut ui = ui();
        ui.set_input_text("first\nsecond".to_string());
        assert_eq!(ui.get_input_text(), "first\nsecond");
        assert_eq!(ui.input_rows(6), 2);
        assert_eq!(ui.textarea().cursor(), (1, 6));
    }

    #[test]
    fn key_text_is_trimmed() {
        let mut ui = ui();
        ui.set_key_text("  sk-123  ");
        assert_eq!(ui.key_text(), "sk-123");
    }

    #[test]
    fn sidebar_selection_clamps_at_ends() {
        let mut ui = ui();
        ui.move_selection(-3);
        assert_eq!(ui.selected_row(), SidebarRow::Model);
        ui.move_selection(100);
        assert_eq!(ui.selected_row(), SidebarRow::ClearChat);
    }

    #[test]
    fn scrolling_is_bounded_by_last_frame() {
        let mut ui = ui();
        ui.update_scroll_bounds(5);
        ui.scroll_up(10);
        assert_eq!(ui.scroll_from_bottom, 5);
        ui.scroll_down(2);
        assert_eq!(ui.scroll_from_bottom, 3);
        ui.update_scroll_bounds(1);
        assert_eq!(ui.scroll_from_bottom, 1);
        ui.scroll_to_bottom();
        assert!(ui.is_following_output());
    }
}
