use crate::core::app::{App, Screen, UiFocus};
use crate::ui::sidebar::build_sidebar_lines;
use crate::ui::transcript_view::{build_transcript_lines, pulse_symbol};
use crate::utils::auth::mask_api_key;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

pub const APP_TITLE: &str = "Multiplyr LLM Playground";
const SIDEBAR_WIDTH: u16 = 34;
const MAX_INPUT_ROWS: u16 = 6;
const KEY_GATE_WIDTH: u16 = 60;
const KEY_GATE_SUBTITLE: &str = "Chat with LLMs hosted by Multiplyr";
const KEY_GATE_PROMPT: &str =
    "Please add your API key to continue. Request new API keys at https://x.com/AffineDeFi";

/// Draw one frame. Returns the transcript's scroll range for the frame so
/// the caller can bound scrolling; the key gate reports zero.
pub fn ui(f: &mut Frame, app: &App) -> u16 {
    let background = Block::default().style(Style::default().bg(app.ui.theme.background_color));
    f.render_widget(background, f.area());

    match app.ui.screen {
        Screen::KeyGate => {
            draw_key_gate(f, app);
            0
        }
        Screen::Chat => draw_chat(f, app),
    }
}

fn draw_key_gate(f: &mut Frame, app: &App) {
    let theme = &app.ui.theme;
    let area = centered_rect(KEY_GATE_WIDTH, 9, f.area());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // title
            Constraint::Length(1), // subtitle
            Constraint::Length(1),
            Constraint::Length(3), // key field
            Constraint::Length(1),
            Constraint::Length(2), // notice
        ])
        .split(area);

    f.render_widget(
        Paragraph::new(Span::styled(APP_TITLE, theme.title_style)).alignment(Alignment::Center),
        chunks[0],
    );
    f.render_widget(
        Paragraph::new(Span::styled(KEY_GATE_SUBTITLE, theme.subtitle_style))
        .alignment(Alignment::Center),
        chunks[1],
    );
    f.render_widget(app.ui.key_input(), chunks[3]);

    let notice = if let Some(status) = &app.ui.status {
        Span::styled(status.clone(), theme.error_style)
    } else if app.ui.key_text().is_empty() {
        Span::styled(KEY_GATE_PROMPT, theme.status_style)
    } else {
        Span::styled("Enter to continue · Ctrl+C to quit", theme.status_style)
    };
    f.render_widget(
        Paragraph::new(notice)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        chunks[5],
    );
}

fn draw_chat(f: &mut Frame, app: &App) -> u16 {
    let theme = &app.ui.theme;
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
        .split(f.area());

    draw_sidebar(f, app, columns[0]);

    let input_height = app.ui.input_rows(MAX_INPUT_ROWS) + 2;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(input_height),
        ])
        .split(columns[1]);

    f.render_widget(Paragraph::new(header_line(app)), rows[0]);
    let max_scroll = draw_transcript(f, app, rows[1]);
    f.render_widget(Paragraph::new(notice_line(app)), rows[2]);
    f.render_widget(app.ui.textarea(), rows[3]);

    if let Some(err) = app.session.current_error().filter(|err| err.is_auth()) {
        let area = centered_rect(56, 7, f.area());
        let text = vec![
            Line::from(Span::styled(err.to_string(), theme.error_style)),
            Line::default(),
            Line::from(Span::styled(
                "Press Esc to re-enter your API key.",
                theme.status_style,
            )),
        ];
        let popup = Paragraph::new(text)
            .wrap(Wrap { trim: true })
            .style(Style::default().bg(theme.background_color))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.error_style)
                    .title(" Authentication failed "),
            );
        f.render_widget(Clear, area);
        f.render_widget(popup, area);
    }

    max_scroll
}

fn draw_sidebar(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.ui.theme;
    let border = if app.ui.focus == UiFocus::Sidebar {
        theme.focused_border_style
    } else {
        theme.border_style
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(" Settings ");
    let inner_width = block.inner(area).width;
    let lines = build_sidebar_lines(&app.session, &app.ui, inner_width);
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_transcript(f: &mut Frame, app: &App, area: Rect) -> u16 {
    let indicator = pulse_symbol(app.ui.pulse_start.elapsed());
    let lines = build_transcript_lines(
        app.session.transcript.messages(),
        app.session.pending_text(),
        &app.ui.theme,
        area.width,
        indicator,
    );

    let (visible, max_scroll) =
        visible_window(lines, area.height, app.ui.scroll_from_bottom);
    f.render_widget(Paragraph::new(visible), area);
    max_scroll
}

/// Cut the rows that fit in `height`, `scroll_from_bottom` rows up from the
/// end. The returned range saturates at `u16::MAX`; the newest rows are
/// reachable regardless of transcript length.
fn visible_window(
    mut lines: Vec<Line<'static>>,
    height: u16,
    scroll_from_bottom: u16,
) -> (Vec<Line<'static>>, u16) {
    let max_scroll = lines.len().saturating_sub(usize::from(height));
    let offset = usize::from(scroll_from_bottom).min(max_scroll);
    let top = max_scroll - offset;
    lines.truncate(top + usize::from(height));
    lines.drain(..top);
    (lines, u16::try_from(max_scroll).unwrap_or(u16::MAX))
}

fn header_line(app: &App) -> Line<'static> {
    let theme = &app.ui.theme;
    Line::from(vec![
        Span::styled(APP_TITLE, theme.title_style),
        Span::styled(
            format!(
                " · {} · key {}",
                app.session.models.selected_label(),
                mask_api_key(app.session.api_key())
            ),
            theme.subtitle_style,
        ),
    ])
}

fn notice_line(app: &App) -> Line<'static> {
    let theme = &app.ui.theme;
    if let Some(err) = app.session.current_error().filter(|err| !err.is_auth()) {
        return Line::from(Span::styled(
            format!("Error: {err} (Esc to dismiss)"),
            theme.error_style,
        ));
    }
    if let Some(status) = &app.ui.status {
        return Line::from(Span::styled(status.clone(), theme.status_style));
    }
    let hint = if app.session.is_streaming() {
        "Streaming… Esc to stop"
    } else if !app.ui.is_following_output() {
        "Scrolled up · PageDown to follow"
    } else {
        "Enter send · Alt+Enter newline · Tab settings · Ctrl+L clear · Ctrl+C quit"
    };
    Line::from(Span::styled(hint, theme.subtitle_style))
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
