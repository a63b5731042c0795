use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone)]
pub struct Theme {
    pub background_color: Color,

    // Chat bubbles
    pub user_label_style: Style,
    pub user_text_style: Style,
    pub assistant_label_style: Style,
    pub assistant_text_style: Style,
    pub streaming_indicator_style: Style,

    // Markdown
    pub md_heading_style: Style,
    pub md_code_style: Style,
    pub md_link_style: Style,
    pub md_quote_style: Style,
    pub md_list_marker_style: Style,

    // Chrome
    pub title_style: Style,
    pub subtitle_style: Style,
    pub border_style: Style,
    pub focused_border_style: Style,
    pub status_style: Style,
    pub error_style: Style,

    // Sidebar
    pub sidebar_heading_style: Style,
    pub sidebar_text_style: Style,
    pub sidebar_selected_style: Style,
    pub slider_filled_style: Style,
    pub slider_empty_style: Style,

    // Input area
    pub input_text_style: Style,
    pub input_placeholder_style: Style,
    pub input_cursor_style: Style,
}

impl Theme {
    pub fn dark_default() -> Self {
        Theme {
            background_color: Color::Black,

            user_label_style: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(Color::Cyan),
            assistant_label_style: Style::default()
                .fg(Color::LightMagenta)
                .add_modifier(Modifier::BOLD),
            assistant_text_style: Style::default().fg(Color::White),
            streaming_indicator_style: Style::default().fg(Color::LightMagenta),

            md_heading_style: Style::default()
                .fg(Color::LightBlue)
                .add_modifier(Modifier::BOLD),
            md_code_style: Style::default().fg(Color::LightYellow),
            md_link_style: Style::default()
                .fg(Color::LightBlue)
                .add_modifier(Modifier::UNDERLINED),
            md_quote_style: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
            md_list_marker_style: Style::default().fg(Color::Yellow),

            title_style: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            subtitle_style: Style::default().fg(Color::DarkGray),
            border_style: Style::default().fg(Color::DarkGray),
            focused_border_style: Style::default().fg(Color::Cyan),
            status_style: Style::default().fg(Color::Gray),
            error_style: Style::default()
                .fg(Color::LightRed)
                .add_modifier(Modifier::BOLD),

            sidebar_heading_style: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::BOLD),
            sidebar_text_style: Style::default().fg(Color::White),
            sidebar_selected_style: Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            slider_filled_style: Style::default().fg(Color::Cyan),
            slider_empty_style: Style::default().fg(Color::DarkGray),

            input_text_style: Style::default().fg(Color::White),
            input_placeholder_style: Style::default().fg(Color::DarkGray),
            input_cursor_style: Style::default().add_modifier(Modifier::REVERSED),
        }
    }

    pub fn light() -> Self {
        Theme {
            background_color: Color::White,

            user_label_style: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(Color::Blue),
            assistant_label_style: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            assistant_text_style: Style::default().fg(Color::Black),
            streaming_indicator_style: Style::default().fg(Color::Magenta),

            md_heading_style: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            md_code_style: Style::default().fg(Color::Red),
            md_link_style: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),
            md_quote_style: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
            md_list_marker_style: Style::default().fg(Color::Magenta),

            title_style: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            subtitle_style: Style::default().fg(Color::DarkGray),
            border_style: Style::default().fg(Color::Gray),
            focused_border_style: Style::default().fg(Color::Blue),
            status_style: Style::default().fg(Color::DarkGray),
            error_style: Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),

            sidebar_heading_style: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
            sidebar_text_style: Style::default().fg(Color::Black),
            sidebar_selected_style: Style::default()
                .fg(Color::White)
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            slider_filled_style: Style::default().fg(Color::Blue),
            slider_empty_style: Style::default().fg(Color::Gray),

            input_text_style: Style::default().fg(Color::Black),
            input_placeholder_style: Style::default().fg(Color::Gray),
            input_cursor_style: Style::default().add_modifier(Modifier::REVERSED),
        }
    }

    /// Theme by name; unknown names fall back to the dark palette.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "light" => Self::light(),
            "dark" => Self::dark_default(),
            other => {
                tracing::warn!("unknown theme '{other}', using dark");
                Self::dark_default()
            }
        }
    }
}
