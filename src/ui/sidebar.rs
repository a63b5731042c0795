//! The settings column: model, preset, the five sliders, and "Clear chat".

use ratatui::style::Style;
use ratatui::text::{Line, Span};

use crate::core::app::{SessionContext, SidebarRow, UiFocus, UiState};
use crate::core::params::{Parameter, SamplingSettings};
use crate::ui::theme::Theme;

const CLEAR_CHAT_LABEL: &str = "[ Clear chat ]";

/// `[████░░░░]` sized to `width` columns including the brackets.
pub fn slider_bar(fraction: f64, width: usize, theme: &Theme) -> Vec<Span<'static>> {
    let inner = width.saturating_sub(2);
    let filled = ((fraction.clamp(0.0, 1.0) * inner as f64).round() as usize).min(inner);
    vec![
        Span::styled("[", theme.sidebar_text_style),
        Span::styled("█".repeat(filled), theme.slider_filled_style),
        Span::styled("░".repeat(inner - filled), theme.slider_empty_style),
        Span::styled("]", theme.sidebar_text_style),
    ]
}

fn label_with_value(label: &str, value: &str, width: usize, style: Style) -> Line<'static> {
    let gap = width
        .saturating_sub(label.chars().count() + value.chars().count())
        .max(1);
    Line::from(Span::styled(
        format!("{label}{}{value}", " ".repeat(gap)),
        style,
    ))
}

fn choice_line(value: &str, style: Style) -> Line<'static> {
    Line::from(Span::styled(format!("‹ {value} ›"), style))
}

fn parameter_lines(
    settings: &SamplingSettings,
    parameter: Parameter,
    width: usize,
    label_style: Style,
    theme: &Theme,
) -> Vec<Line<'static>> {
    vec![
        label_with_value(
            parameter.label(),
            &settings.display_value(parameter),
            width,
            label_style,
        ),
        Line::from(slider_bar(settings.fraction(parameter), width, theme)),
    ]
}

/// Sidebar rows for a column `width` cells wide, borders excluded.
pub fn build_sidebar_lines(session: &SessionContext, ui: &UiState, width: u16) -> Vec<Line<'static>> {
    let theme = &ui.theme;
    let width = usize::from(width).max(4);
    let highlight = ui.focus == UiFocus::Sidebar;
    let selected = ui.selected_row();
    let mut lines = Vec::new();

    for row in SidebarRow::ALL {
        let is_selected = highlight && row == selected;
        let label_style = if is_selected {
            theme.sidebar_selected_style
        } else {
            theme.sidebar_heading_style
        };
        let value_style = if is_selected {
            theme.sidebar_selected_style
        } else {
            theme.sidebar_text_style
        };

        match row {
            SidebarRow::Model => {
                lines.push(Line::from(Span::styled("Model", label_style)));
                lines.push(choice_line(session.models.selected_label(), value_style));
            }
            SidebarRow::Preset => {
                lines.push(Line::from(Span::styled("System prompt", label_style)));
                lines.push(choice_line(session.presets.active_label(), value_style));
            }
            SidebarRow::Parameter(parameter) => {
                lines.extend(parameter_lines(
                    &session.settings,
                    parameter,
                    width,
                    label_style,
                    theme,
                ));
            }
            SidebarRow::ClearChat => {
                lines.push(Line::from(Span::styled(CLEAR_CHAT_LABEL, value_style)));
            }
        }
        lines.push(Line::default());
    }

    let hint = if highlight {
        "↑/↓ select  ←/→ adjust  Tab back"
    } else {
        "Tab to adjust settings"
    };
    lines.push(Line::from(Span::styled(hint, theme.subtitle_style)));
    lines
}
