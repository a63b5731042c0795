//! Chat bubbles for the transcript pane.

use std::time::Duration;

use ratatui::layout::Alignment;
use ratatui::text::{Line, Span};

use crate::core::message::{Message, Role};
use crate::ui::markdown::render_markdown;
use crate::ui::theme::Theme;
use crate::ui::wrap::{wrap_line, wrap_lines};

pub const USER_LABEL: &str = "You";
pub const ASSISTANT_LABEL: &str = "Assistant";

/// Pulsing dot shown while a response streams, two cycles per second.
pub fn pulse_symbol(elapsed: Duration) -> &'static str {
    let phase = (elapsed.as_secs_f32() * 2.0) % 2.0;
    let intensity = if phase < 1.0 { phase } else { 2.0 - phase };
    if intensity < 0.33 {
        "○"
    } else if intensity < 0.66 {
        "◐"
    } else {
        "●"
    }
}

/// Width available to user bubbles; they sit on the right and leave a
/// margin on the left.
fn user_bubble_width(width: usize) -> usize {
    (width * 3 / 4).max(1)
}

fn user_bubble(content: &str, theme: &Theme, width: usize) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(USER_LABEL, theme.user_label_style))
        .alignment(Alignment::Right)];
    let bubble_width = user_bubble_width(width);
    for text in content.split('\n') {
        let line = Line::from(Span::styled(text.to_string(), theme.user_text_style))
            .alignment(Alignment::Right);
        lines.extend(wrap_line(&line, bubble_width));
    }
    lines
}

fn assistant_bubble(
    content: &str,
    theme: &Theme,
    width: usize,
    indicator: Option<&'static str>,
) -> Vec<Line<'static>> {
    let mut label = vec![Span::styled(ASSISTANT_LABEL, theme.assistant_label_style)];
    if let Some(symbol) = indicator {
        label.push(Span::raw(" "));
        label.push(Span::styled(symbol, theme.streaming_indicator_style));
    }
    let mut lines = vec![Line::from(label)];
    let body = render_markdown(content, theme.assistant_text_style, theme);
    lines.extend(wrap_lines(&body, width));
    lines
}

/// Every transcript row for a pane `width` columns wide, already wrapped.
///
/// System messages are never shown. `pending` is the partial reply of the
/// turn in flight; it is drawn with `indicator` next to its label.
pub fn build_transcript_lines(
    messages: &[Message],
    pending: Option<&str>,
    theme: &Theme,
    width: u16,
    indicator: &'static str,
) -> Vec<Line<'static>> {
    let width = usize::from(width).max(1);
    let mut lines: Vec<Line<'static>> = Vec::new();

    let mut push_bubble = |bubble: Vec<Line<'static>>| {
        if !lines.is_empty() {
            lines.push(Line::default());
        }
        lines.extend(bubble);
    };

    for message in messages {
        match message.role {
            Role::System => {}
            Role::User => push_bubble(user_bubble(&message.content, theme, width)),
            Role::Assistant => push_bubble(assistant_bubble(&message.content, theme, width, None)),
        }
    }
    if let Some(text) = pending {
        push_bubble(assistant_bubble(text, theme, width, Some(indicator)));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    fn build(messages: &[Message], pending: Option<&str>, width: u16) -> Vec<Line<'static>> {
        build_transcript_lines(messages, pending, &Theme::dark_default(), width, "●")
    }

    #[test]
    fn renders_user_and_assistant_bubbles() {
        let messages = vec![Message::user("Hello"), Message::assistant("Hi there!")];
        let lines = build(&messages, None, 40);
        let texts: Vec<String> = lines.iter().map(text_of).collect();
        assert_eq!(texts, vec!["You", "Hello", "", "Assistant", "Hi there!"]);
        assert_eq!(lines[0].alignment, Some(Alignment::Right));
        assert_eq!(lines[1].alignment, Some(Alignment::Right));
        assert_eq!(lines[3].alignment, None);
    }

    #[test]
    fn system_messages_are_hidden() {
        let messages = vec![Message::system("secret"), Message::user("Hi")];
        let texts: Vec<String> = build(&messages, None, 40).iter().map(text_of).collect();
        assert_eq!(texts, vec!["You", "Hi"]);
    }

    #[test]
    fn pending_reply_carries_indicator() {
        let messages = vec![Message::user("Hi")];
        let lines = build(&messages, Some("Partial"), 40);
        let texts: Vec<String> = lines.iter().map(text_of).collect();
        assert_eq!(texts[3], "Assistant ●");
        assert_eq!(texts[4], "Partial");
    }

    #[test]
    fn empty_pending_reply_shows_only_label() {
        let lines = build(&[Message::user("Hi")], Some(""), 40);
        assert_eq!(text_of(lines.last().expect("label row")), "Assistant ●");
    }

    #[test]
    fn user_bubbles_wrap_narrower_than_the_pane() {
        let messages = vec![Message::user("one two three four five six")];
        let lines = build(&messages, None, 16);
        // 12 columns for the bubble.
        let texts: Vec<String> = lines.iter().skip(1).map(text_of).collect();
        assert_eq!(texts, vec!["one two", "three four", "five six"]);
    }

    #[test]
    fn multiline_user_input_keeps_its_breaks() {
        let lines = build(&[Message::user("a\nb")], None, 40);
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn pulse_cycles_through_symbols() {
        assert_eq!(pulse_symbol(Duration::from_millis(0)), "○");
        assert_eq!(pulse_symbol(Duration::from_millis(250)), "◐");
        assert_eq!(pulse_symbol(Duration::from_millis(450)), "●");
        assert_eq!(pulse_symbol(Duration::from_millis(1000)), "○");
    }
}
