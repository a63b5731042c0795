//! Greedy word wrapping for styled lines.
//!
//! The transcript is pre-wrapped here rather than by `Paragraph::wrap` so the
//! renderer knows exactly how many rows it holds and can scroll precisely.

use ratatui::layout::Alignment;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

#[derive(Default)]
struct RowBuilder {
    pieces: Vec<(String, Style)>,
    width: usize,
}

impl RowBuilder {
    fn push(&mut self, text: &str, style: Style, width: usize) {
        match self.pieces.last_mut() {
            Some((last, last_style)) if *last_style == style => last.push_str(text),
            _ => self.pieces.push((text.to_string(), style)),
        }
        self.width += width;
    }

    fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    fn trim_trailing_whitespace(&mut self) {
        while let Some((text, _)) = self.pieces.last_mut() {
            let trimmed_len = text.trim_end().len();
            self.width -= text[trimmed_len..].width();
            text.truncate(trimmed_len);
            if text.is_empty() {
                self.pieces.pop();
            } else {
                break;
            }
        }
    }

    fn finish(&mut self, line_style: Style, alignment: Option<Alignment>) -> Line<'static> {
        let spans: Vec<Span<'static>> = std::mem::take(&mut self.pieces)
            .into_iter()
            .map(|(text, style)| Span::styled(text, style))
            .collect();
        self.width = 0;
        let mut line = Line::from(spans).style(line_style);
        line.alignment = alignment;
        line
    }
}

/// Runs of whitespace and runs of everything else, in order.
fn tokens(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let space = first.is_whitespace();
        let end = rest
            .char_indices()
            .find(|(_, ch)| ch.is_whitespace() != space)
            .map(|(index, _)| index)
            .unwrap_or(rest.len());
        let (token, tail) = rest.split_at(end);
        rest = tail;
        Some(token)
    })
}

/// Wrap `line` into rows no wider than `max_width` columns.
///
/// Whitespace at a break is dropped, leading indentation of the first row is
/// kept, and words longer than a whole row are split. Span styles and the
/// line's alignment carry over to every row.
pub fn wrap_line(line: &Line<'static>, max_width: usize) -> Vec<Line<'static>> {
    let max_width = max_width.max(1);
    let mut rows = Vec::new();
    let mut row = RowBuilder::default();
    let mut after_break = false;

    for span in &line.spans {
        let style = span.style;
        for token in tokens(&span.content) {
            let token_width = token.width();
            if token.starts_with(char::is_whitespace) {
                if after_break && row.is_empty() {
                    continue;
                }
                if row.width + token_width <= max_width {
                    row.push(token, style, token_width);
                } else {
                    rows.push(row.finish(line.style, line.alignment));
                    after_break = true;
                }
                continue;
            }

            if row.width + token_width <= max_width {
                row.push(token, style, token_width);
            } else if token_width <= max_width {
                row.trim_trailing_whitespace();
                rows.push(row.finish(line.style, line.alignment));
                row.push(token, style, token_width);
            } else {
                for ch in token.chars() {
                    let ch_width = ch.width().unwrap_or(0);
                    if row.width + ch_width > max_width && !row.is_empty() {
                        row.trim_trailing_whitespace();
                        rows.push(row.finish(line.style, line.alignment));
                    }
                    let mut buf = [0u8; 4];
                    row.push(ch.encode_utf8(&mut buf), style, ch_width);
                }
            }
            after_break = false;
        }
    }

    if !row.is_empty() || rows.is_empty() {
        rows.push(row.finish(line.style, line.alignment));
    }
    rows
}

pub fn wrap_lines(lines: &[Line<'static>], max_width: usize) -> Vec<Line<'static>> {
    lines
        .iter()
        .flat_map(|line| wrap_line(line, max_width))
        .collect()
}
