//! Markdown to styled terminal lines for assistant bubbles.
//!
//! Output is unwrapped; callers run it through [`crate::ui::wrap`] for the
//! current width.

use crate::ui::theme::Theme;
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

const RULE_WIDTH: usize = 24;

pub fn render_markdown(content: &str, base_style: Style, theme: &Theme) -> Vec<Line<'static>> {
    MarkdownRenderer::new(base_style, theme).render(content)
}

struct MarkdownRenderer<'a> {
    theme: &'a Theme,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    style_stack: Vec<Style>,
    /// Next number for ordered lists, `None` for bullets.
    list_stack: Vec<Option<u64>>,
    quote_depth: usize,
    in_code_block: bool,
}

impl<'a> MarkdownRenderer<'a> {
    fn new(base_style: Style, theme: &'a Theme) -> Self {
        Self {
            theme,
            lines: Vec::new(),
            current: Vec::new(),
            style_stack: vec![base_style],
            list_stack: Vec::new(),
            quote_depth: 0,
            in_code_block: false,
        }
    }

    fn style(&self) -> Style {
        self.style_stack.last().copied().unwrap_or_default()
    }

    fn push_style(&mut self, patch: Style) {
        let style = self.style().patch(patch);
        self.style_stack.push(style);
    }

    fn pop_style(&mut self) {
        if self.style_stack.len() > 1 {
            self.style_stack.pop();
        }
    }

    fn push_span(&mut self, span: Span<'static>) {
        if self.current.is_empty() && self.quote_depth > 0 {
            self.current.push(Span::styled(
                "│ ".repeat(self.quote_depth),
                self.theme.md_quote_style,
            ));
        }
        self.current.push(span);
    }

    fn push_text(&mut self, text: &str) {
        let mut style = self.style();
        if self.quote_depth > 0 {
            style = style.patch(self.theme.md_quote_style);
        }
        self.push_span(Span::styled(text.to_string(), style));
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.current)));
        }
    }

    /// Close the current line and leave one blank line before the next block.
    fn start_block(&mut self) {
        self.flush();
        let in_list = !self.list_stack.is_empty();
        if !in_list && self.lines.last().is_some_and(|line| line.width() > 0) {
            self.lines.push(Line::default());
        }
    }

    fn start_item(&mut self) {
        self.flush();
        let depth = self.list_stack.len().saturating_sub(1);
        let marker = match self.list_stack.last_mut() {
            Some(Some(number)) => {
                let marker = format!("{number}. ");
                *number += 1;
                marker
            }
            _ => "• ".to_string(),
        };
        let indent = "  ".repeat(depth);
        self.push_span(Span::styled(
            format!("{indent}{marker}"),
            self.theme.md_list_marker_style,
        ));
    }

    fn code_block_text(&mut self, text: &str) {
        let style = self.theme.md_code_style;
        for (index, line) in text.split('\n').enumerate() {
            if index > 0 {
                self.flush();
            }
            if !line.is_empty() {
                self.push_span(Span::styled(format!("  {line}"), style));
            }
        }
    }

    fn heading_style(&self, level: HeadingLevel) -> Style {
        let style = self.theme.md_heading_style;
        if level == HeadingLevel::H1 {
            style.add_modifier(Modifier::UNDERLINED)
        } else {
            style
        }
    }

    fn render(mut self, content: &str) -> Vec<Line<'static>> {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        for event in Parser::new_ext(content, options) {
            match event {
                Event::Start(tag) => match tag {
                    Tag::Paragraph => {
                        if self.current.is_empty() {
                            self.start_block();
                        }
                    }
                    Tag::Heading { level, .. } => {
                        self.start_block();
                        let style = self.heading_style(level);
                        self.push_style(style);
                    }
                    Tag::BlockQuote(_) => {
                        self.start_block();
                        self.quote_depth += 1;
                    }
                    Tag::CodeBlock(kind) => {
                        self.start_block();
                        self.in_code_block = true;
                        if let CodeBlockKind::Fenced(lang) = kind {
                            if !lang.is_empty() {
                                self.push_span(Span::styled(
                                    format!("  {lang}"),
                                    self.theme.subtitle_style,
                                ));
                                self.flush();
                            }
                        }
                    }
                    Tag::List(start) => {
                        if self.list_stack.is_empty() {
                            self.start_block();
                        } else {
                            self.flush();
                        }
                        self.list_stack.push(start);
                    }
                    Tag::Item => self.start_item(),
                    Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
                    Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
                    Tag::Strikethrough => {
                        self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT))
                    }
                    Tag::Link { .. } => self.push_style(self.theme.md_link_style),
                    _ => {}
                },
                Event::End(tag_end) => match tag_end {
                    TagEnd::Paragraph => self.flush(),
                    TagEnd::Heading(_) => {
                        self.flush();
                        self.pop_style();
                    }
                    TagEnd::BlockQuote(_) => {
                        self.flush();
                        self.quote_depth = self.quote_depth.saturating_sub(1);
                    }
                    TagEnd::CodeBlock => {
                        self.flush();
                        self.in_code_block = false;
                    }
                    TagEnd::List(_) => {
                        self.flush();
                        self.list_stack.pop();
                    }
                    TagEnd::Item => self.flush(),
                    TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link => {
                        self.pop_style()
                    }
                    _ => {}
                },
                Event::Text(text) => {
                    if self.in_code_block {
                        self.code_block_text(text.trim_end_matches('\n'));
                    } else {
                        self.push_text(&text);
                    }
                }
                Event::Code(code) => {
                    let style = self.style().patch(self.theme.md_code_style);
                    self.push_span(Span::styled(code.to_string(), style));
                }
                Event::SoftBreak => self.push_text(" "),
                Event::HardBreak => self.flush(),
                Event::Rule => {
                    self.start_block();
                    self.push_span(Span::styled("─".repeat(RULE_WIDTH), self.theme.border_style));
                    self.flush();
                }
                Event::TaskListMarker(checked) => {
                    self.push_text(if checked { "[x] " } else { "[ ] " });
                }
                Event::Html(html) | Event::InlineHtml(html) => self.push_text(&html),
                _ => {}
            }
        }

        self.flush();
        while self.lines.last().is_some_and(|line| line.width() == 0) {
            self.lines.pop();
        }
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(content: &str) -> Vec<Line<'static>> {
        let theme = Theme::dark_default();
        render_markdown(content, theme.assistant_text_style, &theme)
    }

    fn texts(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|span| span.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn paragraphs_are_separated_by_a_blank_line() {
        assert_eq!(
            texts(&render("First line\ncontinues.\n\nSecond.")),
            vec!["First line continues.", "", "Second."]
        );
    }

    #[test]
    fn lists_get_markers_and_numbers() {
        assert_eq!(
            texts(&render("- one\n- two\n\n3. three\n4. four")),
            vec!["• one", "• two", "", "3. three", "4. four"]
        );
    }

    #[test]
    fn nested_list_items_are_indented() {
        assert_eq!(
            texts(&render("- outer\n  - inner")),
            vec!["• outer", "  • inner"]
        );
    }

    #[test]
    fn code_blocks_are_indented_and_styled() {
        let theme = Theme::dark_default();
        let lines = render("```rust\nfn main() {}\n```");
        assert_eq!(texts(&lines), vec!["  rust", "  fn main() {}"]);
        assert_eq!(lines[1].spans[0].style, theme.md_code_style);
    }

    #[test]
    fn emphasis_and_inline_code_are_styled() {
        let lines = render("Say **hi** to `x`");
        let bold = lines[0]
            .spans
            .iter()
            .find(|span| span.content == "hi")
            .expect("bold span");
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
        let code = lines[0]
            .spans
            .iter()
            .find(|span| span.content == "x")
            .expect("code span");
        assert_eq!(code.style.fg, Theme::dark_default().md_code_style.fg);
    }

    #[test]
    fn headings_use_heading_style() {
        let lines = render("## Title\n\nBody");
        assert_eq!(texts(&lines), vec!["Title", "", "Body"]);
        assert!(lines[0].spans[0]
            .style
            .add_modifier
            .contains(Modifier::BOLD));
    }

    #[test]
    fn block_quotes_are_prefixed() {
        assert_eq!(texts(&render("> quoted")), vec!["│ quoted"]);
    }

    #[test]
    fn empty_content_renders_nothing() {
        assert!(render("").is_empty());
    }
}
