//! Markdown rendering for assistant replies.
//!
//! A single pass over the pulldown-cmark event stream, producing styled
//! [`Line`]s: headings and inline code pick up theme accents, fenced code
//! keeps its line structure, lists get their markers. Tables are left
//! unparsed on purpose; they come through as literal text.

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::ui::theme::Theme;

pub fn render_markdown(content: &str, base_style: Style, theme: &Theme) -> Vec<Line<'static>> {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let mut renderer = MarkdownLines {
        lines: Vec::new(),
        current: Vec::new(),
        style_stack: Vec::new(),
        base_style,
        heading_style: theme.heading_style,
        code_style: theme.code_style,
        in_code_block: false,
        needs_blank: false,
        list_stack: Vec::new(),
        link_dest: None,
    };

    for event in Parser::new_ext(content, options) {
        renderer.handle(event);
    }
    renderer.finish()
}

/// One line per newline, all in `style`. Used for user and system messages
/// and as the no-markdown fallback.
pub fn render_plain(content: &str, style: Style) -> Vec<Line<'static>> {
    content
        .split('\n')
        .map(|line| Line::from(Span::styled(line.to_string(), style)))
        .collect()
}

struct MarkdownLines {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    style_stack: Vec<Style>,
    base_style: Style,
    heading_style: Style,
    code_style: Style,
    in_code_block: bool,
    needs_blank: bool,
    list_stack: Vec<Option<u64>>,
    link_dest: Option<String>,
}

impl MarkdownLines {
    fn current_style(&self) -> Style {
        *self.style_stack.last().unwrap_or(&self.base_style)
    }

    fn push_style(&mut self, style: Style) {
        self.style_stack.push(style);
    }

    fn pop_style(&mut self) {
        self.style_stack.pop();
    }

    fn flush_line(&mut self) {
        let spans = std::mem::take(&mut self.current);
        self.lines.push(Line::from(spans));
    }

    fn flush_if_pending(&mut self) {
        if !self.current.is_empty() {
            self.flush_line();
        }
    }

    /// Separate blocks with one empty line, lazily.
    fn start_block(&mut self) {
        if self.needs_blank {
            self.lines.push(Line::default());
            self.needs_blank = false;
        }
    }

    fn end_block(&mut self) {
        self.flush_if_pending();
        self.needs_blank = true;
    }

    fn push_text(&mut self, text: &str) {
        if self.in_code_block {
            for (i, piece) in text.split('\n').enumerate() {
                if i > 0 {
                    self.flush_line();
                }
                if !piece.is_empty() {
                    self.current
                        .push(Span::styled(piece.to_string(), self.code_style));
                }
            }
        } else if !text.is_empty() {
            self.current
                .push(Span::styled(text.to_string(), self.current_style()));
        }
    }

    fn push_list_marker(&mut self) {
        let indent = "  ".repeat(self.list_stack.len().saturating_sub(1));
        let marker = match self.list_stack.last_mut() {
            Some(Some(next)) => {
                let marker = format!("{indent}{next}. ");
                *next += 1;
                marker
            }
            _ => format!("{indent}- "),
        };
        self.current.push(Span::styled(marker, self.current_style()));
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.handle_start(tag),
            Event::End(tag) => self.handle_end(tag),
            Event::Text(text) => self.push_text(&text),
            Event::Code(code) => {
                self.current
                    .push(Span::styled(code.to_string(), self.code_style));
            }
            Event::SoftBreak => self.push_text(" "),
            Event::HardBreak => self.flush_line(),
            Event::Rule => {
                self.start_block();
                self.current
                    .push(Span::styled("---".to_string(), self.current_style()));
                self.end_block();
            }
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.current
                    .push(Span::styled(marker.to_string(), self.current_style()));
            }
            Event::Html(html) | Event::InlineHtml(html) => self.push_text(&html),
            _ => {}
        }
    }

    fn handle_start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                if self.current.is_empty() {
                    self.start_block();
                }
            }
            Tag::Heading { .. } => {
                self.start_block();
                self.push_style(self.heading_style);
            }
            Tag::CodeBlock(_) => {
                self.start_block();
                self.in_code_block = true;
            }
            Tag::List(start) => {
                if self.list_stack.is_empty() {
                    self.start_block();
                } else {
                    // Nested list begins on its own line under the parent item.
                    self.flush_if_pending();
                }
                self.list_stack.push(start);
            }
            Tag::Item => self.push_list_marker(),
            Tag::Strong => self.push_style(self.current_style().add_modifier(Modifier::BOLD)),
            Tag::Emphasis => self.push_style(self.current_style().add_modifier(Modifier::ITALIC)),
            Tag::Strikethrough => {
                self.push_style(self.current_style().add_modifier(Modifier::CROSSED_OUT));
            }
            Tag::BlockQuote(_) => {
                self.start_block();
                self.push_style(self.current_style().add_modifier(Modifier::ITALIC));
            }
            Tag::Link { dest_url, .. } => {
                self.link_dest = Some(dest_url.to_string());
                self.push_style(self.current_style().add_modifier(Modifier::UNDERLINED));
            }
            _ => {}
        }
    }

    fn handle_end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.end_block(),
            TagEnd::Heading(_) => {
                self.pop_style();
                self.end_block();
            }
            TagEnd::CodeBlock => {
                self.flush_if_pending();
                self.in_code_block = false;
                self.needs_blank = true;
            }
            TagEnd::List(_) => {
                self.list_stack.pop();
                if self.list_stack.is_empty() {
                    self.needs_blank = true;
                }
            }
            TagEnd::Item => self.flush_if_pending(),
            TagEnd::Strong | TagEnd::Emphasis | TagEnd::Strikethrough => self.pop_style(),
            TagEnd::BlockQuote(_) => {
                self.pop_style();
                self.end_block();
            }
            TagEnd::Link => {
                self.pop_style();
                if let Some(dest) = self.link_dest.take() {
                    self.current.push(Span::styled(
                        format!(" ({dest})"),
                        self.current_style().add_modifier(Modifier::DIM),
                    ));
                }
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush_if_pending();
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn paragraphs_are_separated_by_one_blank_line() {
        let theme = Theme::dark_default();
        let lines = render_markdown("first\n\nsecond", Style::default(), &theme);
        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert_eq!(texts, vec!["first", "", "second"]);
    }

    #[test]
    fn soft_breaks_join_with_spaces() {
        let theme = Theme::dark_default();
        let lines = render_markdown("one\ntwo", Style::default(), &theme);
        assert_eq!(lines.len(), 1);
        assert_eq!(line_text(&lines[0]), "one two");
    }

    #[test]
    fn strong_text_is_bold() {
        let theme = Theme::dark_default();
        let lines = render_markdown("plain **loud** plain", Style::default(), &theme);
        let bold = lines[0]
            .spans
            .iter()
            .find(|s| s.content.as_ref() == "loud")
            .expect("bold span");
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn inline_code_uses_the_code_style() {
        let theme = Theme::dark_default();
        let lines = render_markdown("run `cargo doc` now", Style::default(), &theme);
        let code = lines[0]
            .spans
            .iter()
            .find(|s| s.content.as_ref() == "cargo doc")
            .expect("code span");
        assert_eq!(code.style, theme.code_style);
    }

    #[test]
    fn fenced_code_keeps_its_lines() {
        let theme = Theme::dark_default();
        let lines = render_markdown(
            "before\n\n```\nlet x = 1;\nlet y = 2;\n```",
            Style::default(),
            &theme,
        );
        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert_eq!(texts, vec!["before", "", "let x = 1;", "let y = 2;"]);
        let code_line = &lines[2];
        assert_eq!(code_line.spans[0].style, theme.code_style);
    }

    #[test]
    fn bullet_and_ordered_lists_get_markers() {
        let theme = Theme::dark_default();
        let bullets = render_markdown("- alpha\n- beta", Style::default(), &theme);
        let texts: Vec<String> = bullets.iter().map(line_text).collect();
        assert_eq!(texts, vec!["- alpha", "- beta"]);

        let ordered = render_markdown("1. one\n2. two", Style::default(), &theme);
        let texts: Vec<String> = ordered.iter().map(line_text).collect();
        assert_eq!(texts, vec!["1. one", "2. two"]);
    }

    #[test]
    fn headings_use_the_heading_style() {
        let theme = Theme::dark_default();
        let lines = render_markdown("# Title\n\nbody", Style::default(), &theme);
        assert_eq!(line_text(&lines[0]), "Title");
        assert_eq!(lines[0].spans[0].style, theme.heading_style);
    }

    #[test]
    fn links_keep_their_destination() {
        let theme = Theme::dark_default();
        let lines = render_markdown("[docs](https://example.com)", Style::default(), &theme);
        let text = line_text(&lines[0]);
        assert_eq!(text, "docs (https://example.com)");
    }

    #[test]
    fn plain_rendering_preserves_every_line() {
        let lines = render_plain("a\n\nb", Style::default());
        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert_eq!(texts, vec!["a", "", "b"]);
    }
}
