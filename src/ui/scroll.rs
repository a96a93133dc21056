//! Display-line construction and scroll math for the transcript pane.

use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use crate::core::conversation::PLACEHOLDER_TEXT;
use crate::core::message::Message;
use crate::ui::markdown::{render_markdown, render_plain};
use crate::ui::theme::Theme;

/// Handles all scroll-related calculations and line building.
pub struct ScrollCalculator;

impl ScrollCalculator {
    /// Build the full transcript as styled lines, one blank line between
    /// messages. `pulse_dim` alternates the placeholder between its two
    /// styles so a pending reply visibly pulses.
    pub fn build_display_lines(
        messages: &[Message],
        theme: &Theme,
        pulse_dim: bool,
    ) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for message in messages {
            Self::add_message_lines(&mut lines, message, theme, pulse_dim);
        }
        lines
    }

    fn add_message_lines(
        lines: &mut Vec<Line<'static>>,
        message: &Message,
        theme: &Theme,
        pulse_dim: bool,
    ) {
        if message.role.is_user() {
            let mut content_lines = message.content.split('\n');
            let first = content_lines.next().unwrap_or("");
            lines.push(Line::from(vec![
                Span::styled("You: ", theme.user_prefix_style),
                Span::styled(first.to_string(), theme.user_text_style),
            ]));
            for rest in content_lines {
                lines.extend(render_plain(rest, theme.user_text_style));
            }
            lines.push(Line::default());
        } else if message.role.is_system() {
            // System messages carry markdown too (the help text does).
            lines.extend(render_markdown(
                &message.content,
                theme.system_text_style,
                theme,
            ));
            lines.push(Line::default());
        } else if message.content == PLACEHOLDER_TEXT {
            let style = if pulse_dim {
                theme.placeholder_pulse_style
            } else {
                theme.placeholder_style
            };
            lines.push(Line::from(Span::styled(PLACEHOLDER_TEXT.to_string(), style)));
            lines.push(Line::default());
        } else if !message.content.is_empty() {
            lines.extend(render_markdown(
                &message.content,
                theme.assistant_text_style,
                theme,
            ));
            lines.push(Line::default());
        }
    }

    /// Count how many rows the lines occupy once wrapped to the terminal
    /// width. Mirrors ratatui's `Wrap { trim: true }` so the offset math
    /// matches what actually gets drawn.
    pub fn wrapped_line_count(lines: &[Line], terminal_width: u16) -> u16 {
        let mut total = 0u16;
        for line in lines {
            let text = line.to_string();
            let trimmed = text.trim();
            if trimmed.is_empty() || terminal_width == 0 {
                total = total.saturating_add(1);
            } else {
                total = total.saturating_add(Self::word_wrapped_rows(trimmed, terminal_width));
            }
        }
        total
    }

    fn word_wrapped_rows(text: &str, terminal_width: u16) -> u16 {
        let width = terminal_width as usize;
        let mut current = 0usize;
        let mut rows = 1u16;

        for word in text.split_whitespace() {
            let word_width = word.width();
            if current > 0 && current + 1 + word_width > width {
                rows = rows.saturating_add(1);
                current = word_width;
            } else {
                if current > 0 {
                    current += 1;
                }
                current += word_width;
            }
        }
        rows
    }

    /// The scroll offset that pins the view to the bottom of the transcript.
    pub fn max_scroll_offset(lines: &[Line], terminal_width: u16, available_height: u16) -> u16 {
        let total = Self::wrapped_line_count(lines, terminal_width);
        total.saturating_sub(available_height)
    }
}
