use crate::core::app::{App, AppMode};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

pub fn ui(f: &mut Frame, app: &mut App) {
    let background = Block::default().style(Style::default().bg(app.theme.background_color));
    f.render_widget(background, f.area());

    // Input box grows with its content, within reason
    let input_height = (app.input.lines().len() as u16).clamp(1, 6);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(input_height + 2)])
        .split(f.area());

    draw_transcript(f, app, chunks[0]);
    draw_input(f, app, chunks[1]);

    match app.mode {
        AppMode::ModelPicker => draw_model_picker(f, app),
        AppMode::KeyEntry => draw_key_entry(f, app),
        AppMode::Input => {}
    }
}

fn draw_transcript(f: &mut Frame, app: &mut App, area: Rect) {
    let lines = app.build_display_lines();
    let available_height = area.height.saturating_sub(1); // Account for title
    let max_offset =
        crate::ui::scroll::ScrollCalculator::max_scroll_offset(&lines, area.width, available_height);

    // Pin to the bottom while auto-scroll holds, otherwise keep in bounds
    if app.auto_scroll {
        app.scroll_offset = max_offset;
    } else {
        app.scroll_offset = app.scroll_offset.min(max_offset);
    }

    let title = format!(
        "chinwag v{} - {} ({})",
        env!("CARGO_PKG_VERSION"),
        app.session.provider_display_name,
        app.session.model
    );
    let mut title_spans = vec![Span::styled(title, app.theme.title_style)];
    if let Some(conversation_title) = app.conversation.title() {
        title_spans.push(Span::styled(
            format!(" • {conversation_title}"),
            app.theme.system_text_style,
        ));
    }

    let transcript = Paragraph::new(lines)
        .block(Block::default().title(Line::from(title_spans)))
        .wrap(Wrap { trim: true })
        .scroll((app.scroll_offset, 0));

    f.render_widget(transcript, area);
}

fn draw_input(f: &mut Frame, app: &mut App, area: Rect) {
    let title: Line = match &app.status {
        Some(status) => Line::from(Span::styled(status.clone(), app.theme.status_style)),
        None => Line::from(Span::styled(
            "Type your message (Alt+Enter for new line, /help for help, Ctrl+C to quit)",
            app.theme.input_title_style,
        )),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.input_border_style)
        .title(title);
    let inner = block.inner(area);

    f.render_widget(block, area);
    f.render_widget(&app.input, inner);
}

fn draw_model_picker(f: &mut Frame, app: &App) {
    let Some(picker) = &app.picker else {
        return;
    };

    let area = centered_rect(70, 70, f.area());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.picker_border_style)
        .title(Span::styled(picker.title(), app.theme.title_style))
        .style(Style::default().bg(app.theme.background_color));
    let inner = block.inner(area);

    f.render_widget(Clear, area);
    f.render_widget(block, area);

    let mut lines: Vec<Line> = Vec::with_capacity(picker.items.len() + 1);
    for (i, item) in picker.items.iter().enumerate() {
        if i == picker.selected {
            lines.push(Line::from(Span::styled(
                format!("> {}", item.label),
                app.theme.picker_highlight_style,
            )));
        } else {
            lines.push(Line::from(Span::styled(
                format!("  {}", item.label),
                app.theme.assistant_text_style,
            )));
        }
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "  No models match",
            app.theme.system_text_style,
        )));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "  Type to search, Tab for category, Enter to pick, Esc to close",
        app.theme.system_text_style,
    )));

    // Keep the selection on screen
    let visible = inner.height.saturating_sub(2);
    let scroll = (picker.selected as u16).saturating_sub(visible.saturating_sub(1));

    let list = Paragraph::new(lines).scroll((scroll, 0));
    f.render_widget(list, inner);
}

fn draw_key_entry(f: &mut Frame, app: &App) {
    let Some(entry) = &app.key_entry else {
        return;
    };

    let area = centered_rect(60, 20, f.area());
    let area = Rect {
        height: area.height.min(5),
        ..area
    };
    let title = format!(
        "API key for {} (Enter to save, Tab to show/hide, Esc to cancel)",
        app.session.provider_display_name
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.picker_border_style)
        .title(Span::styled(title, app.theme.title_style))
        .style(Style::default().bg(app.theme.background_color));
    let inner = block.inner(area);

    f.render_widget(Clear, area);
    f.render_widget(block, area);

    let field = Paragraph::new(entry.displayed()).style(app.theme.input_text_style);
    f.render_widget(field, inner);

    let cursor_x = inner.x + entry.displayed().chars().count().min(inner.width as usize) as u16;
    f.set_cursor_position((cursor_x, inner.y));
}

/// Center a `percent_x` by `percent_y` box inside `area`.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect_stays_inside_the_area() {
        let area = Rect::new(0, 0, 100, 40);
        let rect = centered_rect(70, 70, area);

        assert!(rect.x >= area.x);
        assert!(rect.y >= area.y);
        assert!(rect.right() <= area.right());
        assert!(rect.bottom() <= area.bottom());
        assert_eq!(rect.width, 70);
    }

    #[test]
    fn centered_rect_handles_tiny_areas() {
        let area = Rect::new(0, 0, 2, 2);
        let rect = centered_rect(60, 20, area);
        assert!(rect.width <= area.width);
        assert!(rect.height <= area.height);
    }
}
