use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone)]
pub struct Theme {
    // Overall background color to paint the full frame
    pub background_color: Color,
    // Chat message styles
    pub user_prefix_style: Style,
    pub user_text_style: Style,
    pub assistant_text_style: Style,
    pub system_text_style: Style,
    pub placeholder_style: Style,
    pub placeholder_pulse_style: Style,

    // Markdown accents
    pub heading_style: Style,
    pub code_style: Style,

    // Chrome
    pub title_style: Style,
    pub status_style: Style,
    pub input_border_style: Style,
    pub input_title_style: Style,
    pub picker_border_style: Style,
    pub picker_highlight_style: Style,

    // Input area
    pub input_text_style: Style,
    pub input_cursor_style: Style,
}

impl Theme {
    pub fn dark_default() -> Self {
        Theme {
            background_color: Color::Black,
            user_prefix_style: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(Color::Cyan),
            assistant_text_style: Style::default().fg(Color::White),
            system_text_style: Style::default().fg(Color::DarkGray),
            placeholder_style: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
            placeholder_pulse_style: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),

            heading_style: Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
            code_style: Style::default().fg(Color::LightYellow),

            title_style: Style::default().fg(Color::Gray),
            status_style: Style::default().fg(Color::Yellow),
            input_border_style: Style::default().fg(Color::Gray),
            input_title_style: Style::default().fg(Color::Gray),
            picker_border_style: Style::default().fg(Color::Gray),
            picker_highlight_style: Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),

            input_text_style: Style::default().fg(Color::White),
            input_cursor_style: Style::default().add_modifier(Modifier::REVERSED),
        }
    }

    pub fn light() -> Self {
        Theme {
            background_color: Color::White,
            user_prefix_style: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(Color::Blue),
            assistant_text_style: Style::default().fg(Color::Black),
            system_text_style: Style::default().fg(Color::Gray),
            placeholder_style: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
            placeholder_pulse_style: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),

            heading_style: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            code_style: Style::default().fg(Color::Red),

            title_style: Style::default().fg(Color::DarkGray),
            status_style: Style::default().fg(Color::Magenta),
            input_border_style: Style::default().fg(Color::Black),
            input_title_style: Style::default().fg(Color::DarkGray),
            picker_border_style: Style::default().fg(Color::Black),
            picker_highlight_style: Style::default()
                .fg(Color::White)
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD),

            input_text_style: Style::default().fg(Color::Black),
            input_cursor_style: Style::default().add_modifier(Modifier::REVERSED),
        }
    }

    pub fn dracula() -> Self {
        Theme {
            background_color: Color::Black,
            user_prefix_style: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(Color::Magenta),
            assistant_text_style: Style::default().fg(Color::Gray),
            system_text_style: Style::default().fg(Color::DarkGray),
            placeholder_style: Style::default()
                .fg(Color::LightMagenta)
                .add_modifier(Modifier::ITALIC),
            placeholder_pulse_style: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::ITALIC),

            heading_style: Style::default()
                .fg(Color::LightMagenta)
                .add_modifier(Modifier::BOLD),
            code_style: Style::default().fg(Color::LightGreen),

            title_style: Style::default().fg(Color::LightMagenta),
            status_style: Style::default().fg(Color::LightYellow),
            input_border_style: Style::default().fg(Color::LightMagenta),
            input_title_style: Style::default().fg(Color::LightMagenta),
            picker_border_style: Style::default().fg(Color::LightMagenta),
            picker_highlight_style: Style::default()
                .fg(Color::Black)
                .bg(Color::Magenta)
                .add_modifier(Modifier::BOLD),

            input_text_style: Style::default().fg(Color::White),
            input_cursor_style: Style::default().add_modifier(Modifier::REVERSED),
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "dark" | "default" | "default-dark" => Self::dark_default(),
            "light" => Self::light(),
            "dracula" => Self::dracula(),
            // Fallback
            _ => Self::dark_default(),
        }
    }
}
