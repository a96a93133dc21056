//! Main chat event loop.
//!
//! Owns the terminal for the duration of the session: draws frames, reads
//! key events, and drains finished turns off the service channel back into
//! the app. All network work happens on spawned tasks; the loop only ever
//! touches the app directly, so no locking is involved.

use crate::auth::CredentialStore;
use crate::commands::{process_input, CommandResult};
use crate::core::app::{App, AppMode};
use crate::core::config::Config;
use crate::core::conversation::ConversationStore;
use crate::core::session::prepare_session;
use crate::core::turn::{TurnService, TurnUpdate};
use crate::ui::renderer::ui;
use ratatui::crossterm::{
    event::{
        self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent,
        KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{error::Error, io, time::Duration};
use tokio::sync::mpsc;

pub async fn run_chat(
    model: String,
    provider: Option<String>,
    env_only: bool,
) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let bootstrap = prepare_session(model, provider, env_only, &config)?;
    let conversation = ConversationStore::load_default();
    let credentials = CredentialStore::new();
    let (turn_service, mut rx) = TurnService::new();

    let mut app = App::new(
        bootstrap.session,
        bootstrap.theme,
        conversation,
        credentials,
        turn_service,
    );
    if !app.session.has_credential() {
        app.set_status("No API key configured. Use /key to add one.");
    }

    // Setup terminal only after successful app creation
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app, &mut rx);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    rx: &mut mpsc::UnboundedReceiver<(TurnUpdate, u64)>,
) -> Result<(), Box<dyn Error>> {
    loop {
        if app.exit_requested {
            return Ok(());
        }

        app.clear_expired_status();
        terminal.draw(|f| ui(f, app))?;

        // Fold in any turns that finished since the last tick
        while let Ok((update, turn_id)) = rx.try_recv() {
            app.handle_turn_update(update, turn_id);
        }

        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                // Ctrl+C quits from any mode
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    return Ok(());
                }
                let term_size = terminal.size().unwrap_or_default();
                match app.mode {
                    AppMode::Input => {
                        handle_input_key(app, key, term_size.width, term_size.height)
                    }
                    AppMode::ModelPicker => handle_picker_key(app, key),
                    AppMode::KeyEntry => handle_key_entry_key(app, key),
                }
            }
            Event::Paste(text) => handle_paste(app, &text),
            _ => {}
        }
    }
}

/// Rows of transcript visible above the input box.
fn transcript_height(app: &App, term_height: u16) -> u16 {
    let input_height = (app.input.lines().len() as u16).clamp(1, 6);
    term_height
        .saturating_sub(input_height + 2)
        .saturating_sub(1)
}

fn handle_input_key(app: &mut App, key: KeyEvent, term_width: u16, term_height: u16) {
    match key.code {
        KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => {
            app.input.insert_str("\n");
        }
        KeyCode::Enter => {
            let input_text = app.input_text();
            match process_input(app, &input_text) {
                CommandResult::Continue => {
                    app.clear_input();
                }
                CommandResult::OpenModelPicker => {
                    app.clear_input();
                    app.open_model_picker();
                }
                CommandResult::OpenKeyEntry => {
                    app.clear_input();
                    app.open_key_entry();
                }
                CommandResult::ProcessAsMessage(_) => {
                    // Gates and the actual send live in one place
                    app.begin_turn();
                }
            }
        }
        KeyCode::PageUp => {
            let height = transcript_height(app, term_height);
            app.scroll_up(height.max(1));
        }
        KeyCode::PageDown => {
            let height = transcript_height(app, term_height);
            let max = app.max_scroll_offset(term_width, height);
            app.scroll_down(height.max(1), max);
        }
        _ => {
            app.input.input(key);
        }
    }
}

fn handle_picker_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_modal(),
        KeyCode::Enter => app.apply_model_selection(),
        KeyCode::Up => {
            if let Some(picker) = &mut app.picker {
                picker.move_up();
            }
        }
        KeyCode::Down => {
            if let Some(picker) = &mut app.picker {
                picker.move_down();
            }
        }
        KeyCode::Tab => {
            if let Some(picker) = &mut app.picker {
                picker.cycle_category();
            }
        }
        KeyCode::Backspace => {
            if let Some(picker) = &mut app.picker {
                picker.pop_search_char();
            }
        }
        KeyCode::Char(c) if !c.is_control() => {
            if let Some(picker) = &mut app.picker {
                picker.push_search_char(c);
            }
        }
        _ => {}
    }
}

fn handle_key_entry_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_modal(),
        KeyCode::Enter => app.submit_key_entry(),
        KeyCode::Tab => {
            if let Some(entry) = &mut app.key_entry {
                entry.toggle_mask();
            }
        }
        KeyCode::Backspace => {
            if let Some(entry) = &mut app.key_entry {
                entry.backspace();
            }
        }
        KeyCode::Char(c) if !c.is_control() => {
            if let Some(entry) = &mut app.key_entry {
                entry.push_char(c);
            }
        }
        _ => {}
    }
}

fn handle_paste(app: &mut App, text: &str) {
    let text = text.replace('\r', "\n");
    match app.mode {
        AppMode::Input => {
            app.input.insert_str(&text);
        }
        AppMode::KeyEntry => {
            if let Some(entry) = &mut app.key_entry {
                for c in text.chars().filter(|c| !c.is_control()) {
                    entry.push_char(c);
                }
            }
        }
        AppMode::ModelPicker => {
            if let Some(picker) = &mut app.picker {
                for c in text.chars().filter(|c| !c.is_control()) {
                    picker.push_search_char(c);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::create_test_app;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn typing_lands_in_the_input_box() {
        let (_dir, mut app) = create_test_app();
        handle_input_key(&mut app, key(KeyCode::Char('h')), 80, 24);
        handle_input_key(&mut app, key(KeyCode::Char('i')), 80, 24);
        assert_eq!(app.input_text(), "hi");
    }

    #[test]
    fn alt_enter_inserts_a_newline_instead_of_sending() {
        let (_dir, mut app) = create_test_app();
        app.input.insert_str("line one");
        handle_input_key(
            &mut app,
            KeyEvent::new(KeyCode::Enter, KeyModifiers::ALT),
            80,
            24,
        );
        app.input.insert_str("line two");
        assert_eq!(app.input_text(), "line one\nline two");
        assert_eq!(app.conversation.messages().len(), 1);
    }

    #[test]
    fn slash_commands_do_not_reach_the_conversation() {
        let (_dir, mut app) = create_test_app();
        app.input.insert_str("/model");
        handle_input_key(&mut app, key(KeyCode::Enter), 80, 24);
        assert_eq!(app.mode, AppMode::ModelPicker);
        assert!(app.input_text().is_empty());
        assert_eq!(app.conversation.messages().len(), 1);
    }

    #[test]
    fn picker_keys_drive_the_picker() {
        let (_dir, mut app) = create_test_app();
        app.open_model_picker();

        handle_picker_key(&mut app, key(KeyCode::Down));
        let after_down = app.picker.as_ref().unwrap().selected;
        assert_eq!(after_down, 1);

        handle_picker_key(&mut app, key(KeyCode::Enter));
        assert_eq!(app.mode, AppMode::Input);
        assert!(app.picker.is_none());
    }

    #[test]
    fn picker_escape_leaves_the_model_unchanged() {
        let (_dir, mut app) = create_test_app();
        let before = app.session.model.clone();
        app.open_model_picker();
        handle_picker_key(&mut app, key(KeyCode::Down));
        handle_picker_key(&mut app, key(KeyCode::Esc));
        assert_eq!(app.session.model, before);
        assert_eq!(app.mode, AppMode::Input);
    }

    #[test]
    fn key_entry_collects_and_masks_typed_characters() {
        let (_dir, mut app) = create_test_app();
        app.open_key_entry();
        for c in "sk-abc".chars() {
            handle_key_entry_key(&mut app, key(KeyCode::Char(c)));
        }
        let entry = app.key_entry.as_ref().unwrap();
        assert_eq!(entry.buffer, "sk-abc");
        assert_eq!(entry.displayed(), "\u{2022}".repeat(6));

        handle_key_entry_key(&mut app, key(KeyCode::Tab));
        assert_eq!(app.key_entry.as_ref().unwrap().displayed(), "sk-abc");
    }

    #[test]
    fn pasting_into_key_entry_strips_control_characters() {
        let (_dir, mut app) = create_test_app();
        app.open_key_entry();
        handle_paste(&mut app, "sk-pasted\n");
        assert_eq!(app.key_entry.as_ref().unwrap().buffer, "sk-pasted");
    }

    #[test]
    fn page_keys_move_the_viewport() {
        let (_dir, mut app) = create_test_app();
        for i in 0..40 {
            app.conversation.append_user(&format!("message {i}"));
        }
        app.scroll_offset = 30;
        app.auto_scroll = false;

        handle_input_key(&mut app, key(KeyCode::PageUp), 80, 24);
        assert!(app.scroll_offset < 30);
        assert!(!app.auto_scroll);
    }
}
