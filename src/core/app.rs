//! Application state: one conversation, one session, at most one turn in
//! flight.

use std::time::{Duration, Instant};

use ratatui::text::Line;
use tui_textarea::TextArea;

use crate::auth::CredentialStore;
use crate::core::conversation::ConversationStore;
use crate::core::session::SessionContext;
use crate::core::turn::{error_reply_content, TurnError, TurnParams, TurnService, TurnUpdate};
use crate::ui::picker::PickerState;
use crate::ui::scroll::ScrollCalculator;
use crate::ui::theme::Theme;

/// How long a status notice stays on screen.
pub const STATUS_TTL: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppMode {
    Input,
    ModelPicker,
    KeyEntry,
}

/// The turn currently awaiting its reply: the id updates must carry, and
/// the reserved message slot the answer lands in.
#[derive(Clone, Debug)]
pub struct InFlightTurn {
    pub turn_id: u64,
    pub reserved_id: String,
}

/// State of the masked key-entry dialog.
pub struct KeyEntryState {
    pub buffer: String,
    pub masked: bool,
}

impl KeyEntryState {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            masked: true,
        }
    }

    pub fn push_char(&mut self, c: char) {
        self.buffer.push(c);
    }

    pub fn backspace(&mut self) {
        self.buffer.pop();
    }

    pub fn toggle_mask(&mut self) {
        self.masked = !self.masked;
    }

    /// What the dialog renders: bullets while masked, the raw key otherwise.
    pub fn displayed(&self) -> String {
        if self.masked {
            "\u{2022}".repeat(self.buffer.chars().count())
        } else {
            self.buffer.clone()
        }
    }
}

impl Default for KeyEntryState {
    fn default() -> Self {
        Self::new()
    }
}

pub struct App {
    pub session: SessionContext,
    pub conversation: ConversationStore,
    pub credentials: CredentialStore,
    pub turn_service: TurnService,
    pub theme: Theme,
    pub mode: AppMode,
    pub input: TextArea<'static>,
    pub picker: Option<PickerState>,
    pub key_entry: Option<KeyEntryState>,
    pub status: Option<String>,
    pub status_set_at: Option<Instant>,
    pub scroll_offset: u16,
    pub auto_scroll: bool,
    pub pulse_start: Instant,
    pub in_flight_turn: Option<InFlightTurn>,
    pub exit_requested: bool,
}

impl App {
    pub fn new(
        session: SessionContext,
        theme: Theme,
        conversation: ConversationStore,
        credentials: CredentialStore,
        turn_service: TurnService,
    ) -> Self {
        let mut app = Self {
            session,
            conversation,
            credentials,
            turn_service,
            theme,
            mode: AppMode::Input,
            input: TextArea::default(),
            picker: None,
            key_entry: None,
            status: None,
            status_set_at: None,
            scroll_offset: 0,
            auto_scroll: true,
            pulse_start: Instant::now(),
            in_flight_turn: None,
            exit_requested: false,
        };
        app.configure_input();
        app
    }

    pub fn is_turn_in_flight(&self) -> bool {
        self.in_flight_turn.is_some()
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
        self.status_set_at = Some(Instant::now());
    }

    pub fn clear_expired_status(&mut self) {
        if let Some(set_at) = self.status_set_at {
            if set_at.elapsed() >= STATUS_TTL {
                self.status = None;
                self.status_set_at = None;
            }
        }
    }

    pub fn input_text(&self) -> String {
        self.input.lines().join("\n")
    }

    pub fn clear_input(&mut self) {
        self.input = TextArea::default();
        self.configure_input();
    }

    fn configure_input(&mut self) {
        self.input.set_placeholder_text("Type your message here...");
        self.input.set_style(self.theme.input_text_style);
        self.input.set_cursor_style(self.theme.input_cursor_style);
        self.input
            .set_cursor_line_style(ratatui::style::Style::default());
    }

    /// True when pressing Enter would actually send something.
    pub fn can_submit(&self) -> bool {
        !self.input_text().trim().is_empty() && !self.is_turn_in_flight()
    }

    /// Submit the current input as one turn.
    ///
    /// Gates, in order: blank input, a turn already in flight, then a
    /// missing credential. Each rejection leaves the conversation untouched;
    /// the credential gate in particular fires before anything is appended,
    /// so a rejected turn never shows a question with no answer. Only after
    /// all three pass is the user message committed, the reply slot
    /// reserved, and the request spawned.
    pub fn begin_turn(&mut self) {
        let text = self.input_text();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            self.set_status("Type a message first");
            return;
        }
        if self.is_turn_in_flight() {
            self.set_status("Still waiting on the previous reply");
            return;
        }
        if !self.session.has_credential() {
            self.set_status(TurnError::CredentialMissing.to_string());
            return;
        }

        let trimmed = trimmed.to_string();
        self.clear_input();
        self.conversation.append_user(&trimmed);
        let reserved_id = self.conversation.reserve_reply();
        let turn_id = self.session.next_turn_id();
        self.in_flight_turn = Some(InFlightTurn {
            turn_id,
            reserved_id,
        });
        self.pulse_start = Instant::now();
        self.auto_scroll = true;

        self.turn_service.spawn_turn(TurnParams {
            client: self.session.client.clone(),
            base_url: self.session.base_url.clone(),
            api_key: self.session.api_key.clone(),
            model: self.session.model.clone(),
            api_messages: self.conversation.wire_history(),
            turn_id,
        });
    }

    /// Fold one turn update into the conversation. Updates tagged with
    /// anything but the current turn id are stale and ignored. Either way
    /// the outcome resolves the reserved slot and releases the in-flight
    /// lock, so no placeholder outlives its turn.
    pub fn handle_turn_update(&mut self, update: TurnUpdate, turn_id: u64) {
        let Some(in_flight) = self.in_flight_turn.clone() else {
            return;
        };
        if in_flight.turn_id != turn_id {
            return;
        }

        match update {
            TurnUpdate::Resolved(answer) => {
                self.conversation.resolve_reply(&in_flight.reserved_id, &answer);
            }
            TurnUpdate::Failed(err) => {
                self.conversation
                    .resolve_reply(&in_flight.reserved_id, &error_reply_content(&err));
                self.set_status(err.to_string());
            }
        }
        self.in_flight_turn = None;
    }

    /// Reset the conversation to its single greeting. Refused while a turn
    /// is in flight so the pending slot cannot be orphaned.
    pub fn clear_conversation(&mut self) {
        if self.is_turn_in_flight() {
            self.set_status("Still waiting on the previous reply");
            return;
        }
        self.conversation.clear();
        self.scroll_offset = 0;
        self.auto_scroll = true;
        self.set_status("Conversation cleared");
    }

    pub fn open_model_picker(&mut self) {
        self.picker = Some(PickerState::for_models(&self.session.model));
        self.mode = AppMode::ModelPicker;
    }

    pub fn apply_model_selection(&mut self) {
        if let Some(picker) = self.picker.take() {
            if let Some(id) = picker.selected_id() {
                self.session.model = id.to_string();
                self.set_status(format!("Model set to {id}"));
            }
        }
        self.mode = AppMode::Input;
    }

    pub fn open_key_entry(&mut self) {
        self.key_entry = Some(KeyEntryState::new());
        self.mode = AppMode::KeyEntry;
    }

    /// Store the entered key for the session's provider and start using it
    /// immediately.
    pub fn submit_key_entry(&mut self) {
        let Some(entry) = self.key_entry.take() else {
            return;
        };
        self.mode = AppMode::Input;

        let token = entry.buffer.trim().to_string();
        if token.is_empty() {
            self.set_status("No key entered");
            return;
        }

        match self
            .credentials
            .store_token(&self.session.provider_name, &token)
        {
            Ok(()) => {
                self.session.api_key = token;
                self.set_status(format!(
                    "Key stored for {}",
                    self.session.provider_display_name
                ));
            }
            Err(err) => {
                self.set_status(format!("Failed to store key: {err}"));
            }
        }
    }

    pub fn cancel_modal(&mut self) {
        self.picker = None;
        self.key_entry = None;
        self.mode = AppMode::Input;
    }

    pub fn build_display_lines(&self) -> Vec<Line<'static>> {
        let pulse_dim = self.pulse_start.elapsed().as_millis() / 500 % 2 == 1;
        ScrollCalculator::build_display_lines(self.conversation.messages(), &self.theme, pulse_dim)
    }

    pub fn max_scroll_offset(&self, terminal_width: u16, available_height: u16) -> u16 {
        let lines = self.build_display_lines();
        ScrollCalculator::max_scroll_offset(&lines, terminal_width, available_height)
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.auto_scroll = false;
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16, max_offset: u16) {
        self.scroll_offset = self.scroll_offset.saturating_add(lines).min(max_offset);
        if self.scroll_offset >= max_offset {
            self.auto_scroll = true;
        }
    }
}
