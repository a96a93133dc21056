//! Conversation state and its on-disk persistence.
//!
//! Replies are committed in two phases: [`ConversationStore::reserve_reply`]
//! appends a placeholder the UI can render immediately, and
//! [`ConversationStore::resolve_reply`] later swaps in the real content (or
//! an error notice). Only committed messages ever reach the disk file, so a
//! crash mid-turn never leaves a placeholder behind.

use std::path::{Path, PathBuf};

use crate::api::ChatMessage;
use crate::core::config::{get_data_dir, write_atomically};
use crate::core::message::Message;

/// Shown in the reserved slot while a reply is in flight.
pub const PLACEHOLDER_TEXT: &str = "Thinking...";

/// System message every fresh conversation starts with.
pub const GREETING: &str = "How can I help you today?";

const CONVERSATION_FILE: &str = "conversation.json";
const TITLE_CHAR_LIMIT: usize = 30;

pub struct ConversationStore {
    messages: Vec<Message>,
    pending: Option<String>,
    title: Option<String>,
    path: PathBuf,
}

impl ConversationStore {
    /// Load the conversation from the default data-directory location.
    pub fn load_default() -> Self {
        Self::load_from_path(get_data_dir().join(CONVERSATION_FILE))
    }

    /// Load from `path`, falling back to a fresh single-greeting conversation
    /// when the file is missing or does not parse. A corrupt file is
    /// discarded rather than surfaced; the session starts over.
    pub fn load_from_path(path: PathBuf) -> Self {
        let messages = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Vec<Message>>(&contents) {
                Ok(messages) => messages,
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %err,
                        "discarding unreadable conversation file"
                    );
                    fresh_messages()
                }
            },
            Err(_) => fresh_messages(),
        };

        Self {
            messages,
            pending: None,
            title: None,
            path,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn has_pending_reply(&self) -> bool {
        self.pending.is_some()
    }

    /// Append a user message and persist. The first user message of the
    /// conversation also sets the title, truncated to thirty characters
    /// with a trailing ellipsis when longer.
    pub fn append_user(&mut self, content: &str) -> String {
        if !self.messages.iter().any(|m| m.role.is_user()) {
            self.title = Some(derive_title(content));
        }
        let message = Message::user(content);
        let id = message.id.clone();
        self.messages.push(message);
        self.persist_or_log();
        id
    }

    /// Append a system message (help text, local notices) and persist.
    /// System messages stay local; they are never part of request history.
    pub fn append_system(&mut self, content: &str) -> String {
        let message = Message::system(content);
        let id = message.id.clone();
        self.messages.push(message);
        self.persist_or_log();
        id
    }

    /// Phase one: append an assistant placeholder and mark it pending.
    /// Returns the reserved id. The placeholder is visible to the UI but
    /// excluded from persistence and from outbound request history.
    pub fn reserve_reply(&mut self) -> String {
        let message = Message::assistant(PLACEHOLDER_TEXT);
        let id = message.id.clone();
        self.pending = Some(id.clone());
        self.messages.push(message);
        id
    }

    /// Phase two: replace the reserved message's content and commit it.
    /// Returns false when no message carries `id` (a stale turn), in which
    /// case nothing changes.
    pub fn resolve_reply(&mut self, id: &str, content: &str) -> bool {
        let Some(message) = self.messages.iter_mut().find(|m| m.id == id) else {
            return false;
        };
        message.content = content.to_string();
        if self.pending.as_deref() == Some(id) {
            self.pending = None;
        }
        self.persist_or_log();
        true
    }

    /// Reset to a single system greeting and persist the reset.
    pub fn clear(&mut self) {
        self.messages = fresh_messages();
        self.pending = None;
        self.title = None;
        self.persist_or_log();
    }

    /// Committed user and assistant messages in order, shaped for the wire.
    /// System greetings and the pending placeholder stay local.
    pub fn wire_history(&self) -> Vec<ChatMessage> {
        self.messages
            .iter()
            .filter(|m| !m.role.is_system())
            .filter(|m| self.pending.as_deref() != Some(m.id.as_str()))
            .map(|m| ChatMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect()
    }

    /// Write every committed message to disk as one JSON array.
    pub fn persist(&self) -> Result<(), Box<dyn std::error::Error>> {
        let committed: Vec<&Message> = self
            .messages
            .iter()
            .filter(|m| self.pending.as_deref() != Some(m.id.as_str()))
            .collect();
        let json = serde_json::to_string_pretty(&committed)?;
        write_atomically(&self.path, json.as_bytes())?;
        Ok(())
    }

    fn persist_or_log(&self) {
        if let Err(err) = self.persist() {
            tracing::warn!(
                path = %self.path.display(),
                error = %err,
                "failed to persist conversation"
            );
        }
    }
}

fn fresh_messages() -> Vec<Message> {
    vec![Message::system(GREETING)]
}

fn derive_title(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(TITLE_CHAR_LIMIT).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, ConversationStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ConversationStore::load_from_path(dir.path().join("conversation.json"));
        (dir, store)
    }

    #[test]
    fn missing_file_yields_fresh_conversation() {
        let (_dir, store) = temp_store();
        assert_eq!(store.messages().len(), 1);
        assert!(store.messages()[0].role.is_system());
        assert_eq!(store.messages()[0].content, GREETING);
    }

    #[test]
    fn malformed_file_yields_fresh_conversation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conversation.json");
        std::fs::write(&path, "{not json at all").unwrap();

        let store = ConversationStore::load_from_path(path);
        assert_eq!(store.messages().len(), 1);
        assert_eq!(store.messages()[0].content, GREETING);
    }

    #[test]
    fn unknown_role_in_file_yields_fresh_conversation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conversation.json");
        std::fs::write(
            &path,
            r#"[{"id":"1","role":"narrator","content":"once upon a time"}]"#,
        )
        .unwrap();

        let store = ConversationStore::load_from_path(path);
        assert_eq!(store.messages().len(), 1);
        assert!(store.messages()[0].role.is_system());
    }

    #[test]
    fn append_and_resolve_round_trip_through_disk() {
        let (_dir, mut store) = temp_store();
        store.append_user("What is a monad?");
        let id = store.reserve_reply();
        store.resolve_reply(&id, "A monoid in the category of endofunctors.");

        let reloaded = ConversationStore::load_from_path(store.path().to_path_buf());
        assert_eq!(reloaded.messages().len(), 3);
        for (original, loaded) in store.messages().iter().zip(reloaded.messages()) {
            assert_eq!(original.id, loaded.id);
            assert_eq!(original.role, loaded.role);
            assert_eq!(original.content, loaded.content);
        }
    }

    #[test]
    fn reserve_marks_pending_and_resolve_commits() {
        let (_dir, mut store) = temp_store();
        store.append_user("hi");
        let id = store.reserve_reply();

        assert!(store.has_pending_reply());
        assert_eq!(store.messages().last().unwrap().content, PLACEHOLDER_TEXT);

        assert!(store.resolve_reply(&id, "hello"));
        assert!(!store.has_pending_reply());
        assert!(store.messages().iter().all(|m| m.content != PLACEHOLDER_TEXT));
    }

    #[test]
    fn placeholder_never_reaches_disk() {
        let (_dir, mut store) = temp_store();
        store.append_user("hi");
        store.reserve_reply();

        let on_disk = std::fs::read_to_string(store.path()).unwrap();
        assert!(!on_disk.contains(PLACEHOLDER_TEXT));

        let reloaded = ConversationStore::load_from_path(store.path().to_path_buf());
        assert_eq!(reloaded.messages().len(), 2);
    }

    #[test]
    fn resolving_an_unknown_id_changes_nothing() {
        let (_dir, mut store) = temp_store();
        store.append_user("hi");
        let before: Vec<String> = store.messages().iter().map(|m| m.content.clone()).collect();

        assert!(!store.resolve_reply("1700000000000-99", "stale"));
        let after: Vec<String> = store.messages().iter().map(|m| m.content.clone()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn long_first_message_sets_truncated_title() {
        let (_dir, mut store) = temp_store();
        let long = "a".repeat(45);
        store.append_user(&long);

        let title = store.title().unwrap();
        assert_eq!(title.chars().count(), 33);
        assert_eq!(title, format!("{}...", "a".repeat(30)));
    }

    #[test]
    fn short_first_message_is_title_verbatim() {
        let (_dir, mut store) = temp_store();
        store.append_user("hello card");
        assert_eq!(store.title(), Some("hello card"));
    }

    #[test]
    fn only_the_first_user_message_sets_the_title() {
        let (_dir, mut store) = temp_store();
        store.append_user("first question");
        store.append_user("second question");
        assert_eq!(store.title(), Some("first question"));
    }

    #[test]
    fn clear_resets_to_single_greeting_and_persists() {
        let (_dir, mut store) = temp_store();
        store.append_user("hi");
        let id = store.reserve_reply();
        store.resolve_reply(&id, "hello");
        store.clear();

        assert_eq!(store.messages().len(), 1);
        assert_eq!(store.title(), None);

        let reloaded = ConversationStore::load_from_path(store.path().to_path_buf());
        assert_eq!(reloaded.messages().len(), 1);
        assert!(reloaded.messages()[0].role.is_system());
        assert_eq!(reloaded.messages()[0].content, GREETING);
    }

    #[test]
    fn wire_history_skips_system_messages_and_the_placeholder() {
        let (_dir, mut store) = temp_store();
        store.append_user("question");
        store.reserve_reply();

        let history = store.wire_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, "user");
        assert_eq!(history[0].content, "question");
    }
}
