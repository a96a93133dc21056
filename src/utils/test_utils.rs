#[cfg(test)]
use std::sync::{Mutex, MutexGuard};

#[cfg(test)]
use crate::auth::CredentialStore;
#[cfg(test)]
use crate::core::app::App;
#[cfg(test)]
use crate::core::conversation::ConversationStore;
#[cfg(test)]
use crate::core::session::SessionContext;
#[cfg(test)]
use crate::core::turn::TurnService;
#[cfg(test)]
use crate::ui::theme::Theme;

/// A ready-to-drive app with a temp-dir conversation, a keyringless
/// credential store, and a turn service whose receiver is dropped (spawned
/// turns go nowhere). The temp dir must outlive the app or persistence
/// writes start failing.
#[cfg(test)]
pub fn create_test_app() -> (tempfile::TempDir, App) {
    let dir = tempfile::tempdir().expect("temp dir");

    let session = SessionContext {
        client: reqwest::Client::new(),
        model: "test-model".to_string(),
        api_key: "test-key".to_string(),
        base_url: "https://api.test.com".to_string(),
        provider_name: "test".to_string(),
        provider_display_name: "Test".to_string(),
        current_turn_id: 0,
    };

    let conversation = ConversationStore::load_from_path(dir.path().join("conversation.json"));
    let credentials = CredentialStore::new_with_keyring(false);
    let (turn_service, _rx) = TurnService::new();

    let app = App::new(
        session,
        Theme::dark_default(),
        conversation,
        credentials,
        turn_service,
    );
    (dir, app)
}

#[cfg(test)]
static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Serializes environment mutation across tests and restores the previous
/// values on drop.
#[cfg(test)]
pub struct TestEnvVarGuard {
    _lock: MutexGuard<'static, ()>,
    saved: Vec<(&'static str, Option<String>)>,
}

#[cfg(test)]
impl TestEnvVarGuard {
    pub fn new() -> Self {
        let lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Self {
            _lock: lock,
            saved: Vec::new(),
        }
    }

    pub fn set_var(&mut self, key: &'static str, value: &str) {
        self.remember(key);
        std::env::set_var(key, value);
    }

    pub fn remove_var(&mut self, key: &'static str) {
        self.remember(key);
        std::env::remove_var(key);
    }

    fn remember(&mut self, key: &'static str) {
        if !self.saved.iter().any(|(saved_key, _)| *saved_key == key) {
            self.saved.push((key, std::env::var(key).ok()));
        }
    }
}

#[cfg(test)]
impl Drop for TestEnvVarGuard {
    fn drop(&mut self) {
        for (key, value) in self.saved.drain(..) {
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
        }
    }
}
