//! Session wiring for a chat run.

use reqwest::Client;

use crate::auth::CredentialStore;
use crate::core::catalog;
use crate::core::config::Config;
use crate::core::providers::{
    find_provider, resolve_env_session, resolve_session, ProviderSession, ResolveSessionError,
    DEFAULT_OPENAI_BASE_URL,
};
use crate::ui::theme::Theme;

/// Requested model value meaning "pick one for me".
pub const DEFAULT_MODEL: &str = "default";

/// Everything a turn needs to reach the provider, plus the in-flight guard.
pub struct SessionContext {
    pub client: Client,
    pub model: String,
    pub api_key: String,
    pub base_url: String,
    pub provider_name: String,
    pub provider_display_name: String,
    /// Monotonic id handed to each spawned turn. Updates tagged with any
    /// other id are stale and get dropped.
    pub current_turn_id: u64,
}

impl SessionContext {
    pub fn has_credential(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn next_turn_id(&mut self) -> u64 {
        self.current_turn_id += 1;
        self.current_turn_id
    }
}

pub struct SessionBootstrap {
    pub session: SessionContext,
    pub theme: Theme,
}

pub(crate) fn resolve_theme(config: &Config) -> Theme {
    match &config.theme {
        Some(name) => Theme::from_name(name),
        None => Theme::dark_default(),
    }
}

fn resolve_model(requested: &str, config: &Config) -> String {
    if requested != DEFAULT_MODEL {
        return requested.to_string();
    }
    if let Some(model) = &config.default_model {
        return model.clone();
    }
    catalog::all_models()
        .first()
        .map(|m| m.id.clone())
        .unwrap_or_default()
}

fn session_from_provider(provider: ProviderSession, model: String) -> SessionContext {
    SessionContext {
        client: Client::new(),
        model,
        api_key: provider.api_key,
        base_url: provider.base_url,
        provider_name: provider.provider_id,
        provider_display_name: provider.provider_display_name,
        current_turn_id: 0,
    }
}

/// A session with no credential. Submitting a message in this state shows a
/// notice instead of making a request; the key dialog upgrades it in place.
fn uninitialized_session(model: String, config: &Config) -> SessionContext {
    let provider = config
        .default_provider
        .as_deref()
        .and_then(find_provider)
        .or_else(|| find_provider("openai"));

    let (id, display_name, base_url) = match provider {
        Some(p) => (p.id, p.display_name, p.base_url),
        None => (
            "openai".to_string(),
            "OpenAI".to_string(),
            DEFAULT_OPENAI_BASE_URL.to_string(),
        ),
    };

    SessionContext {
        client: Client::new(),
        model,
        api_key: String::new(),
        base_url,
        provider_name: id,
        provider_display_name: display_name,
        current_turn_id: 0,
    }
}

/// Resolve credentials and model for startup.
///
/// An explicitly requested provider that cannot be resolved is fatal. With
/// no explicit provider, missing credentials are not: the session starts
/// uninitialized and the user can store a key from inside the app.
pub fn prepare_session(
    model: String,
    provider: Option<String>,
    env_only: bool,
    config: &Config,
) -> Result<SessionBootstrap, Box<dyn std::error::Error>> {
    let theme = resolve_theme(config);

    let resolved = if env_only {
        Some(resolve_env_session().map_err(|err| Box::new(err) as Box<dyn std::error::Error>)?)
    } else {
        let store = CredentialStore::new();
        match resolve_session(&store, config, provider.as_deref()) {
            Ok(session) => Some(session),
            Err(ResolveSessionError::Provider(err)) => {
                if provider.is_some() {
                    return Err(Box::new(err));
                }
                None
            }
            Err(ResolveSessionError::Source(err)) => return Err(err),
        }
    };

    let model = resolve_model(&model, config);
    let session = match resolved {
        Some(provider_session) => session_from_provider(provider_session, model),
        None => uninitialized_session(model, config),
    };

    Ok(SessionBootstrap { session, theme })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_model_is_kept() {
        let config = Config::default();
        assert_eq!(resolve_model("openai/gpt-4o-mini", &config), "openai/gpt-4o-mini");
    }

    #[test]
    fn default_model_prefers_config_then_catalog() {
        let configured = Config {
            default_model: Some("meta-llama/llama-3.3-70b-instruct".to_string()),
            ..Default::default()
        };
        assert_eq!(
            resolve_model(DEFAULT_MODEL, &configured),
            "meta-llama/llama-3.3-70b-instruct"
        );

        let bare = Config::default();
        let fallback = resolve_model(DEFAULT_MODEL, &bare);
        assert_eq!(fallback, catalog::all_models()[0].id);
    }

    #[test]
    fn session_from_provider_copies_fields() {
        let provider = ProviderSession {
            api_key: "test-key".to_string(),
            base_url: "https://example.invalid/v1".to_string(),
            provider_id: "test-provider".to_string(),
            provider_display_name: "Test Provider".to_string(),
        };

        let session = session_from_provider(provider, "openai/gpt-4o".to_string());
        assert_eq!(session.api_key, "test-key");
        assert_eq!(session.base_url, "https://example.invalid/v1");
        assert_eq!(session.provider_name, "test-provider");
        assert_eq!(session.provider_display_name, "Test Provider");
        assert!(session.has_credential());
        assert_eq!(session.current_turn_id, 0);
    }

    #[test]
    fn uninitialized_session_has_no_credential() {
        let session = uninitialized_session("openai/gpt-4o".to_string(), &Config::default());
        assert!(!session.has_credential());
        assert_eq!(session.provider_name, "openai");
        assert_eq!(session.base_url, DEFAULT_OPENAI_BASE_URL);
    }

    #[test]
    fn uninitialized_session_respects_configured_default_provider() {
        let config = Config {
            default_provider: Some("openrouter".to_string()),
            ..Default::default()
        };
        let session = uninitialized_session("default".to_string(), &config);
        assert_eq!(session.provider_name, "openrouter");
        assert_eq!(session.base_url, "https://openrouter.ai/api/v1");
    }

    #[test]
    fn turn_ids_are_monotonic() {
        let mut session = uninitialized_session("default".to_string(), &Config::default());
        let first = session.next_turn_id();
        let second = session.next_turn_id();
        assert!(second > first);
    }

    #[test]
    fn theme_falls_back_to_dark() {
        let theme = resolve_theme(&Config::default());
        assert_eq!(
            theme.background_color,
            Theme::dark_default().background_color
        );
    }
}
