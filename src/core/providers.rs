//! Provider endpoints and session resolution
//!
//! A provider is an OpenAI-compatible HTTP endpoint plus the credential that
//! authenticates against it. Resolution precedence: explicit `-p` flag, then
//! the configured default, then the first provider with a stored credential,
//! then the `OPENAI_API_KEY`/`OPENAI_BASE_URL` environment.

use std::error::Error;
use std::fmt;

use crate::core::config::Config;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

const BUILTIN_PROVIDERS: &[(&str, &str, &str)] = &[
    ("openai", "OpenAI", DEFAULT_OPENAI_BASE_URL),
    ("openrouter", "OpenRouter", "https://openrouter.ai/api/v1"),
];

const QUICK_FIXES: &[&str] = &[
    "chinwag auth                    # Interactive setup",
    "chinwag -m                      # Browse the built-in catalog",
    "export OPENAI_API_KEY=sk-...    # Use environment variable (defaults to OpenAI API)",
];

#[derive(Clone, Debug)]
pub struct ProviderMetadata {
    pub id: String,
    pub display_name: String,
    pub base_url: String,
}

pub fn builtin_providers() -> Vec<ProviderMetadata> {
    BUILTIN_PROVIDERS
        .iter()
        .map(|(id, display_name, base_url)| ProviderMetadata {
            id: id.to_string(),
            display_name: display_name.to_string(),
            base_url: base_url.to_string(),
        })
        .collect()
}

/// Find a built-in provider by id (case-insensitive).
pub fn find_provider(id: &str) -> Option<ProviderMetadata> {
    builtin_providers()
        .into_iter()
        .find(|p| p.id.eq_ignore_ascii_case(id))
}

#[derive(Clone, Debug)]
pub struct ProviderSession {
    pub api_key: String,
    pub base_url: String,
    pub provider_id: String,
    pub provider_display_name: String,
}

#[derive(Debug)]
pub struct ProviderResolutionError {
    message: String,
    quick_fixes: &'static [&'static str],
    exit_code: i32,
}

impl ProviderResolutionError {
    pub fn missing_authentication() -> Self {
        Self::new(
            "No API key configured and OPENAI_API_KEY environment variable not set\n\nPlease either:\n1. Run 'chinwag auth' to store a key, or\n2. Set environment variables:\n   export OPENAI_API_KEY=\"your-api-key-here\"\n   export OPENAI_BASE_URL=\"https://api.openai.com/v1\"  # Optional",
            QUICK_FIXES,
            2,
        )
    }

    pub fn provider_not_configured(provider: &str) -> Self {
        Self::new(
            format!("No API key stored for provider '{provider}'. Run 'chinwag auth' to add one."),
            QUICK_FIXES,
            2,
        )
    }

    pub fn default_provider_missing(provider: &str) -> Self {
        Self::new(
            format!(
                "No API key stored for default provider '{provider}'. Run 'chinwag auth' to add one."
            ),
            QUICK_FIXES,
            2,
        )
    }

    pub fn unknown_provider(provider: &str) -> Self {
        Self::new(
            format!(
                "Unknown provider '{provider}'. Built-in providers: {}.",
                builtin_providers()
                    .iter()
                    .map(|p| p.id.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            QUICK_FIXES,
            2,
        )
    }

    fn new(
        message: impl Into<String>,
        quick_fixes: &'static [&'static str],
        exit_code: i32,
    ) -> Self {
        Self {
            message: message.into(),
            quick_fixes,
            exit_code,
        }
    }

    pub fn quick_fixes(&self) -> &'static [&'static str] {
        self.quick_fixes
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }
}

impl fmt::Display for ProviderResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for ProviderResolutionError {}

pub enum ResolveSessionError {
    Provider(ProviderResolutionError),
    Source(Box<dyn Error>),
}

impl fmt::Debug for ResolveSessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveSessionError::Provider(err) => f
                .debug_struct("ResolveSessionError::Provider")
                .field("error", err)
                .finish(),
            ResolveSessionError::Source(err) => f
                .debug_struct("ResolveSessionError::Source")
                .field("error", err)
                .finish(),
        }
    }
}

/// Where stored credentials come from. The production implementation is
/// [`crate::auth::CredentialStore`]; tests substitute mocks.
pub trait ProviderAuthSource {
    fn uses_keyring(&self) -> bool;
    fn find_provider_metadata(&self, provider: &str) -> Option<ProviderMetadata>;
    fn get_auth_for_provider(
        &self,
        provider: &str,
    ) -> Result<Option<(String, String)>, Box<dyn Error>>;
    fn find_first_available_auth(&self) -> Option<(ProviderMetadata, String)>;
}

/// Resolve a session purely from the environment.
pub fn resolve_env_session() -> Result<ProviderSession, ProviderResolutionError> {
    let api_key = std::env::var("OPENAI_API_KEY")
        .map_err(|_| ProviderResolutionError::missing_authentication())?;

    let base_url =
        std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string());

    let (provider_id, provider_display_name) = if base_url == DEFAULT_OPENAI_BASE_URL {
        ("openai".to_string(), "OpenAI".to_string())
    } else {
        (
            "openai-compatible".to_string(),
            "OpenAI-compatible".to_string(),
        )
    };

    Ok(ProviderSession {
        api_key,
        base_url,
        provider_id,
        provider_display_name,
    })
}

pub fn resolve_session<S: ProviderAuthSource>(
    source: &S,
    config: &Config,
    provider_override: Option<&str>,
) -> Result<ProviderSession, ResolveSessionError> {
    let provider_override = provider_override.filter(|value| !value.is_empty());

    if let Some(provider_name) = provider_override {
        return resolve_specific_provider(source, provider_name);
    }

    if let Some(default_provider) = config.default_provider.as_deref() {
        match source.get_auth_for_provider(default_provider) {
            Ok(Some((base_url, api_key))) => {
                let metadata = source
                    .find_provider_metadata(default_provider)
                    .unwrap_or_else(|| ProviderMetadata {
                        id: default_provider.to_string(),
                        display_name: default_provider.to_string(),
                        base_url: base_url.clone(),
                    });

                return Ok(build_session(metadata, api_key, base_url));
            }
            Ok(None) => {
                return Err(ResolveSessionError::Provider(
                    ProviderResolutionError::default_provider_missing(default_provider),
                ));
            }
            Err(err) => {
                return handle_keyring_failure(err, Some(default_provider));
            }
        }
    }

    if !source.uses_keyring() {
        return resolve_env_session().map_err(ResolveSessionError::Provider);
    }

    if let Some((metadata, api_key)) = source.find_first_available_auth() {
        return Ok(build_session(metadata, api_key, String::new()));
    }

    resolve_env_session().map_err(ResolveSessionError::Provider)
}

fn resolve_specific_provider<S: ProviderAuthSource>(
    source: &S,
    provider_name: &str,
) -> Result<ProviderSession, ResolveSessionError> {
    match source.get_auth_for_provider(provider_name) {
        Ok(Some((base_url, api_key))) => {
            let metadata = source
                .find_provider_metadata(provider_name)
                .unwrap_or_else(|| ProviderMetadata {
                    id: provider_name.to_string(),
                    display_name: provider_name.to_string(),
                    base_url: base_url.clone(),
                });

            Ok(build_session(metadata, api_key, base_url))
        }
        Ok(None) => Err(ResolveSessionError::Provider(
            ProviderResolutionError::provider_not_configured(provider_name),
        )),
        Err(err) => handle_keyring_failure(err, Some(provider_name)),
    }
}

/// Keyring backends fail for two distinct reasons: the platform store is
/// unavailable (recoverable, fall back to the environment) or the stored
/// entry itself is unusable (propagate).
fn is_recoverable_keyring_error(err: &keyring::Error) -> bool {
    matches!(
        err,
        keyring::Error::NoStorageAccess(_) | keyring::Error::PlatformFailure(_)
    )
}

fn handle_keyring_failure(
    err: Box<dyn Error>,
    provider_name: Option<&str>,
) -> Result<ProviderSession, ResolveSessionError> {
    match err.downcast::<keyring::Error>() {
        Ok(keyring_err) => {
            if is_recoverable_keyring_error(&keyring_err) {
                let context = provider_name
                    .map(|name| format!(" for provider '{name}'"))
                    .unwrap_or_default();
                tracing::warn!(
                    "unable to access stored credentials{context}: {keyring_err}; \
                     falling back to environment variables"
                );
                resolve_env_session().map_err(ResolveSessionError::Provider)
            } else {
                Err(ResolveSessionError::Source(keyring_err))
            }
        }
        Err(original_err) => Err(ResolveSessionError::Source(original_err)),
    }
}

fn build_session(
    metadata: ProviderMetadata,
    api_key: String,
    base_url_from_auth: String,
) -> ProviderSession {
    let base_url = if base_url_from_auth.is_empty() {
        metadata.base_url.clone()
    } else {
        base_url_from_auth
    };

    ProviderSession {
        api_key,
        base_url,
        provider_id: metadata.id.to_lowercase(),
        provider_display_name: metadata.display_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::TestEnvVarGuard;
    use std::error::Error as StdError;
    use std::io;

    struct StoredKeySource;

    impl ProviderAuthSource for StoredKeySource {
        fn uses_keyring(&self) -> bool {
            true
        }

        fn find_provider_metadata(&self, provider: &str) -> Option<ProviderMetadata> {
            find_provider(provider)
        }

        fn get_auth_for_provider(
            &self,
            provider: &str,
        ) -> Result<Option<(String, String)>, Box<dyn StdError>> {
            if provider == "openrouter" {
                Ok(Some((String::new(), "sk-stored".to_string())))
            } else {
                Ok(None)
            }
        }

        fn find_first_available_auth(&self) -> Option<(ProviderMetadata, String)> {
            find_provider("openrouter").map(|meta| (meta, "sk-stored".to_string()))
        }
    }

    struct BrokenKeyringSource;

    impl ProviderAuthSource for BrokenKeyringSource {
        fn uses_keyring(&self) -> bool {
            true
        }

        fn find_provider_metadata(&self, provider: &str) -> Option<ProviderMetadata> {
            find_provider(provider)
        }

        fn get_auth_for_provider(
            &self,
            _provider: &str,
        ) -> Result<Option<(String, String)>, Box<dyn StdError>> {
            let backend_error = io::Error::other("mock backend unavailable");
            Err(Box::new(keyring::Error::NoStorageAccess(Box::new(
                backend_error,
            ))))
        }

        fn find_first_available_auth(&self) -> Option<(ProviderMetadata, String)> {
            None
        }
    }

    struct CorruptEntrySource;

    impl ProviderAuthSource for CorruptEntrySource {
        fn uses_keyring(&self) -> bool {
            true
        }

        fn find_provider_metadata(&self, provider: &str) -> Option<ProviderMetadata> {
            find_provider(provider)
        }

        fn get_auth_for_provider(
            &self,
            _provider: &str,
        ) -> Result<Option<(String, String)>, Box<dyn StdError>> {
            Err(Box::new(keyring::Error::BadEncoding(Vec::new())))
        }

        fn find_first_available_auth(&self) -> Option<(ProviderMetadata, String)> {
            None
        }
    }

    #[test]
    fn builtin_provider_lookup_is_case_insensitive() {
        let provider = find_provider("OpenRouter").unwrap();
        assert_eq!(provider.id, "openrouter");
        assert_eq!(provider.base_url, "https://openrouter.ai/api/v1");
        assert!(find_provider("poe").is_none());
    }

    #[test]
    fn override_takes_precedence_over_defaults() {
        let config = Config {
            default_provider: Some("openai".to_string()),
            ..Config::default()
        };

        let session = resolve_session(&StoredKeySource, &config, Some("openrouter")).unwrap();
        assert_eq!(session.provider_id, "openrouter");
        assert_eq!(session.api_key, "sk-stored");
        assert_eq!(session.base_url, "https://openrouter.ai/api/v1");
    }

    #[test]
    fn missing_default_provider_credential_is_reported() {
        let config = Config {
            default_provider: Some("openai".to_string()),
            ..Config::default()
        };

        let err = resolve_session(&StoredKeySource, &config, None)
            .expect_err("openai has no stored key");
        match err {
            ResolveSessionError::Provider(provider_err) => {
                assert!(provider_err.to_string().contains("openai"));
                assert_eq!(provider_err.exit_code(), 2);
                assert!(!provider_err.quick_fixes().is_empty());
            }
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn first_available_credential_wins_without_defaults() {
        let config = Config::default();
        let session = resolve_session(&StoredKeySource, &config, None).unwrap();
        assert_eq!(session.provider_id, "openrouter");
        assert_eq!(session.provider_display_name, "OpenRouter");
    }

    #[test]
    fn recoverable_keyring_failure_uses_env_credentials() {
        let mut env_guard = TestEnvVarGuard::new();
        env_guard.set_var("OPENAI_API_KEY", "sk-env");
        env_guard.set_var("OPENAI_BASE_URL", "https://example.com/v1");

        let config = Config {
            default_provider: Some("openai".to_string()),
            ..Config::default()
        };

        let session = resolve_session(&BrokenKeyringSource, &config, None)
            .expect("recoverable error should fall back to env");

        assert_eq!(session.api_key, "sk-env");
        assert_eq!(session.base_url, "https://example.com/v1");
        assert_eq!(session.provider_id, "openai-compatible");
        assert_eq!(session.provider_display_name, "OpenAI-compatible");
    }

    #[test]
    fn env_session_with_default_base_url_is_openai() {
        let mut env_guard = TestEnvVarGuard::new();
        env_guard.set_var("OPENAI_API_KEY", "sk-env");
        env_guard.remove_var("OPENAI_BASE_URL");

        let session = resolve_env_session().unwrap();
        assert_eq!(session.provider_id, "openai");
        assert_eq!(session.base_url, DEFAULT_OPENAI_BASE_URL);
    }

    #[test]
    fn missing_env_credentials_are_an_error() {
        let mut env_guard = TestEnvVarGuard::new();
        env_guard.remove_var("OPENAI_API_KEY");
        env_guard.remove_var("OPENAI_BASE_URL");

        let err = resolve_env_session().expect_err("no key anywhere");
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn corrupt_keyring_entry_is_propagated() {
        let config = Config {
            default_provider: Some("openai".to_string()),
            ..Config::default()
        };

        let err = resolve_session(&CorruptEntrySource, &config, None)
            .expect_err("permanent failures should bubble up");

        match err {
            ResolveSessionError::Source(source_err) => {
                let keyring_err = source_err
                    .downcast::<keyring::Error>()
                    .expect("error should be a keyring::Error");
                assert!(!is_recoverable_keyring_error(&keyring_err));
            }
            _ => panic!("unexpected error variant"),
        }
    }
}
