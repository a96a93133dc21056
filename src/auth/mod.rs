//! Credential storage
//!
//! One API key per provider, held in the OS keyring under the `chinwag`
//! service. The key leaves the store only as an authorization header on
//! outbound requests; it is never written to logs or config files.

use std::collections::HashMap;
use std::error::Error;
use std::sync::{Mutex, OnceLock};

use keyring::Entry;

use crate::core::config::Config;
use crate::core::providers::{
    builtin_providers, resolve_session, ProviderAuthSource, ProviderMetadata, ResolveSessionError,
};

mod ui;

use self::ui::{
    prompt_auth_menu, prompt_deauth_menu, prompt_provider_token, MenuSelection, ProviderMenuItem,
    UiError,
};

const KEYRING_SERVICE: &str = "chinwag";

pub struct CredentialStore {
    providers: Vec<ProviderMetadata>,
    use_keyring: bool,
}

#[derive(Clone, Debug)]
enum KeyringCacheEntry {
    Present(String),
    Missing,
}

fn map_ui_result<T>(result: Result<T, UiError>) -> Result<T, Box<dyn Error>> {
    result.map_err(|err| Box::new(err) as Box<dyn Error>)
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::new_with_keyring(true)
    }

    /// Construct a store, optionally disabling keyring access (useful for
    /// tests and headless environments).
    pub fn new_with_keyring(use_keyring: bool) -> Self {
        Self {
            providers: builtin_providers(),
            use_keyring,
        }
    }

    pub fn providers(&self) -> &[ProviderMetadata] {
        &self.providers
    }

    pub fn find_provider_by_name(&self, name: &str) -> Option<&ProviderMetadata> {
        self.providers
            .iter()
            .find(|p| p.id.eq_ignore_ascii_case(name))
    }

    /// Resolve the session per the precedence in [`crate::core::providers`].
    /// Returns `(api_key, base_url, provider_id, provider_display_name)`.
    pub fn resolve_authentication(
        &self,
        provider: Option<&str>,
        config: &Config,
    ) -> Result<(String, String, String, String), Box<dyn Error>> {
        match resolve_session(self, config, provider) {
            Ok(session) => Ok((
                session.api_key,
                session.base_url,
                session.provider_id,
                session.provider_display_name,
            )),
            Err(ResolveSessionError::Provider(err)) => Err(Box::new(err)),
            Err(ResolveSessionError::Source(err)) => Err(err),
        }
    }

    pub fn store_token(&self, provider_name: &str, token: &str) -> Result<(), Box<dyn Error>> {
        if !self.use_keyring {
            return Ok(());
        }
        let entry = Entry::new(KEYRING_SERVICE, provider_name)?;
        entry.set_password(token)?;
        self.cache_lookup(provider_name, KeyringCacheEntry::Present(token.to_string()));
        tracing::debug!(provider = provider_name, "stored credential");
        Ok(())
    }

    pub fn get_token(&self, provider_name: &str) -> Result<Option<String>, Box<dyn Error>> {
        if !self.use_keyring {
            return Ok(None);
        }
        if let Some(cached) = get_cached_entry(provider_name) {
            return match cached {
                KeyringCacheEntry::Present(token) => Ok(Some(token)),
                KeyringCacheEntry::Missing => Ok(None),
            };
        }
        let entry = Entry::new(KEYRING_SERVICE, provider_name).map_err(Box::new)?;
        match entry.get_password() {
            Ok(token) => {
                self.cache_lookup(provider_name, KeyringCacheEntry::Present(token.clone()));
                tracing::debug!(provider = provider_name, "credential found in keyring");
                Ok(Some(token))
            }
            Err(keyring::Error::NoEntry) => {
                self.cache_lookup(provider_name, KeyringCacheEntry::Missing);
                Ok(None)
            }
            Err(err) => Err(Box::new(err)),
        }
    }

    pub fn remove_token(&self, provider_name: &str) -> Result<(), Box<dyn Error>> {
        if !self.use_keyring {
            return Ok(());
        }
        let entry = Entry::new(KEYRING_SERVICE, provider_name)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => {
                self.cache_lookup(provider_name, KeyringCacheEntry::Missing);
                Ok(())
            }
            Err(e) => Err(Box::new(e)),
        }
    }

    pub fn find_first_available_auth(&self) -> Option<(ProviderMetadata, String)> {
        for provider in &self.providers {
            if let Ok(Some(token)) = self.get_token(&provider.id) {
                return Some((provider.clone(), token));
            }
        }
        None
    }

    /// `chinwag auth`: pick a provider, enter the key masked, store it.
    pub fn interactive_auth(&self) -> Result<(), Box<dyn Error>> {
        let mut menu_items = Vec::new();
        for provider in &self.providers {
            let configured = self.get_token(&provider.id)?.is_some();
            menu_items.push(ProviderMenuItem {
                id: provider.id.clone(),
                display_name: provider.display_name.clone(),
                configured,
            });
        }

        match map_ui_result(prompt_auth_menu(&menu_items))? {
            MenuSelection::Provider(index) => {
                let provider = &self.providers[index];
                let token = map_ui_result(prompt_provider_token(&provider.display_name))?;
                if token.is_empty() {
                    return Err("API key cannot be empty".into());
                }
                self.store_token(&provider.id, &token)?;
                println!("Key stored securely for {}", provider.display_name);
                println!();
                println!("You can now run chinwag without setting environment variables.");
            }
            MenuSelection::Cancel => {
                println!("Cancelled.");
            }
        }

        Ok(())
    }

    /// `chinwag deauth [provider]`: remove a stored key.
    pub fn interactive_deauth(&self, provider: Option<String>) -> Result<(), Box<dyn Error>> {
        if let Some(provider_name) = provider {
            let resolved = self
                .find_provider_by_name(&provider_name)
                .map(|p| p.id.clone())
                .ok_or_else(|| format!("Unknown provider '{provider_name}'."))?;

            if self.get_token(&resolved)?.is_none() {
                return Err(
                    format!("Provider '{provider_name}' has no stored key to remove.").into(),
                );
            }

            self.remove_token(&resolved)?;
            println!("Key removed for {provider_name}");
            return Ok(());
        }

        let mut configured = Vec::new();
        for provider in &self.providers {
            if self.get_token(&provider.id)?.is_some() {
                configured.push(ProviderMenuItem {
                    id: provider.id.clone(),
                    display_name: provider.display_name.clone(),
                    configured: true,
                });
            }
        }

        if let Some(index) = map_ui_result(prompt_deauth_menu(&configured))? {
            self.remove_token(&configured[index].id)?;
            println!("Key removed for {}", configured[index].display_name);
        }

        Ok(())
    }

    fn cache_lookup(&self, provider_name: &str, entry: KeyringCacheEntry) {
        if !self.use_keyring {
            return;
        }

        if let Ok(mut cache) = token_cache().lock() {
            cache.insert(provider_name.to_string(), entry);
        }
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

fn get_cached_entry(provider_name: &str) -> Option<KeyringCacheEntry> {
    let cache = token_cache().lock().ok()?;
    cache.get(provider_name).cloned()
}

fn token_cache() -> &'static Mutex<HashMap<String, KeyringCacheEntry>> {
    static TOKEN_CACHE: OnceLock<Mutex<HashMap<String, KeyringCacheEntry>>> = OnceLock::new();
    TOKEN_CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

impl ProviderAuthSource for CredentialStore {
    fn uses_keyring(&self) -> bool {
        self.use_keyring
    }

    fn find_provider_metadata(&self, provider: &str) -> Option<ProviderMetadata> {
        self.find_provider_by_name(provider).cloned()
    }

    fn get_auth_for_provider(
        &self,
        provider: &str,
    ) -> Result<Option<(String, String)>, Box<dyn Error>> {
        if let Some(known) = self.find_provider_by_name(provider) {
            let base_url = known.base_url.clone();
            // Canonical id for the keyring lookup, so `-p OpenAI` matches
            // a key stored as "openai".
            let id = known.id.clone();
            if let Some(token) = self.get_token(&id)? {
                return Ok(Some((base_url, token)));
            }
        }
        Ok(None)
    }

    fn find_first_available_auth(&self) -> Option<(ProviderMetadata, String)> {
        CredentialStore::find_first_available_auth(self)
    }
}
