//! Provider listing functionality
//!
//! Prints the built-in providers and whether a key is stored for each. Never
//! prints the key itself, only its presence.

use std::error::Error;

use crate::auth::CredentialStore;
use crate::core::config::Config;

pub fn list_providers() -> Result<(), Box<dyn Error>> {
    let credentials = CredentialStore::new();
    let config = Config::load()?;

    println!("Available providers");
    println!("===================");
    println!();

    for provider in credentials.providers() {
        let has_token = credentials.get_token(&provider.id).ok().flatten().is_some();
        let auth_status = if has_token {
            "key stored"
        } else {
            "no key stored"
        };
        let default_marker = if config
            .default_provider
            .as_deref()
            .is_some_and(|d| d.eq_ignore_ascii_case(&provider.id))
        {
            " (default)"
        } else {
            ""
        };

        println!("  {}{default_marker}", provider.id);
        println!("    {} ({})", provider.display_name, provider.base_url);
        println!("    {auth_status}");
        println!();
    }

    println!("Store a key with: chinwag auth");
    Ok(())
}
