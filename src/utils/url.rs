//! URL construction for provider endpoints
//!
//! Base URLs come from the provider table, config, or the environment, with
//! or without trailing slashes; everything funnels through here so the final
//! request URL never carries a double slash.

/// Normalize a base URL by removing trailing slashes.
///
/// # Examples
///
/// ```
/// use chinwag::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("https://api.openai.com/v1"), "https://api.openai.com/v1");
/// assert_eq!(normalize_base_url("https://api.openai.com/v1/"), "https://api.openai.com/v1");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// The chat-completions endpoint for a provider base URL.
///
/// # Examples
///
/// ```
/// use chinwag::utils::url::chat_completions_url;
///
/// assert_eq!(
///     chat_completions_url("https://openrouter.ai/api/v1/"),
///     "https://openrouter.ai/api/v1/chat/completions"
/// );
/// ```
pub fn chat_completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", normalize_base_url(base_url))
}
