//! One chat turn: a single request against the provider and the update that
//! comes back.
//!
//! [`TurnService`] owns the sending half of an unbounded channel; each
//! spawned turn posts once, maps the outcome to a [`TurnUpdate`], and sends
//! it tagged with its turn id. The receiving side drops updates whose id is
//! not the current one, so a slow reply from an abandoned turn can never
//! overwrite a newer conversation.

use std::error::Error;
use std::fmt;

use tokio::sync::mpsc;

use crate::api::{
    decode_reply, provider_error_message, ChatMessage, ChatRequest, DecodeReplyError,
};
use crate::utils::url::chat_completions_url;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Why a turn ended without an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnError {
    /// No key configured; the request was never sent.
    CredentialMissing,
    /// Provider answered 401.
    CredentialInvalid,
    /// Provider answered 429.
    RateLimited,
    /// Provider answered another non-success status; carries the message
    /// extracted from its error payload.
    Provider(String),
    /// The request never produced a response.
    Transport(String),
    /// Success status but the body matched no known reply shape.
    UnsupportedShape(DecodeReplyError),
}

impl fmt::Display for TurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnError::CredentialMissing => {
                write!(f, "No API key configured. Use /key to add one.")
            }
            TurnError::CredentialInvalid => {
                write!(f, "Invalid API key. Please check your API key.")
            }
            TurnError::RateLimited => {
                write!(f, "Rate limit exceeded. Please try again later.")
            }
            TurnError::Provider(message) | TurnError::Transport(message) => {
                write!(f, "{message}")
            }
            TurnError::UnsupportedShape(inner) => {
                write!(f, "Unsupported provider response: {inner}")
            }
        }
    }
}

impl Error for TurnError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TurnError::UnsupportedShape(inner) => Some(inner),
            _ => None,
        }
    }
}

/// Content written into the reserved assistant slot when a turn fails.
pub fn error_reply_content(err: &TurnError) -> String {
    format!("Error: {err}")
}

#[derive(Clone, Debug)]
pub enum TurnUpdate {
    Resolved(String),
    Failed(TurnError),
}

pub struct TurnParams {
    pub client: reqwest::Client,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub api_messages: Vec<ChatMessage>,
    pub turn_id: u64,
}

#[derive(Clone)]
pub struct TurnService {
    tx: mpsc::UnboundedSender<(TurnUpdate, u64)>,
}

impl TurnService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(TurnUpdate, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Fire one request. The result arrives on the channel; nothing is
    /// awaited here.
    pub fn spawn_turn(&self, params: TurnParams) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let TurnParams {
                client,
                base_url,
                api_key,
                model,
                api_messages,
                turn_id,
            } = params;

            let update = match execute_turn(&client, &base_url, &api_key, &model, api_messages)
                .await
            {
                Ok(answer) => TurnUpdate::Resolved(answer),
                Err(err) => TurnUpdate::Failed(err),
            };
            let _ = tx.send((update, turn_id));
        });
    }

    #[cfg(test)]
    pub fn send_for_test(&self, update: TurnUpdate, turn_id: u64) {
        let _ = self.tx.send((update, turn_id));
    }
}

async fn execute_turn(
    client: &reqwest::Client,
    base_url: &str,
    api_key: &str,
    model: &str,
    api_messages: Vec<ChatMessage>,
) -> Result<String, TurnError> {
    let request = ChatRequest {
        model: model.to_string(),
        messages: api_messages,
        temperature: Some(DEFAULT_TEMPERATURE),
        max_tokens: Some(DEFAULT_MAX_TOKENS),
    };

    let response = client
        .post(chat_completions_url(base_url))
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {api_key}"))
        .json(&request)
        .send()
        .await
        .map_err(|err| TurnError::Transport(err.to_string()))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|err| TurnError::Transport(err.to_string()))?;

    if !status.is_success() {
        return Err(match status.as_u16() {
            401 => TurnError::CredentialInvalid,
            429 => TurnError::RateLimited,
            code => TurnError::Provider(provider_error_message(&body, code)),
        });
    }

    decode_reply(&body)
        .map(|reply| reply.into_text())
        .map_err(TurnError::UnsupportedShape)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_credential_message_names_the_api_key() {
        assert_eq!(
            TurnError::CredentialInvalid.to_string(),
            "Invalid API key. Please check your API key."
        );
    }

    #[test]
    fn rate_limit_message_asks_to_retry_later() {
        assert_eq!(
            TurnError::RateLimited.to_string(),
            "Rate limit exceeded. Please try again later."
        );
    }

    #[test]
    fn provider_and_transport_errors_carry_their_message() {
        assert_eq!(
            TurnError::Provider("model overloaded".to_string()).to_string(),
            "model overloaded"
        );
        assert_eq!(
            TurnError::Transport("connection refused".to_string()).to_string(),
            "connection refused"
        );
    }

    #[test]
    fn unsupported_shape_mentions_the_response_and_chains_its_source() {
        let err = TurnError::UnsupportedShape(DecodeReplyError::UnrecognizedShape);
        assert!(err.to_string().starts_with("Unsupported provider response"));
        assert!(err.source().is_some());
    }

    #[test]
    fn error_reply_content_uses_the_error_prefix() {
        let err = TurnError::CredentialInvalid;
        assert_eq!(
            error_reply_content(&err),
            "Error: Invalid API key. Please check your API key."
        );
    }

    #[test]
    fn updates_arrive_tagged_with_their_turn_id() {
        let runtime = tokio::runtime::Runtime::new().expect("runtime");
        let (service, mut rx) = TurnService::new();

        service.send_for_test(TurnUpdate::Resolved("hello".to_string()), 7);
        let (update, turn_id) = runtime.block_on(rx.recv()).expect("update");

        assert_eq!(turn_id, 7);
        match update {
            TurnUpdate::Resolved(text) => assert_eq!(text, "hello"),
            TurnUpdate::Failed(err) => panic!("unexpected failure: {err}"),
        }
    }
}
