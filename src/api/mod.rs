//! Chat-completions wire types and reply decoding.
//!
//! Providers answer in several envelope shapes. Decoding walks an ordered
//! list of shape matchers and returns the first hit as a tagged
//! [`ReplyEnvelope`]; a body that matches none of them is a
//! [`DecodeReplyError`], never a panic.

use std::error::Error;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Serialize, Debug)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// A successful reply, tagged by the envelope shape it arrived in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyEnvelope {
    /// `choices[0].message.content` (OpenAI chat-completion shape)
    ChatCompletion(String),
    /// Top-level `content` field
    FlatContent(String),
    /// Top-level `text` field
    FlatText(String),
    /// The body is a bare JSON string
    BareString(String),
}

impl ReplyEnvelope {
    pub fn into_text(self) -> String {
        match self {
            ReplyEnvelope::ChatCompletion(text)
            | ReplyEnvelope::FlatContent(text)
            | ReplyEnvelope::FlatText(text)
            | ReplyEnvelope::BareString(text) => text,
        }
    }

    pub fn shape_name(&self) -> &'static str {
        match self {
            ReplyEnvelope::ChatCompletion(_) => "chat-completion",
            ReplyEnvelope::FlatContent(_) => "flat-content",
            ReplyEnvelope::FlatText(_) => "flat-text",
            ReplyEnvelope::BareString(_) => "bare-string",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeReplyError {
    /// The body was not valid JSON at all.
    InvalidJson,
    /// Valid JSON, but no shape matcher recognized it.
    UnrecognizedShape,
}

impl fmt::Display for DecodeReplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeReplyError::InvalidJson => write!(f, "response body was not valid JSON"),
            DecodeReplyError::UnrecognizedShape => {
                write!(f, "response body did not match any known reply shape")
            }
        }
    }
}

impl Error for DecodeReplyError {}

type ShapeMatcher = fn(&Value) -> Option<ReplyEnvelope>;

/// Matchers are tried in order; the first hit wins.
const SHAPE_MATCHERS: &[ShapeMatcher] = &[
    match_chat_completion,
    match_flat_content,
    match_flat_text,
    match_bare_string,
];

pub fn decode_reply(body: &str) -> Result<ReplyEnvelope, DecodeReplyError> {
    let value: Value = serde_json::from_str(body).map_err(|_| DecodeReplyError::InvalidJson)?;
    SHAPE_MATCHERS
        .iter()
        .find_map(|matcher| matcher(&value))
        .ok_or(DecodeReplyError::UnrecognizedShape)
}

fn match_chat_completion(value: &Value) -> Option<ReplyEnvelope> {
    value
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(|text| ReplyEnvelope::ChatCompletion(text.to_string()))
}

fn match_flat_content(value: &Value) -> Option<ReplyEnvelope> {
    value
        .get("content")
        .and_then(Value::as_str)
        .map(|text| ReplyEnvelope::FlatContent(text.to_string()))
}

fn match_flat_text(value: &Value) -> Option<ReplyEnvelope> {
    value
        .get("text")
        .and_then(Value::as_str)
        .map(|text| ReplyEnvelope::FlatText(text.to_string()))
}

fn match_bare_string(value: &Value) -> Option<ReplyEnvelope> {
    value
        .as_str()
        .map(|text| ReplyEnvelope::BareString(text.to_string()))
}

/// Pull a human-readable message out of an error payload: `error.message`,
/// an `error` that is itself a string, or a top-level `message`, whitespace
/// collapsed.
pub fn extract_error_summary(value: &Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value.get("error").and_then(|v| match v {
                Value::String(s) => Some(s.to_string()),
                Value::Object(map) => map
                    .get("message")
                    .and_then(|message| message.as_str().map(str::to_owned)),
                _ => None,
            })
        })
        .or_else(|| value.get("message").and_then(|v| v.as_str().map(str::to_owned)));

    summary.map(|text| {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        collapsed.trim().to_string()
    })
}

/// Message for a non-success status: the payload's own summary when it has
/// one, otherwise a plain HTTP line.
pub fn provider_error_message(body: &str, status: u16) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(summary) = extract_error_summary(&value) {
            if !summary.is_empty() {
                return summary;
            }
        }
    }
    format!("Provider returned HTTP {status}")
}
