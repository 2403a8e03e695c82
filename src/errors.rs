//! Error taxonomy for the gateway. Transport failures, backend status failures,
//! and local encode/decode failures are kept apart so the gateway can single out
//! the one class (401) that triggers session recovery. `AppError` is `Clone`
//! because a single outcome may be handed to many waiting callers.

use serde_json::{Map, Value};
use thiserror::Error;

/// Status code that marks an expired or absent session.
pub const UNAUTHORIZED: u16 = 401;

/// Message shown when a failure carries nothing readable.
pub const FALLBACK_MESSAGE: &str = "Request failed. Check your input and try again.";

#[derive(Clone, Debug, Error)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Request failed ({status}): {body}")]
    Http { status: u16, body: FailureBody },
    #[error("Response error: {0}")]
    Parse(String),
    #[error("Request error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Backend status, when the failure came from a response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True only for the distinguished "unauthenticated" status class.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(UNAUTHORIZED)
    }

    /// One human-readable line for the failed action.
    ///
    /// Response bodies go through [`FailureBody::message`]; transport and local
    /// failures surface their own description, mirroring how a fetch error
    /// carries an `error` string instead of a body.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Http { body, .. } => body
                .message()
                .map_or_else(|| FALLBACK_MESSAGE.to_string(), str::to_string),
            Self::Network(message)
            | Self::Timeout(message)
            | Self::Parse(message)
            | Self::Serialization(message)
            | Self::Config(message) => {
                if message.trim().is_empty() {
                    FALLBACK_MESSAGE.to_string()
                } else {
                    message.clone()
                }
            }
        }
    }
}

/// Body of a failed response, classified once when the response is read.
#[derive(Clone, Debug, PartialEq)]
pub enum FailureBody {
    Empty,
    /// A plain text body, or a JSON document that is itself a string.
    Text(String),
    /// A JSON object, searched for `message` then `error`.
    Object(Map<String, Value>),
    /// Any other JSON document (array, number, bool, null).
    Other(Value),
}

impl FailureBody {
    /// Classifies a raw response body.
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::Empty;
        }

        match serde_json::from_str::<Value>(raw) {
            Ok(Value::String(text)) => Self::Text(text),
            Ok(Value::Object(map)) => Self::Object(map),
            Ok(other) => Self::Other(other),
            Err(_) => Self::Text(raw.to_string()),
        }
    }

    /// Message precedence: string body, then `message`, then `error`.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            Self::Object(map) => match (map.get("message"), map.get("error")) {
                (Some(Value::String(message)), _) => Some(message.as_str()),
                (_, Some(Value::String(error))) => Some(error.as_str()),
                _ => None,
            },
            Self::Empty | Self::Other(_) => None,
        }
    }
}

impl std::fmt::Display for FailureBody {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(formatter, "<empty>"),
            Self::Text(text) => write!(formatter, "{text}"),
            Self::Object(map) => write!(formatter, "{}", Value::Object(map.clone())),
            Self::Other(value) => write!(formatter, "{value}"),
        }
    }
}
