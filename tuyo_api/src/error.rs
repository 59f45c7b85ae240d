use thiserror::Error;

use crate::types::error_types::ApiErrorBody;

/// A unified error type for this library.
#[derive(Debug, Error)]
pub enum TuyoError {
    /// HTTP request failed (network or protocol issue).
    #[error("Reqwest Error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    /// Non-2xx status with a message the server put in the body.
    #[error("API Error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The server returned an error code we couldn't parse a message from.
    /// Contains the HTTP status code and raw body.
    #[error("Non-success HTTP status {code}, body: {body}")]
    HttpStatus { code: u16, body: String },

    /// Serde (de)serialization error.
    #[error("Serde JSON error: {0}")]
    SerdeError(#[from] serde_json::Error),

    /// The account service refused to issue a code. The reason is kept out
    /// of the error on purpose.
    #[error("OTP send failed with status {status}")]
    OtpSend { status: u16 },

    /// The code was rejected; carries the server message or the default.
    #[error("{0}")]
    OtpInvalid(String),

    /// The session token could not be decoded.
    #[error("Token error: {0}")]
    Token(String),

    #[error("Config error: {0}")]
    Config(String),

    // Other
    #[error("Other error: {0}")]
    Other(String),
}

impl TuyoError {
    /// The message the server supplied, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } => Some(message.as_str()),
            Self::OtpInvalid(message) => Some(message.as_str()),
            _ => None,
        }
    }
}

/// Convert a parsed error body into a `TuyoError`, falling back to the raw
/// body when it carries no message.
pub fn handle_api_error(status: u16, body: ApiErrorBody, raw: &[u8]) -> TuyoError {
    match body.into_message() {
        Some(message) => TuyoError::Api { status, message },
        None => TuyoError::HttpStatus {
            code: status,
            body: String::from_utf8_lossy(raw).to_string(),
        },
    }
}
