//! Session token claims.
//!
//! The token is decoded without checking its signature. The claims are only
//! good for choosing what to display and for building card-service URLs;
//! every mutation is re-validated by the service that receives it.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::TuyoError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(rename = "userId", alias = "id", deserialize_with = "de_id")]
    pub user_id: i64,
    pub correo: String,
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|e| Utc.timestamp_opt(e, 0).single())
    }

    /// Tokens without an `exp` claim never expire client-side.
    pub fn is_expired(&self) -> bool {
        self.expires_at().is_some_and(|at| at <= Utc::now())
    }

    /// Name shown in the header: the `nombre` claim, else the mailbox part
    /// of the email.
    pub fn display_name(&self) -> &str {
        match self.nombre.as_deref() {
            Some(n) if !n.trim().is_empty() => n,
            _ => self.correo.split('@').next().unwrap_or(&self.correo),
        }
    }
}

/// Accepts the id as a JSON number or a numeric string.
fn de_id<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    match Value::deserialize(d)? {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| serde::de::Error::custom("userId out of range")),
        Value::String(s) => s.parse().map_err(serde::de::Error::custom),
        other => Err(serde::de::Error::custom(format!(
            "unexpected userId: {other}"
        ))),
    }
}

/// Decode the payload segment of a JWT-shaped token.
pub fn decode_claims(token: &str) -> Result<TokenClaims, TuyoError> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(p), Some(_), None) => p,
        _ => return Err(TuyoError::Token("token must have three segments".into())),
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| TuyoError::Token(format!("payload is not base64url: {e}")))?;

    serde_json::from_slice(&bytes).map_err(|e| TuyoError::Token(format!("bad claims: {e}")))
}
