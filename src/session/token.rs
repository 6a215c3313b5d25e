//! Signed session tokens
//!
//! A token is `{issuedAt, signature}` where the signature is the hex HMAC-SHA256
//! of the decimal `issuedAt` under the session secret. On the wire it is the
//! standard base64 of its JSON form.

use base64::{engine::general_purpose, Engine as _};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::crypto::{sign_hmac_sha256, verify_hmac_sha256};

/// Client-held proof of a completed human verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    /// Epoch milliseconds at which the token was minted
    #[serde(rename = "issuedAt", alias = "timestamp")]
    pub issued_at: i64,
    /// Lowercase hex HMAC-SHA256 of `issued_at`
    pub signature: String,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("session token is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("session token is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result of checking a session cookie value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    /// Signature matches; carries the token's `issuedAt`
    Valid { issued_at: i64 },
    /// A value was present but could not be decoded, was forged, or is too old
    Invalid,
    /// No session cookie at all
    Missing,
}

impl SessionToken {
    /// Mint a token for `issued_at` under `secret`
    #[must_use]
    pub fn mint(secret: &[u8], issued_at: i64) -> Self {
        Self {
            issued_at,
            signature: sign(secret, issued_at),
        }
    }

    /// Serialize to the cookie representation
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails
    pub fn encode(&self) -> Result<String, TokenError> {
        let json = serde_json::to_vec(self)?;
        Ok(general_purpose::STANDARD.encode(json))
    }

    /// Parse a cookie value back into a token. Does not check the signature.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not base64 or not the expected JSON shape
    pub fn decode(value: &str) -> Result<Self, TokenError> {
        let bytes = general_purpose::STANDARD.decode(value.trim())?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Constant-time signature check against `secret`
    #[must_use]
    pub fn has_valid_signature(&self, secret: &[u8]) -> bool {
        let Ok(signature) = hex::decode(&self.signature) else {
            return false;
        };
        verify_hmac_sha256(secret, self.issued_at.to_string().as_bytes(), &signature)
    }
}

/// Hex HMAC-SHA256 of the decimal timestamp
#[must_use]
pub fn sign(secret: &[u8], issued_at: i64) -> String {
    hex::encode(sign_hmac_sha256(secret, issued_at.to_string().as_bytes()))
}

/// Verify an optional cookie value.
///
/// `max_age` rejects tokens whose `issuedAt` is older than `now_ms - max_age`.
/// Tokens dated in the future are accepted; only the signature binds them.
#[must_use]
pub fn verify(
    value: Option<&str>,
    secret: &[u8],
    max_age: Option<Duration>,
    now_ms: i64,
) -> TokenStatus {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return TokenStatus::Missing;
    };

    let token = match SessionToken::decode(value) {
        Ok(token) => token,
        Err(e) => {
            log::debug!("Rejecting undecodable session token: {e}");
            return TokenStatus::Invalid;
        }
    };

    if !token.has_valid_signature(secret) {
        log::debug!("Rejecting session token with bad signature");
        return TokenStatus::Invalid;
    }

    if let Some(max_age) = max_age {
        if now_ms.saturating_sub(token.issued_at) > max_age.num_milliseconds() {
            log::debug!("Rejecting session token issued at {}", token.issued_at);
            return TokenStatus::Invalid;
        }
    }

    TokenStatus::Valid {
        issued_at: token.issued_at,
    }
}
