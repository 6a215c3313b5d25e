//! Human-verification provider seam
//!
//! The gate only needs one question answered: did this challenge token come
//! from a human? [`HumanVerifier`] is that question; [`TurnstileVerifier`]
//! answers it with Cloudflare Turnstile.

pub mod turnstile;

use async_trait::async_trait;
use thiserror::Error;

pub use turnstile::{TurnstileVerifier, TURNSTILE_VERIFY_URL};

/// Provider verdict for a single challenge token
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationOutcome {
    pub success: bool,
    /// Provider diagnostic codes, logged on failure
    pub error_codes: Vec<String>,
}

impl VerificationOutcome {
    #[must_use]
    pub fn passed() -> Self {
        Self {
            success: true,
            error_codes: Vec::new(),
        }
    }

    #[must_use]
    pub fn rejected(codes: &[&str]) -> Self {
        Self {
            success: false,
            error_codes: codes.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Failure to obtain a verdict at all
#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("verification request failed: {0}")]
    Transport(String),
    #[error("verification response could not be decoded: {0}")]
    Decode(String),
}

impl VerifierError {
    /// Short code logged alongside provider diagnostic codes
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport-error",
            Self::Decode(_) => "invalid-provider-response",
        }
    }
}

/// One outbound call per challenge; no retries
#[async_trait]
pub trait HumanVerifier: Send + Sync {
    /// Ask the provider whether `token` is a valid human-check assertion
    /// for the client at `client_ip` (may be empty).
    async fn verify(&self, token: &str, client_ip: &str) -> Result<VerificationOutcome, VerifierError>;
}
