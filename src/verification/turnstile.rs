use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{HumanVerifier, VerificationOutcome, VerifierError};
use crate::settings::VerificationSettings;

pub const TURNSTILE_VERIFY_URL: &str = "https://challenges.cloudflare.com/turnstile/v0/siteverify";

/// Raw `siteverify` response body
#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(rename = "error-codes", default)]
    error_codes: Vec<String>,
}

/// Cloudflare Turnstile `siteverify` client
#[derive(Debug, Clone)]
pub struct TurnstileVerifier {
    client: Client,
    secret_key: String,
    verify_url: String,
}

impl TurnstileVerifier {
    #[must_use]
    pub fn new(client: Client, secret_key: String, verify_url: String) -> Self {
        Self {
            client,
            secret_key,
            verify_url,
        }
    }

    /// Build a verifier with its own client, bounded by the configured timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed
    pub fn from_settings(settings: &VerificationSettings) -> Result<Self, VerifierError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(|e| VerifierError::Transport(e.to_string()))?;

        Ok(Self::new(
            client,
            settings.secret_key.clone(),
            settings.verify_url.clone(),
        ))
    }
}

#[async_trait]
impl HumanVerifier for TurnstileVerifier {
    async fn verify(&self, token: &str, client_ip: &str) -> Result<VerificationOutcome, VerifierError> {
        let form = [
            ("secret", self.secret_key.as_str()),
            ("response", token),
            ("remoteip", client_ip),
        ];

        let response = self
            .client
            .post(&self.verify_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| VerifierError::Transport(e.to_string()))?;

        let body: SiteVerifyResponse = response
            .json()
            .await
            .map_err(|e| VerifierError::Decode(e.to_string()))?;

        Ok(VerificationOutcome {
            success: body.success,
            error_codes: body.error_codes,
        })
    }
}
