//! Exchanges a human-verification assertion for a signed session cookie

use std::sync::Arc;

use actix_web::{cookie::Cookie, http::StatusCode, HttpResponse, ResponseError};
use chrono::Utc;
use thiserror::Error;

use super::cookie::CookieFactory;
use super::token::SessionToken;
use crate::utils::responses::ResponseBuilder;
use crate::verification::HumanVerifier;

#[derive(Debug, Error)]
pub enum IssueError {
    /// No challenge token in the request
    #[error("Missing token")]
    InvalidRequest,
    /// The provider rejected the token or could not be reached
    #[error("Verification failed")]
    VerificationFailed { codes: Vec<String> },
}

impl ResponseError for IssueError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::VerificationFailed { .. } => StatusCode::FORBIDDEN,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Self::InvalidRequest => ResponseBuilder::bad_request()
                .with_error_code("missing_token")
                .with_message(&self.to_string())
                .build(),
            Self::VerificationFailed { .. } => ResponseBuilder::forbidden()
                .with_error_code("verification_failed")
                .with_message(&self.to_string())
                .build(),
        }
    }
}

/// A freshly minted token and the cookie that carries it
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: SessionToken,
    pub cookie: Cookie<'static>,
}

/// Verifies challenge tokens and signs sessions.
///
/// Holds no per-visitor state; everything it issues lives in the client's
/// cookie jar.
#[derive(Clone)]
pub struct SessionIssuer {
    verifier: Arc<dyn HumanVerifier>,
    cookie_factory: CookieFactory,
    session_secret: Arc<[u8]>,
}

impl SessionIssuer {
    #[must_use]
    pub fn new(
        verifier: Arc<dyn HumanVerifier>,
        cookie_factory: CookieFactory,
        session_secret: &[u8],
    ) -> Self {
        Self {
            verifier,
            cookie_factory,
            session_secret: Arc::from(session_secret),
        }
    }

    /// Verify `token` with the provider and, on success, mint a session.
    ///
    /// # Errors
    ///
    /// - [`IssueError::InvalidRequest`] if the token is missing or empty
    /// - [`IssueError::VerificationFailed`] if the provider rejects the token
    ///   or the call to it fails
    pub async fn issue(
        &self,
        token: Option<&str>,
        client_ip: &str,
    ) -> Result<IssuedSession, IssueError> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(IssueError::InvalidRequest)?;

        let outcome = match self.verifier.verify(token, client_ip).await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("[verify-session] Verification provider error: {e}");
                return Err(IssueError::VerificationFailed {
                    codes: vec![e.code().to_string()],
                });
            }
        };

        if !outcome.success {
            log::error!(
                "[verify-session] Verification failed: {:?}",
                outcome.error_codes
            );
            return Err(IssueError::VerificationFailed {
                codes: outcome.error_codes,
            });
        }

        self.mint(Utc::now().timestamp_millis())
    }

    /// Sign a session for `issued_at` and wrap it in a cookie
    ///
    /// # Errors
    ///
    /// Returns [`IssueError::VerificationFailed`] if the token cannot be
    /// serialized, which only happens on a broken serializer
    pub fn mint(&self, issued_at: i64) -> Result<IssuedSession, IssueError> {
        let token = SessionToken::mint(&self.session_secret, issued_at);
        let cookie = self
            .cookie_factory
            .create_session_cookie(&token)
            .map_err(|e| {
                log::error!("[verify-session] Failed to encode session token: {e}");
                IssueError::VerificationFailed {
                    codes: vec!["encoding-error".to_string()],
                }
            })?;

        log::debug!("Issued session token at {issued_at}");
        Ok(IssuedSession { token, cookie })
    }
}
