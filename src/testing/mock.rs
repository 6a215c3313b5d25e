//! Mock objects and fake implementations for testing
//!
//! This module provides mock implementations of external dependencies
//! and services for isolated unit testing.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::verification::{HumanVerifier, VerificationOutcome, VerifierError};

#[derive(Debug, Clone)]
enum MockBehavior {
    Respond(VerificationOutcome),
    Fail,
}

/// Scriptable stand-in for the human-verification provider.
///
/// Clones share the same call log, so a test can keep one handle and give
/// another to the code under test.
#[derive(Debug, Clone)]
pub struct MockVerifier {
    behavior: MockBehavior,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockVerifier {
    fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Provider that accepts every token
    #[must_use]
    pub fn accepting() -> Self {
        Self::with_behavior(MockBehavior::Respond(VerificationOutcome::passed()))
    }

    /// Provider that rejects every token with the given diagnostic codes
    #[must_use]
    pub fn rejecting(codes: &[&str]) -> Self {
        Self::with_behavior(MockBehavior::Respond(VerificationOutcome::rejected(
            codes,
        )))
    }

    /// Provider that cannot be reached
    #[must_use]
    pub fn failing() -> Self {
        Self::with_behavior(MockBehavior::Fail)
    }

    /// Number of verification calls made so far
    ///
    /// # Panics
    ///
    /// Panics if the call log mutex is poisoned
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// `(token, client_ip)` of the most recent call
    ///
    /// # Panics
    ///
    /// Panics if the call log mutex is poisoned
    #[must_use]
    pub fn last_call(&self) -> Option<(String, String)> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl HumanVerifier for MockVerifier {
    async fn verify(&self, token: &str, client_ip: &str) -> Result<VerificationOutcome, VerifierError> {
        self.calls
            .lock()
            .unwrap()
            .push((token.to_string(), client_ip.to_string()));

        match &self.behavior {
            MockBehavior::Respond(outcome) => Ok(outcome.clone()),
            MockBehavior::Fail => Err(VerifierError::Transport(
                "connection refused".to_string(),
            )),
        }
    }
}
