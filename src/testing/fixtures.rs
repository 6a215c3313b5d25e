//! Test fixtures providing pre-built gates, issuers and settings

use std::sync::Arc;

use crate::gate::{EdgeGate, HeaderPolicy, OriginGate, SessionCheck};
use crate::rules::RuleSet;
use crate::session::{CookieFactory, SessionIssuer};
use crate::settings::GateSettings;

use super::constants::TEST_SESSION_SECRET;
use super::mock::MockVerifier;

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// Default rule set, shared the way the server shares it
    #[must_use]
    pub fn rules() -> Arc<RuleSet> {
        Arc::new(RuleSet::default())
    }

    /// Edge gate with default rules and presence-only session checks
    #[must_use]
    pub fn edge_gate() -> EdgeGate {
        EdgeGate::new(Self::rules(), SessionCheck::Presence)
    }

    /// Origin gate with default rules and the given header policy
    #[must_use]
    pub fn origin_gate(policy: HeaderPolicy) -> OriginGate {
        OriginGate::new(Self::rules(), policy)
    }

    /// Issuer signing with [`TEST_SESSION_SECRET`] and secure 24h cookies
    #[must_use]
    pub fn session_issuer(verifier: MockVerifier) -> SessionIssuer {
        SessionIssuer::new(
            Arc::new(verifier),
            CookieFactory::new(true, 24),
            TEST_SESSION_SECRET,
        )
    }

    /// Settings pointing at a local upstream with the test secret
    #[must_use]
    pub fn settings() -> GateSettings {
        let mut settings = GateSettings::default();
        settings.session.session_secret =
            String::from_utf8_lossy(TEST_SESSION_SECRET).into_owned();
        settings.verification.secret_key = "test-turnstile-secret".to_string();
        settings.proxy.upstream_url = "http://127.0.0.1:9".to_string();
        settings
    }
}
