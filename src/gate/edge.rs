//! Edge gate: the stateless pre-filter run for every intercepted request
//!
//! Precedence, first match wins:
//!
//! 1. static extension → continue
//! 2. bypass path prefix → continue
//! 3. archiver user agent → block with 403
//! 4. no session → 302 to the challenge, remembering where the visitor was going
//! 5. otherwise → continue

use std::sync::Arc;

use actix_web::{http::StatusCode, HttpResponse};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::request::RequestContext;
use crate::rules::RuleSet;
use crate::session::cookie::{has_session_cookie, session_cookie_value};
use crate::session::token::{verify, TokenStatus};
use crate::utils::responses::ResponseBuilder;

/// What the edge decided to do with a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateAction {
    Continue,
    Block(StatusCode),
    Redirect(String),
}

impl GateAction {
    /// The short-circuit response, or `None` when the request continues
    #[must_use]
    pub fn into_response(self) -> Option<HttpResponse> {
        match self {
            Self::Continue => None,
            Self::Block(status) => Some(
                HttpResponse::build(status)
                    .content_type("text/plain; charset=utf-8")
                    .body("Access Denied"),
            ),
            Self::Redirect(location) => Some(ResponseBuilder::redirect(&location).build()),
        }
    }
}

/// How strongly the edge checks the session cookie
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionCheckMode {
    /// Any `__session_validated=` in the cookie header passes
    #[default]
    Presence,
    /// The cookie must carry a token signed with the session secret
    Signed,
}

/// Session check with whatever it needs to run
#[derive(Debug, Clone)]
pub enum SessionCheck {
    Presence,
    Signed {
        secret: Arc<[u8]>,
        max_age: Option<Duration>,
    },
}

#[derive(Debug, Clone)]
pub struct EdgeGate {
    rules: Arc<RuleSet>,
    session_check: SessionCheck,
}

impl EdgeGate {
    #[must_use]
    pub fn new(rules: Arc<RuleSet>, session_check: SessionCheck) -> Self {
        Self {
            rules,
            session_check,
        }
    }

    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Decide the fate of a request
    #[must_use]
    pub fn gate(&self, ctx: &RequestContext) -> GateAction {
        self.gate_at(ctx, Utc::now().timestamp_millis())
    }

    /// [`EdgeGate::gate`] with an explicit clock, for token age checks
    #[must_use]
    pub fn gate_at(&self, ctx: &RequestContext, now_ms: i64) -> GateAction {
        if self.rules.is_static_asset(&ctx.path) {
            return GateAction::Continue;
        }

        if self.rules.is_bypass_path(&ctx.path) {
            return GateAction::Continue;
        }

        if self.rules.is_archiver(ctx.user_agent()) {
            log::debug!("Blocking archiver on {}", ctx.path);
            return GateAction::Block(StatusCode::FORBIDDEN);
        }

        if !self.has_session(ctx, now_ms) {
            let location = self.challenge_location(ctx);
            log::debug!("No session for {}, redirecting to {location}", ctx.path);
            return GateAction::Redirect(location);
        }

        GateAction::Continue
    }

    /// Challenge URL carrying the original path and query as `redirect`
    #[must_use]
    pub fn challenge_location(&self, ctx: &RequestContext) -> String {
        format!(
            "{}?redirect={}",
            self.rules.challenge_path(),
            urlencoding::encode(&ctx.path_and_query())
        )
    }

    fn has_session(&self, ctx: &RequestContext, now_ms: i64) -> bool {
        match &self.session_check {
            SessionCheck::Presence => has_session_cookie(ctx.cookie.as_deref()),
            SessionCheck::Signed { secret, max_age } => matches!(
                verify(
                    session_cookie_value(ctx.cookie.as_deref()),
                    secret,
                    *max_age,
                    now_ms
                ),
                TokenStatus::Valid { .. }
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::cookie::COOKIE_NAME;
    use crate::session::token::SessionToken;
    use crate::testing::constants::{TEST_SESSION_SECRET, TEST_USER_AGENT};
    use crate::testing::fixtures::TestFixtures;

    const NOW: i64 = 1_700_000_000_000;

    fn ctx(path: &str, query: &str, ua: Option<&str>, cookie: Option<&str>) -> RequestContext {
        RequestContext {
            method: "GET".to_string(),
            path: path.to_string(),
            query: query.to_string(),
            user_agent: ua.map(ToString::to_string),
            cookie: cookie.map(ToString::to_string),
            forwarded_for: None,
        }
    }

    fn signed_gate(max_age: Option<Duration>) -> EdgeGate {
        EdgeGate::new(
            Arc::new(RuleSet::default()),
            SessionCheck::Signed {
                secret: Arc::from(TEST_SESSION_SECRET),
                max_age,
            },
        )
    }

    #[test]
    fn test_static_asset_continues_regardless_of_headers() {
        // Scenario A plus an archiver on a static asset
        let gate = TestFixtures::edge_gate();
        assert_eq!(
            gate.gate(&ctx("/app/page.png", "", Some("UnknownAgent/1.0"), None)),
            GateAction::Continue
        );
        assert_eq!(
            gate.gate(&ctx("/app/site.css", "", Some("curl/7.68.0"), None)),
            GateAction::Continue
        );
    }

    #[test]
    fn test_bypass_paths_continue_regardless_of_headers() {
        let gate = TestFixtures::edge_gate();
        for path in ["/challenge", "/api/verify-session", "/robots.txt", "/__nuxt_error"] {
            assert_eq!(
                gate.gate(&ctx(path, "", Some("python-requests/2.31"), None)),
                GateAction::Continue,
                "{path} should bypass"
            );
        }
    }

    #[test]
    fn test_archiver_is_blocked() {
        // Scenario B
        let gate = TestFixtures::edge_gate();
        assert_eq!(
            gate.gate(&ctx("/dashboard", "", Some("curl/7.68.0"), None)),
            GateAction::Block(StatusCode::FORBIDDEN)
        );
        // Blocked even with a session cookie
        let cookie = format!("{COOKIE_NAME}=abc");
        assert_eq!(
            gate.gate(&ctx("/dashboard", "", Some("Wget/1.21"), Some(&cookie))),
            GateAction::Block(StatusCode::FORBIDDEN)
        );
    }

    #[test]
    fn test_missing_session_redirects_to_challenge() {
        // Scenario C
        let gate = TestFixtures::edge_gate();
        assert_eq!(
            gate.gate(&ctx("/dashboard", "", Some("Mozilla/5.0"), None)),
            GateAction::Redirect("/challenge?redirect=%2Fdashboard".to_string())
        );
    }

    #[test]
    fn test_redirect_preserves_query_string() {
        let gate = TestFixtures::edge_gate();
        assert_eq!(
            gate.gate(&ctx("/search", "q=a b&page=2", Some(TEST_USER_AGENT), None)),
            GateAction::Redirect(
                "/challenge?redirect=%2Fsearch%3Fq%3Da%20b%26page%3D2".to_string()
            )
        );
    }

    #[test]
    fn test_absent_user_agent_is_not_an_archiver() {
        let gate = TestFixtures::edge_gate();
        assert_eq!(
            gate.gate(&ctx("/dashboard", "", None, None)),
            GateAction::Redirect("/challenge?redirect=%2Fdashboard".to_string())
        );
    }

    #[test]
    fn test_presence_mode_trusts_any_cookie_value() {
        // Scenario F: a never-issued value still passes the presence check
        let gate = TestFixtures::edge_gate();
        let cookie = format!("theme=dark; {COOKIE_NAME}=eyJpc3N1ZWRBdCI6MX0=");
        assert_eq!(
            gate.gate(&ctx("/dashboard", "", Some("Mozilla/5.0"), Some(&cookie))),
            GateAction::Continue
        );
    }

    #[test]
    fn test_malformed_cookie_header_means_no_session() {
        let gate = TestFixtures::edge_gate();
        let action = gate.gate(&ctx("/dashboard", "", Some("Mozilla/5.0"), Some(";;==;")));
        assert!(matches!(action, GateAction::Redirect(_)));
    }

    #[test]
    fn test_signed_mode_rejects_forged_cookie() {
        let gate = signed_gate(None);
        let forged = SessionToken::mint(b"not-the-secret", NOW).encode().unwrap();
        let cookie = format!("{COOKIE_NAME}={forged}");

        assert!(matches!(
            gate.gate_at(&ctx("/dashboard", "", Some("Mozilla/5.0"), Some(&cookie)), NOW),
            GateAction::Redirect(_)
        ));
    }

    #[test]
    fn test_signed_mode_accepts_minted_cookie() {
        let gate = signed_gate(None);
        let value = SessionToken::mint(TEST_SESSION_SECRET, NOW).encode().unwrap();
        let cookie = format!("{COOKIE_NAME}={value}");

        assert_eq!(
            gate.gate_at(&ctx("/dashboard", "", Some("Mozilla/5.0"), Some(&cookie)), NOW),
            GateAction::Continue
        );
    }

    #[test]
    fn test_signed_mode_enforces_max_age() {
        let gate = signed_gate(Some(Duration::hours(24)));
        let value = SessionToken::mint(TEST_SESSION_SECRET, NOW).encode().unwrap();
        let cookie = format!("{COOKIE_NAME}={value}");
        let request = ctx("/dashboard", "", Some("Mozilla/5.0"), Some(&cookie));

        assert_eq!(gate.gate_at(&request, NOW + 1_000), GateAction::Continue);
        assert!(matches!(
            gate.gate_at(&request, NOW + Duration::hours(25).num_milliseconds()),
            GateAction::Redirect(_)
        ));
    }

    #[test]
    fn test_block_and_redirect_responses() {
        let blocked = GateAction::Block(StatusCode::FORBIDDEN)
            .into_response()
            .unwrap();
        assert_eq!(blocked.status(), StatusCode::FORBIDDEN);

        let redirect = GateAction::Redirect("/challenge?redirect=%2F".to_string())
            .into_response()
            .unwrap();
        assert_eq!(redirect.status(), StatusCode::FOUND);
        assert_eq!(
            redirect.headers().get("location").unwrap(),
            "/challenge?redirect=%2F"
        );

        assert!(GateAction::Continue.into_response().is_none());
    }
}
