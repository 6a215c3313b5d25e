//! Origin gate: archiver filter and anti-indexing headers applied by the
//! application server itself, whether or not the edge gate ran.

use std::sync::Arc;

use actix_web::{
    http::header::{self, HeaderMap, HeaderName, HeaderValue},
    HttpResponse,
};
use serde::{Deserialize, Serialize};

use crate::request::RequestContext;
use crate::rules::RuleSet;
use crate::utils::responses::ResponseBuilder;

pub const ROBOTS_DIRECTIVE: &str = "noindex, noarchive, nosnippet, noimageindex";
pub const CACHE_CONTROL_DIRECTIVE: &str = "no-store, no-cache, must-revalidate, private";
pub const PRAGMA_DIRECTIVE: &str = "no-cache";

/// Which responses receive the hardening headers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderPolicy {
    /// Only responses that passed the archiver check; blocked 403s go out bare
    #[default]
    PassedOnly,
    /// Every response, including the archiver 403
    AllResponses,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginDecision {
    Proceed,
    Forbidden,
}

#[derive(Debug, Clone)]
pub struct OriginGate {
    rules: Arc<RuleSet>,
    header_policy: HeaderPolicy,
}

impl OriginGate {
    #[must_use]
    pub fn new(rules: Arc<RuleSet>, header_policy: HeaderPolicy) -> Self {
        Self {
            rules,
            header_policy,
        }
    }

    #[must_use]
    pub fn inspect(&self, ctx: &RequestContext) -> OriginDecision {
        if self.rules.is_archiver(ctx.user_agent()) {
            log::debug!("Origin refusing archiver on {}", ctx.path);
            OriginDecision::Forbidden
        } else {
            OriginDecision::Proceed
        }
    }

    /// The three anti-indexing and anti-caching headers
    #[must_use]
    pub fn hardening_headers() -> [(HeaderName, HeaderValue); 3] {
        [
            (
                HeaderName::from_static("x-robots-tag"),
                HeaderValue::from_static(ROBOTS_DIRECTIVE),
            ),
            (
                header::CACHE_CONTROL,
                HeaderValue::from_static(CACHE_CONTROL_DIRECTIVE),
            ),
            (header::PRAGMA, HeaderValue::from_static(PRAGMA_DIRECTIVE)),
        ]
    }

    /// Set the hardening headers, replacing any the application set
    pub fn apply_headers(headers: &mut HeaderMap) {
        for (name, value) in Self::hardening_headers() {
            headers.insert(name, value);
        }
    }

    /// 403 for a refused archiver, hardened only under
    /// [`HeaderPolicy::AllResponses`]
    #[must_use]
    pub fn forbidden_response(&self) -> HttpResponse {
        let mut response = ResponseBuilder::forbidden()
            .with_error_code("forbidden")
            .with_message("Access denied")
            .build();

        if self.header_policy == HeaderPolicy::AllResponses {
            Self::apply_headers(response.headers_mut());
        }
        response
    }
}
