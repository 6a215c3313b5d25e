//! Read-only view of an inbound request, as seen by the gates

use actix_web::{http::header, HttpRequest};

/// The parts of a request the gates care about.
///
/// Headers that are absent or not valid UTF-8 are stored as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub method: String,
    pub path: String,
    pub query: String,
    pub user_agent: Option<String>,
    pub cookie: Option<String>,
    pub forwarded_for: Option<String>,
}

impl RequestContext {
    #[must_use]
    pub fn from_request(req: &HttpRequest) -> Self {
        let headers = req.headers();
        let header_value = |name: &header::HeaderName| {
            headers
                .get(name)
                .and_then(|h| h.to_str().ok())
                .map(ToString::to_string)
        };

        Self {
            method: req.method().as_str().to_string(),
            path: req.path().to_string(),
            query: req.query_string().to_string(),
            user_agent: header_value(&header::USER_AGENT),
            cookie: header_value(&header::COOKIE),
            forwarded_for: header_value(&header::HeaderName::from_static("x-forwarded-for")),
        }
    }

    /// User agent, or the empty string when absent
    #[must_use]
    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or("")
    }

    /// Path plus `?query` when a query string is present
    #[must_use]
    pub fn path_and_query(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query)
        }
    }

    /// First address in `X-Forwarded-For`, or the empty string.
    ///
    /// Only the originating client is returned, not the raw header with the
    /// proxy chain appended, so the provider sees a single IP.
    #[must_use]
    pub fn client_ip(&self) -> &str {
        self.forwarded_for
            .as_deref()
            .and_then(|value| value.split(',').next())
            .map_or("", str::trim)
    }
}
