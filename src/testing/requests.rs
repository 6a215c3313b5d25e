//! HTTP request builders for testing gates and handlers

use actix_web::http::Method;
use actix_web::{test, HttpRequest};
use serde_json::Value;

use super::constants::{ARCHIVER_USER_AGENT, TEST_USER_AGENT};
use crate::session::cookie::COOKIE_NAME;

/// Builder for creating HTTP requests for testing
pub struct RequestBuilder {
    method: Method,
    uri: String,
    headers: Vec<(String, String)>,
    body: Option<Value>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    /// Create a new request builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            method: Method::GET,
            uri: "/".to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Set the HTTP method
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set the request URI
    #[must_use]
    pub fn uri(mut self, uri: &str) -> Self {
        self.uri = uri.to_string();
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Set the User-Agent header
    #[must_use]
    pub fn user_agent(self, user_agent: &str) -> Self {
        self.header("User-Agent", user_agent)
    }

    /// Set common browser headers
    #[must_use]
    pub fn browser_headers(self) -> Self {
        self.user_agent(TEST_USER_AGENT)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.5")
    }

    /// Attach a raw session cookie value
    #[must_use]
    pub fn with_session_cookie(self, session_value: &str) -> Self {
        self.header("Cookie", &format!("{COOKIE_NAME}={session_value}"))
    }

    /// Set client IP as a proxy in front of the gate would
    #[must_use]
    pub fn with_client_ip(self, ip: &str) -> Self {
        self.header("X-Forwarded-For", ip)
    }

    /// Set JSON body
    #[must_use]
    pub fn json_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Build a `TestRequest` for use with `actix_web::test::call_service`
    #[must_use]
    pub fn to_test_request(self) -> test::TestRequest {
        let mut req = test::TestRequest::default()
            .method(self.method)
            .uri(&self.uri);

        for (name, value) in self.headers {
            req = req.insert_header((name, value));
        }

        if let Some(body) = self.body {
            req = req.set_json(body);
        }

        req
    }

    /// Build the final `HttpRequest`
    #[must_use]
    pub fn build(self) -> HttpRequest {
        self.to_test_request().to_http_request()
    }
}

/// Quick builder functions for common request types
impl RequestBuilder {
    /// Browser-like GET without a session
    #[must_use]
    pub fn browser(uri: &str) -> Self {
        Self::new().uri(uri).browser_headers()
    }

    /// Browser-like GET carrying a session cookie
    #[must_use]
    pub fn verified_browser(uri: &str, session_value: &str) -> Self {
        Self::browser(uri).with_session_cookie(session_value)
    }

    /// GET from a known command-line archiver
    #[must_use]
    pub fn archiver(uri: &str) -> Self {
        Self::new().uri(uri).user_agent(ARCHIVER_USER_AGENT)
    }

    /// POST to the verification endpoint with a JSON body
    #[must_use]
    pub fn verify_session(body: Value) -> Self {
        Self::new()
            .method(Method::POST)
            .uri("/api/verify-session")
            .user_agent(TEST_USER_AGENT)
            .json_body(body)
    }
}
