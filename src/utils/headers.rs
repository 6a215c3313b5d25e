//! HTTP header forwarding between the client and the upstream origin

use actix_web::{HttpRequest, HttpResponseBuilder};
use reqwest::RequestBuilder;

use crate::session::cookie::strip_session_cookie;

// ===============================
// HOP-BY-HOP HEADER DETECTION
// ===============================

/// Check if a header is a hop-by-hop header that should not be forwarded
///
/// Based on RFC 2616 Section 13.5.1
#[must_use]
pub fn is_hop_by_hop_header(name: &str) -> bool {
    matches!(
        name.to_lowercase().as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailers"
            | "transfer-encoding"
            | "upgrade"
    )
}

/// Headers the HTTP client or server recomputes for the new message
fn is_framing_header(name: &str) -> bool {
    matches!(name, "host" | "content-length")
}

// ===============================
// REQUEST HEADER FORWARDING
// ===============================

/// Copies client request headers onto the upstream request. Hop-by-hop
/// headers and the session cookie never leave the gate.
#[derive(Debug, Clone, Default)]
pub struct RequestHeaderProcessor;

impl RequestHeaderProcessor {
    #[must_use]
    pub fn for_proxy() -> Self {
        Self
    }

    /// Forward headers from an Actix `HttpRequest` to a reqwest `RequestBuilder`
    pub fn forward_request_headers(
        &self,
        req: &HttpRequest,
        mut request_builder: RequestBuilder,
    ) -> RequestBuilder {
        for (name, value) in req.headers() {
            let name_str = name.as_str().to_lowercase();

            if is_framing_header(&name_str) || is_hop_by_hop_header(&name_str) {
                continue;
            }

            let Ok(value_str) = value.to_str() else {
                continue;
            };

            if name_str == "cookie" {
                if let Some(filtered) = strip_session_cookie(value_str) {
                    request_builder = request_builder.header(name.as_str(), filtered);
                }
                continue;
            }

            request_builder = request_builder.header(name.as_str(), value_str);
        }

        request_builder
    }
}

// ===============================
// RESPONSE HEADER FORWARDING
// ===============================

/// Copies upstream response headers back to the client, minus hop-by-hop
/// and framing headers
#[derive(Debug, Clone, Default)]
pub struct ResponseHeaderProcessor;

impl ResponseHeaderProcessor {
    #[must_use]
    pub fn for_proxy() -> Self {
        Self
    }

    /// Forward headers from a reqwest Response to an Actix `HttpResponseBuilder`.
    /// Repeated headers such as `Set-Cookie` are kept.
    pub fn forward_response_headers(
        &self,
        upstream_response: &reqwest::Response,
        response_builder: &mut HttpResponseBuilder,
    ) {
        for (name, value) in upstream_response.headers() {
            let name_str = name.as_str().to_lowercase();

            if is_framing_header(&name_str) || is_hop_by_hop_header(&name_str) {
                continue;
            }

            if let Ok(value_str) = value.to_str() {
                response_builder.append_header((name.as_str(), value_str));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::cookie::COOKIE_NAME;
    use crate::testing::RequestBuilder;
    use reqwest::Client;

    #[test]
    fn test_hop_by_hop_headers() {
        assert!(is_hop_by_hop_header("connection"));
        assert!(is_hop_by_hop_header("Transfer-Encoding"));
        assert!(!is_hop_by_hop_header("content-type"));
        assert!(!is_hop_by_hop_header("authorization"));
    }

    #[test]
    fn test_session_cookie_is_not_forwarded() {
        let req = RequestBuilder::new()
            .uri("/dashboard")
            .header("Cookie", &format!("{COOKIE_NAME}=abc; theme=dark"))
            .header("Connection", "keep-alive")
            .header("Accept", "text/html")
            .build();

        let builder = RequestHeaderProcessor::for_proxy()
            .forward_request_headers(&req, Client::new().get("http://upstream.test/dashboard"));
        let request = builder.build().unwrap();
        let headers = request.headers();

        assert_eq!(headers.get("cookie").unwrap(), "theme=dark");
        assert!(headers.get("connection").is_none());
        assert_eq!(headers.get("accept").unwrap(), "text/html");
    }

    #[test]
    fn test_cookie_header_dropped_when_only_session_cookie() {
        let req = RequestBuilder::new()
            .header("Cookie", &format!("{COOKIE_NAME}=abc"))
            .build();

        let request = RequestHeaderProcessor::for_proxy()
            .forward_request_headers(&req, Client::new().get("http://upstream.test/"))
            .build()
            .unwrap();

        assert!(request.headers().get("cookie").is_none());
    }
}
