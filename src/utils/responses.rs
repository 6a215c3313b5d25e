//! HTTP response handling
//!
//! One place to build the gate's JSON error bodies and redirects, so every
//! refusal carries the same `{"error", "message"}` shape.

use actix_web::{cookie::Cookie, http::header, http::StatusCode, HttpResponse};
use serde_json::json;

// ===============================
// CACHED RESPONSES FOR PERFORMANCE
// ===============================

/// Global instance of pre-serialized common responses
static CACHED_RESPONSES: std::sync::LazyLock<CachedResponses> =
    std::sync::LazyLock::new(CachedResponses::new);

/// Pre-serialized bodies for the uncustomized error responses
struct CachedResponses {
    invalid_request: String,
    forbidden: String,
    bad_gateway: String,
}

impl CachedResponses {
    fn new() -> Self {
        Self {
            invalid_request: Self::create_json(&ErrorType::BadRequest),
            forbidden: Self::create_json(&ErrorType::Forbidden),
            bad_gateway: Self::create_json(&ErrorType::BadGateway),
        }
    }

    fn create_json(error_type: &ErrorType) -> String {
        json!({
            "error": error_type.default_error_code(),
            "message": error_type.default_message(),
        })
        .to_string()
    }

    fn get(&self, error_type: &ErrorType) -> HttpResponse {
        let body = match error_type {
            ErrorType::BadRequest => &self.invalid_request,
            ErrorType::Forbidden => &self.forbidden,
            ErrorType::BadGateway => &self.bad_gateway,
        };
        HttpResponse::build(error_type.status())
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .body(body.clone())
    }
}

/// Unified response builder
pub struct ResponseBuilder;

impl ResponseBuilder {
    /// `BadRequest` (400)
    #[must_use]
    pub fn bad_request() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::BadRequest)
    }

    /// `Forbidden` (403)
    #[must_use]
    pub fn forbidden() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::Forbidden)
    }

    /// `BadGateway` (502)
    #[must_use]
    pub fn bad_gateway() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::BadGateway)
    }

    /// 302 Found redirect
    #[must_use]
    pub fn redirect(location: &str) -> RedirectBuilder {
        RedirectBuilder::new(location)
    }

    /// 200 OK with JSON content
    #[must_use]
    pub fn ok() -> JsonResponseBuilder {
        JsonResponseBuilder::new()
    }
}

// ===============================
// BUILDER TYPES
// ===============================

/// Builder for error responses with fluent interface
pub struct ErrorResponseBuilder {
    error_type: ErrorType,
    error_code: Option<String>,
    message: Option<String>,
}

/// Builder for redirect responses
pub struct RedirectBuilder {
    location: String,
}

/// Builder for JSON success responses
pub struct JsonResponseBuilder {
    cookies: Vec<Cookie<'static>>,
}

#[derive(Clone)]
enum ErrorType {
    BadRequest,
    Forbidden,
    BadGateway,
}

impl ErrorType {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::BadGateway => StatusCode::BAD_GATEWAY,
        }
    }

    fn default_error_code(&self) -> &'static str {
        match self {
            Self::BadRequest => "invalid_request",
            Self::Forbidden => "forbidden",
            Self::BadGateway => "bad_gateway",
        }
    }

    fn default_message(&self) -> &'static str {
        match self {
            Self::BadRequest => "The request is malformed or invalid",
            Self::Forbidden => "Access denied",
            Self::BadGateway => "Failed to connect to upstream server",
        }
    }
}

impl ErrorResponseBuilder {
    fn new(error_type: ErrorType) -> Self {
        Self {
            error_type,
            error_code: None,
            message: None,
        }
    }

    /// Set a custom error code (e.g., "`missing_token`")
    #[must_use]
    pub fn with_error_code(mut self, code: &str) -> Self {
        self.error_code = Some(code.to_string());
        self
    }

    /// Set a custom error message
    #[must_use]
    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }

    /// Build the final `HttpResponse`
    #[must_use]
    pub fn build(self) -> HttpResponse {
        if self.error_code.is_none() && self.message.is_none() {
            return CACHED_RESPONSES.get(&self.error_type);
        }

        let json_body = json!({
            "error": self.error_code.as_deref().unwrap_or(self.error_type.default_error_code()),
            "message": self.message.as_deref().unwrap_or(self.error_type.default_message()),
        });

        HttpResponse::build(self.error_type.status())
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .json(json_body)
    }
}

impl RedirectBuilder {
    fn new(location: &str) -> Self {
        Self {
            location: location.to_string(),
        }
    }

    /// Build the final redirect response
    #[must_use]
    pub fn build(self) -> HttpResponse {
        HttpResponse::Found()
            .append_header((header::LOCATION, self.location))
            .finish()
    }
}

impl JsonResponseBuilder {
    fn new() -> Self {
        Self {
            cookies: Vec::new(),
        }
    }

    /// Attach a Set-Cookie to the response
    #[must_use]
    pub fn with_cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Build the response with JSON content
    #[must_use]
    pub fn json<T: serde::Serialize>(self, data: &T) -> HttpResponse {
        let mut builder = HttpResponse::Ok();

        for cookie in self.cookies {
            builder.cookie(cookie);
        }

        builder.json(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use serde_json::Value;

    async fn body_json(response: HttpResponse) -> Value {
        let bytes = to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[actix_web::test]
    async fn test_cached_error_responses() {
        let response = ResponseBuilder::bad_request().build();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "invalid_request");

        let response = ResponseBuilder::forbidden().build();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["message"], "Access denied");

        let response = ResponseBuilder::bad_gateway().build();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[actix_web::test]
    async fn test_custom_error_responses() {
        let response = ResponseBuilder::bad_request()
            .with_error_code("missing_token")
            .with_message("Missing token")
            .build();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "missing_token");
        assert_eq!(body["message"], "Missing token");
    }

    #[test]
    fn test_redirect_builder() {
        let response = ResponseBuilder::redirect("/challenge?redirect=%2F").build();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/challenge?redirect=%2F"
        );
        assert_eq!(response.cookies().count(), 0);
    }

    #[actix_web::test]
    async fn test_json_response_with_cookie() {
        let response = ResponseBuilder::ok()
            .with_cookie(Cookie::new("session", "value"))
            .json(&json!({"success": true}));

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.cookies().count(), 1);
        assert_eq!(body_json(response).await["success"], true);
    }
}
