use actix_web::{web, HttpRequest, HttpResponse, ResponseError};

use super::types::{VerifySessionRequest, VerifySessionResponse};
use crate::request::RequestContext;
use crate::session::{IssueError, SessionIssuer};
use crate::utils::responses::ResponseBuilder;

/// `POST /api/verify-session`: trade a challenge token for a session cookie.
///
/// The body is parsed by hand so that malformed JSON gets the gate's own
/// 400 body instead of the framework default.
pub async fn verify_session(
    req: HttpRequest,
    body: web::Bytes,
    issuer: web::Data<SessionIssuer>,
) -> HttpResponse {
    let payload = match parse_body(&body) {
        Ok(payload) => payload,
        Err(e) => {
            log::debug!("[verify-session] Rejecting malformed body: {e}");
            return IssueError::InvalidRequest.error_response();
        }
    };

    let ctx = RequestContext::from_request(&req);
    match issuer.issue(payload.token.as_deref(), ctx.client_ip()).await {
        Ok(session) => ResponseBuilder::ok()
            .with_cookie(session.cookie)
            .json(&VerifySessionResponse { success: true }),
        Err(e) => e.error_response(),
    }
}

/// An empty body is treated as `{}`
fn parse_body(body: &[u8]) -> Result<VerifySessionRequest, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(VerifySessionRequest::default());
    }
    serde_json::from_slice(body)
}
