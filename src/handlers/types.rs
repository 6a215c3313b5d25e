// Common types used across handlers
use serde::{Deserialize, Serialize};

/// Body of `POST /api/verify-session`.
///
/// Every field is optional so a body without a token reaches the issuer and
/// is refused there as a missing token.
#[derive(Debug, Default, Deserialize)]
pub struct VerifySessionRequest {
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifySessionResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}
