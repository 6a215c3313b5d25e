use actix_web::{HttpResponse, Result};

use super::types::HealthResponse;

/// Liveness probe. Gated like any other path; add `/ping` to
/// `rules.bypass_paths` for probes that carry no session.
///
/// # Errors
///
/// Never fails; the `Result` keeps the handler signature uniform
pub async fn health() -> Result<HttpResponse> {
    let response = HealthResponse {
        status: "ok".to_string(),
        message: "Wardgate is running".to_string(),
    };
    Ok(HttpResponse::Ok().json(response))
}
