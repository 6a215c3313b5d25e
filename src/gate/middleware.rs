//! `actix-web` adapters for the two gates
//!
//! Register with `middleware::from_fn`; the gates themselves are read from
//! app data. Wrap order matters: the edge gate must be the outer layer.

use actix_web::{
    body::{EitherBody, MessageBody},
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    web, Error,
};

use super::edge::EdgeGate;
use super::origin::{OriginDecision, OriginGate};
use crate::request::RequestContext;

/// Edge-tier middleware. Paths outside the intercept matcher skip it.
///
/// # Errors
///
/// Only propagates errors from inner services
pub async fn edge_gate<B: MessageBody + 'static>(
    gate: web::Data<EdgeGate>,
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, Error> {
    if !gate.rules().is_intercepted(req.path()) {
        return Ok(next.call(req).await?.map_into_left_body());
    }

    let ctx = RequestContext::from_request(req.request());
    match gate.gate(&ctx).into_response() {
        None => Ok(next.call(req).await?.map_into_left_body()),
        Some(response) => Ok(req.into_response(response).map_into_right_body()),
    }
}

/// Origin-tier middleware: refuse archivers, harden everything else
///
/// # Errors
///
/// Only propagates errors from inner services
pub async fn origin_gate<B: MessageBody + 'static>(
    gate: web::Data<OriginGate>,
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, Error> {
    let ctx = RequestContext::from_request(req.request());

    if gate.inspect(&ctx) == OriginDecision::Forbidden {
        return Ok(req
            .into_response(gate.forbidden_response())
            .map_into_right_body());
    }

    let mut response = next.call(req).await?;
    OriginGate::apply_headers(response.headers_mut());
    Ok(response.map_into_left_body())
}
