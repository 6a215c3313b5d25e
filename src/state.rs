//! Shared per-process state, built once from settings and cloned into every
//! actix worker.

use std::sync::Arc;

use actix_web::web;

use crate::gate::{EdgeGate, OriginGate};
use crate::rules::RuleSet;
use crate::session::{CookieFactory, SessionIssuer};
use crate::settings::GateSettings;
use crate::verification::HumanVerifier;

/// App data registered by the server: both gates and the session issuer.
///
/// Both gates hold the same [`RuleSet`].
#[derive(Clone)]
pub struct GateState {
    pub edge: web::Data<EdgeGate>,
    pub origin: web::Data<OriginGate>,
    pub issuer: web::Data<SessionIssuer>,
}

impl GateState {
    #[must_use]
    pub fn from_settings(settings: &GateSettings, verifier: Arc<dyn HumanVerifier>) -> Self {
        let rules = Arc::new(RuleSet::from_settings(&settings.rules));

        let edge = EdgeGate::new(Arc::clone(&rules), settings.session_check());
        let origin = OriginGate::new(rules, settings.origin.header_policy);
        let issuer = SessionIssuer::new(
            verifier,
            CookieFactory::new(settings.cookies.secure, settings.session.cookie_max_age_hours),
            settings.session.session_secret.as_bytes(),
        );

        Self {
            edge: web::Data::new(edge),
            origin: web::Data::new(origin),
            issuer: web::Data::new(issuer),
        }
    }
}
