#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use actix_web::web;

/// Version of the wardgate application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod gate;
pub mod handlers;
pub mod request;
pub mod rules;
pub mod session;
pub mod settings;
pub mod state;
pub mod utils;
pub mod verification;

// Testing utilities - available for unit tests and integration tests with the testing feature
#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use gate::{edge_gate, origin_gate, EdgeGate, GateAction, OriginGate};
pub use handlers::{health, proxy_upstream, verify_session, UpstreamClient};
pub use request::RequestContext;
pub use rules::RuleSet;
pub use session::{SessionIssuer, SessionToken};
pub use settings::GateSettings;
pub use state::GateState;

/// Routes served by the gate itself. Everything else falls through to the
/// default service registered by the caller.
pub fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/verify-session", web::post().to(verify_session))
        .route("/ping", web::get().to(health));
}
