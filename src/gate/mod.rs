//! The two gating tiers
//!
//! - [`edge`] - stateless pre-filter: static/bypass exemptions, archiver
//!   blocking, challenge redirects
//! - [`origin`] - application-side archiver filter and header hardening
//! - [`middleware`] - `actix-web` middleware running both

pub mod edge;
pub mod middleware;
pub mod origin;

pub use edge::{EdgeGate, GateAction, SessionCheck, SessionCheckMode};
pub use origin::{HeaderPolicy, OriginDecision, OriginGate};
pub use middleware::{edge_gate, origin_gate};
