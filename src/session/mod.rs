//! Session Management Module
//!
//! Sessions are entirely client-held: a signed token in a cookie, with no
//! server-side store.
//!
//! # Modules
//!
//! - [`token`] - token signing, encoding and verification
//! - [`cookie`] - session cookie construction and header helpers
//! - [`issuer`] - exchanges a verified challenge for a session

pub mod cookie;
pub mod issuer;
pub mod token;

// Re-export commonly used items for convenience
pub use cookie::{CookieFactory, CookieOptions, COOKIE_NAME};
pub use issuer::{IssueError, IssuedSession, SessionIssuer};
pub use token::{SessionToken, TokenError, TokenStatus};
