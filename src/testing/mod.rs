//! Testing utilities for wardgate
//!
//! ## Organization
//!
//! - [`fixtures`] - Pre-built gates, issuers and settings
//! - [`requests`] - HTTP request builders for testing middleware and handlers
//! - [`mock`] - Scriptable verification provider
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wardgate::testing::{mock::MockVerifier, TestFixtures};
//!
//! let verifier = MockVerifier::accepting();
//! let issuer = TestFixtures::session_issuer(verifier.clone());
//! let session = issuer.mint(1_700_000_000_000).unwrap();
//! assert_eq!(verifier.call_count(), 0);
//! assert_eq!(session.token.issued_at, 1_700_000_000_000);
//! ```

pub mod fixtures;
pub mod mock;
pub mod requests;

// Re-export commonly used items for convenience
pub use fixtures::TestFixtures;
pub use mock::MockVerifier;
pub use requests::RequestBuilder;

/// Common test constants
pub mod constants {
    /// Session signing secret used across tests
    pub const TEST_SESSION_SECRET: &[u8] = b"test_session_secret_32_bytes_lng";

    /// Default test user agent string
    pub const TEST_USER_AGENT: &str =
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

    /// A user agent every default rule set blocks
    pub const ARCHIVER_USER_AGENT: &str = "curl/7.68.0";
}
