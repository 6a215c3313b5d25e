// HTTP request handlers for the gate
pub mod health;
pub mod proxy_upstream;
pub mod types;
pub mod verify_session;

// Re-export the main handler functions
pub use health::health;
pub use proxy_upstream::{proxy_upstream, UpstreamClient};
pub use verify_session::verify_session;
