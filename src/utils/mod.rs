pub mod crypto;
pub mod headers;
pub mod responses;
