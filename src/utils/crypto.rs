// Cryptographic helpers for session signing and secret generation

use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Size of generated session secrets (256 bits)
pub const SECRET_SIZE: usize = 32;

fn hmac_for(secret: &[u8]) -> HmacSha256 {
    match <HmacSha256 as Mac>::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC-SHA256 accepts keys of any length"),
    }
}

/// Compute HMAC-SHA256 of `message` under `secret`
#[must_use]
pub fn sign_hmac_sha256(secret: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac = hmac_for(secret);
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

/// Verify an HMAC-SHA256 tag in constant time
#[must_use]
pub fn verify_hmac_sha256(secret: &[u8], message: &[u8], tag: &[u8]) -> bool {
    let mut mac = hmac_for(secret);
    mac.update(message);
    mac.verify_slice(tag).is_ok()
}

/// Generate a cryptographically secure random secret, base64 encoded
///
/// 32 bytes of entropy from the thread-local CSPRNG
#[must_use]
pub fn generate_secret() -> String {
    let mut secret = [0u8; SECRET_SIZE];
    rand::rng().fill_bytes(&mut secret);
    general_purpose::STANDARD.encode(secret)
}
