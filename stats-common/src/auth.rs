//! Administrator password hashing
//!
//! Passwords are stored as SHA-256 over `salt || password`, hex encoded, with
//! a random 16-byte salt per user.
//!
//! # Pure Functions
//!
//! This module contains ONLY pure functions. Session handling and HTTP
//! concerns live in the web service crate.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Salt length in bytes (hex encoded to twice this many characters)
pub const SALT_LEN: usize = 16;

/// Generate a random hex-encoded salt
pub fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    to_hex(&bytes)
}

/// Hash a password with the given salt
///
/// # Examples
///
/// ```
/// use stats_common::auth::hash_password;
///
/// let hash = hash_password("00ff", "hunter2");
/// assert_eq!(hash.len(), 64); // SHA-256 is 64 hex chars
/// assert_eq!(hash, hash_password("00ff", "hunter2"));
/// ```
pub fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Check a candidate password against a stored salt and hash
///
/// Comparison runs over the full length regardless of where the first
/// mismatch occurs.
pub fn verify_password(salt: &str, expected_hash: &str, candidate: &str) -> bool {
    let calculated = hash_password(salt, candidate);
    if calculated.len() != expected_hash.len() {
        return false;
    }

    calculated
        .bytes()
        .zip(expected_hash.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
