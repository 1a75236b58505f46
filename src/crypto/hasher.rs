//! One-way secret hashing.
//!
//! Argon2id with a random per-hash salt. Output is non-deterministic; use
//! [`verify_secret`] rather than re-hashing and comparing.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::AuthError;

/// Inputs larger than this are rejected before touching the KDF.
pub const MAX_SECRET_LEN: usize = 4096;

/// Hash a secret into a PHC-format string for storage.
///
/// # Errors
/// Returns [`AuthError::Hashing`] on oversized input or a hashing backend
/// failure. Callers must treat this as fatal for the operation.
pub fn hash_secret(secret: &[u8]) -> Result<String, AuthError> {
    if secret.len() > MAX_SECRET_LEN {
        return Err(AuthError::Hashing(format!(
            "secret exceeds {MAX_SECRET_LEN} bytes"
        )));
    }

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(secret, &salt)
        .map_err(|err| AuthError::Hashing(err.to_string()))?;

    Ok(hash.to_string())
}

/// Verify a candidate secret against a stored PHC-format hash.
///
/// Returns `false` on mismatch or a malformed stored hash; never errors.
#[must_use]
pub fn verify_secret(candidate: &[u8], stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default().verify_password(candidate, &parsed).is_ok()
}
