/// Password Hashing and Verification
///
/// Argon2id with a fresh random salt per hash. The output is a PHC string that
/// carries the algorithm, its parameters, the salt and the digest.

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use crate::error::HashingError;

/// Hash a password using Argon2id
///
/// # Errors
/// Returns error only if the hashing primitive itself fails
pub fn hash_password(password: &str) -> Result<String, HashingError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| HashingError(e.to_string()))
}

/// Verify a password against its hash
///
/// Returns `Ok(false)` on mismatch.
///
/// # Errors
/// Returns error if `hash` is not a well-formed PHC string
pub fn verify_password(password: &str, hash: &str) -> Result<bool, HashingError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| HashingError(format!("invalid hash: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(HashingError(e.to_string())),
    }
}
