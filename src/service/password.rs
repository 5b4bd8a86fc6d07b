//! Argon2id password hashing and verification.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::password_hash::rand_core::OsRng;
use argon2::Argon2;

use crate::error::AppError;

/// Original registration rule: passwords shorter than this are rejected.
pub const MIN_PASSWORD_LEN: usize = 6;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

/// Constant-time verification against a stored PHC hash string.
/// A mismatch maps to `InvalidCredentials`; a malformed stored hash is
/// an internal error, never a user-facing one.
pub fn verify_password(candidate: &str, stored_hash: &str) -> Result<(), AppError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| AppError::Internal(format!("invalid stored password hash: {e}")))?;
    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .map_err(|err| match err {
            argon2::password_hash::Error::Password => AppError::InvalidCredentials,
            other => AppError::Internal(format!("password verification failed: {other}")),
        })
}
