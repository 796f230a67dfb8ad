//! bcrypt password hashing.
//!
//! bcrypt is CPU-bound, so both operations run on the blocking pool.

use secrecy::{ExposeSecret, SecretString};

use cartwheel_core::PasswordDigest;

use super::AuthError;

/// bcrypt cost factor for new digests.
pub const BCRYPT_COST: u32 = 10;

/// Hash a plaintext password.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if bcrypt fails or the task panics.
pub async fn hash_password(password: SecretString) -> Result<PasswordDigest, AuthError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password.expose_secret(), BCRYPT_COST))
        .await
        .map_err(|e| AuthError::PasswordHash(e.to_string()))?
        .map(PasswordDigest::new)
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

/// Verify a plaintext password against a digest.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if the digest is malformed.
pub async fn verify_password(password: &str, digest: &PasswordDigest) -> Result<bool, AuthError> {
    let password = password.to_owned();
    let digest = digest.as_str().to_owned();

    tokio::task::spawn_blocking(move || bcrypt::verify(password, &digest))
        .await
        .map_err(|e| AuthError::PasswordHash(e.to_string()))?
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}
