//! Admin credential checks.
//!
//! The store has a single admin whose password is configured as an Argon2
//! PHC string. Hashes are produced by `sib-cli hash-password`.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::AdminConfig;

/// Minimum length accepted when hashing a new admin password.
pub const MIN_PASSWORD_LENGTH: usize = 10;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong username or password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Password hashing failed or the new password was rejected.
    #[error("password hashing error: {0}")]
    PasswordHash(String),
}

/// Check a login attempt against the configured admin.
///
/// The password is always verified, even for an unknown username, so both
/// failures take the same time.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` if either value is wrong.
pub fn verify_admin(admin: &AdminConfig, username: &str, password: &str) -> Result<(), AuthError> {
    let password_ok = verify_password(password, admin.password_hash.expose_secret()).is_ok();
    let username_ok = username.trim() == admin.username;

    if password_ok && username_ok {
        Ok(())
    } else {
        Err(AuthError::InvalidCredentials)
    }
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if the password is too short or hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::PasswordHash(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
