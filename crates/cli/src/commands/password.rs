//! Admin password hashing.
//!
//! # Usage
//!
//! ```bash
//! # Reads the password from stdin
//! echo -n 'a long passphrase' | sib-cli hash-password
//! ```
//!
//! Put the printed PHC string in `ADMIN_PASSWORD_HASH`.

use std::io::BufRead;

use thiserror::Error;

use sib_store_storefront::services::auth::{AuthError, hash_password};

/// Errors that can occur while hashing.
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("could not read password: {0}")]
    Io(#[from] std::io::Error),

    #[error("no password given")]
    Empty,

    #[error(transparent)]
    Hash(#[from] AuthError),
}

/// Hash a password given as an argument or as the first line of `input`.
///
/// # Errors
///
/// Returns `PasswordError` if nothing was given or the password is rejected.
pub fn hash(argument: Option<String>, input: impl BufRead) -> Result<String, PasswordError> {
    let password = match argument {
        Some(password) => password,
        None => input.lines().next().transpose()?.unwrap_or_default(),
    };
    let password = password.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(PasswordError::Empty);
    }
    Ok(hash_password(password)?)
}
