//! Domain models for the storefront API.
//!
//! Every type here is serialized with camelCase field names, which is what
//! the frontend sends and expects.

pub mod analytics;
pub mod catalog;
pub mod order;
pub mod session;
pub mod used_phone;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

pub use session::{CurrentAdmin, keys as session_keys};

/// Input failed validation before reaching the database.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Trim a required text field, rejecting empty values.
pub(crate) fn required_text(field: &str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError(format!("{field} is required")));
    }
    Ok(trimmed.to_owned())
}

/// Trim an optional text field; blank strings become `None`.
pub(crate) fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Distinguish an absent patch field (`None`) from an explicit `null`
/// (`Some(None)`).
pub(crate) fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
