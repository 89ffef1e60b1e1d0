//! Error types for Cloudinary uploads.

use thiserror::Error;

/// Errors that can occur while uploading an image.
#[derive(Debug, Error)]
pub enum CloudinaryError {
    /// Upload credentials are not configured.
    #[error("Cloudinary is not configured")]
    NotConfigured,

    /// The submitted data URL is not an acceptable image.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// The decoded image exceeds the size limit.
    #[error("image larger than {max_bytes} bytes")]
    TooLarge { max_bytes: usize },

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Cloudinary rejected the upload.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("parse error: {0}")]
    Parse(String),
}
