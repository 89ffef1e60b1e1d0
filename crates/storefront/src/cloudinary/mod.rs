//! Cloudinary signed uploads for product and used-phone images.
//!
//! Images arrive from the admin panel as base64 data URLs. They are checked
//! locally (MIME type, encoding, size) and forwarded to Cloudinary's upload
//! API with a SHA-256 request signature.

mod client;
mod data_url;
mod error;

pub use client::{CloudinaryClient, UploadedImage};
pub use data_url::{ImageDataUrl, MAX_IMAGE_BYTES};
pub use error::CloudinaryError;
