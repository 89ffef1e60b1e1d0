//! Validation of `data:image/...;base64,` URLs.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::CloudinaryError;

/// Largest accepted decoded image (10 MiB).
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

const ALLOWED_TYPES: &[&str] = &["jpeg", "jpg", "png", "webp", "gif", "heic", "avif"];

/// A data URL that holds a decodable image within the size limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDataUrl {
    raw: String,
    mime_type: String,
    decoded_len: usize,
}

impl ImageDataUrl {
    /// Validate a data URL.
    ///
    /// ```
    /// use sib_store_storefront::cloudinary::ImageDataUrl;
    ///
    /// let image = ImageDataUrl::parse("data:image/png;base64,iVBORw0KGgo=").unwrap();
    /// assert_eq!(image.mime_type(), "image/png");
    /// assert!(ImageDataUrl::parse("data:text/plain;base64,aGk=").is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `CloudinaryError::InvalidImage` for anything that is not a
    /// base64 image data URL, and `CloudinaryError::TooLarge` when the decoded
    /// payload exceeds [`MAX_IMAGE_BYTES`].
    pub fn parse(input: &str) -> Result<Self, CloudinaryError> {
        let input = input.trim();
        let rest = input
            .strip_prefix("data:")
            .ok_or_else(|| CloudinaryError::InvalidImage("expected a data URL".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| CloudinaryError::InvalidImage("missing data".to_string()))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| CloudinaryError::InvalidImage("data must be base64".to_string()))?
            .to_ascii_lowercase();

        let subtype = mime_type
            .strip_prefix("image/")
            .ok_or_else(|| CloudinaryError::InvalidImage(format!("{mime_type} is not an image")))?;
        if !ALLOWED_TYPES.contains(&subtype) {
            return Err(CloudinaryError::InvalidImage(format!(
                "unsupported image type {mime_type}"
            )));
        }

        // Reject before decoding when the encoded length already rules it out.
        if payload.len() / 4 * 3 > MAX_IMAGE_BYTES + 3 {
            return Err(CloudinaryError::TooLarge {
                max_bytes: MAX_IMAGE_BYTES,
            });
        }
        let decoded = STANDARD
            .decode(payload)
            .map_err(|e| CloudinaryError::InvalidImage(format!("bad base64: {e}")))?;
        if decoded.is_empty() {
            return Err(CloudinaryError::InvalidImage("image is empty".to_string()));
        }
        if decoded.len() > MAX_IMAGE_BYTES {
            return Err(CloudinaryError::TooLarge {
                max_bytes: MAX_IMAGE_BYTES,
            });
        }

        Ok(Self {
            raw: input.to_string(),
            mime_type,
            decoded_len: decoded.len(),
        })
    }

    /// The full data URL, as sent to Cloudinary.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Size of the decoded image in bytes.
    #[must_use]
    pub const fn decoded_len(&self) -> usize {
        self.decoded_len
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_jpeg() {
        let encoded = STANDARD.encode([0xFF, 0xD8, 0xFF, 0xE0]);
        let image = ImageDataUrl::parse(&format!("data:image/JPEG;base64,{encoded}")).unwrap();
        assert_eq!(image.mime_type(), "image/jpeg");
        assert_eq!(image.decoded_len(), 4);
    }

    #[test]
    fn test_rejects_non_images_and_bad_base64() {
        assert!(matches!(
            ImageDataUrl::parse("https://example.com/a.png"),
            Err(CloudinaryError::InvalidImage(_))
        ));
        assert!(matches!(
            ImageDataUrl::parse("data:image/svg+xml;base64,PHN2Zz4="),
            Err(CloudinaryError::InvalidImage(_))
        ));
        assert!(matches!(
            ImageDataUrl::parse("data:image/png;base64,@@@"),
            Err(CloudinaryError::InvalidImage(_))
        ));
        assert!(matches!(
            ImageDataUrl::parse("data:image/png,plain"),
            Err(CloudinaryError::InvalidImage(_))
        ));
    }

    #[test]
    fn test_rejects_oversized() {
        let encoded = STANDARD.encode(vec![0_u8; MAX_IMAGE_BYTES + 1]);
        assert!(matches!(
            ImageDataUrl::parse(&format!("data:image/png;base64,{encoded}")),
            Err(CloudinaryError::TooLarge { .. })
        ));
    }
}
