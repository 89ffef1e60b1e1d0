//! Cloudinary upload API client.

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::instrument;

use crate::config::CloudinaryConfig;

use super::{CloudinaryError, ImageDataUrl};

const CLOUDINARY_API_URL: &str = "https://api.cloudinary.com/v1_1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    pub url: String,
    pub public_id: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

/// Cloudinary client for signed image uploads.
#[derive(Clone)]
pub struct CloudinaryClient {
    inner: Arc<CloudinaryClientInner>,
}

struct CloudinaryClientInner {
    client: reqwest::Client,
    config: CloudinaryConfig,
    api_url: String,
}

impl CloudinaryClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `CloudinaryError::Http` if the HTTP client cannot be built.
    pub fn new(config: CloudinaryConfig) -> Result<Self, CloudinaryError> {
        Self::with_api_url(config, CLOUDINARY_API_URL)
    }

    /// Create a client against a different API root.
    ///
    /// # Errors
    ///
    /// Returns `CloudinaryError::Http` if the HTTP client cannot be built.
    pub fn with_api_url(config: CloudinaryConfig, api_url: &str) -> Result<Self, CloudinaryError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(CloudinaryClientInner {
                client,
                config,
                api_url: api_url.trim_end_matches('/').to_string(),
            }),
        })
    }

    /// Upload one image into `folder`.
    ///
    /// # Errors
    ///
    /// Returns `CloudinaryError::Http` on transport failure, `Api` when
    /// Cloudinary rejects the upload, and `Parse` on an unexpected response.
    #[instrument(skip(self, image), fields(bytes = image.decoded_len()))]
    pub async fn upload(
        &self,
        image: &ImageDataUrl,
        folder: Option<&str>,
    ) -> Result<UploadedImage, CloudinaryError> {
        let config = &self.inner.config;
        let timestamp = chrono::Utc::now().timestamp().to_string();

        let mut signed: Vec<(&str, &str)> = vec![("timestamp", timestamp.as_str())];
        if let Some(folder) = folder {
            signed.push(("folder", folder));
        }
        let signature = sign(&signed, config.api_secret.expose_secret());

        let mut form = signed;
        form.push(("file", image.as_str()));
        form.push(("api_key", config.api_key.as_str()));
        form.push(("signature", signature.as_str()));
        form.push(("signature_algorithm", "sha256"));

        let url = format!("{}/{}/image/upload", self.inner.api_url, config.cloud_name);
        let response = self.inner.client.post(url).form(&form).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map_or(body, |e| e.error.message);
            tracing::warn!(status = status.as_u16(), %message, "Cloudinary upload rejected");
            return Err(CloudinaryError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let uploaded: UploadResponse = serde_json::from_str(&body)
            .map_err(|e| CloudinaryError::Parse(format!("Failed to parse upload response: {e}")))?;

        Ok(UploadedImage {
            url: uploaded.secure_url,
            public_id: uploaded.public_id,
        })
    }
}

/// Cloudinary request signature: parameters sorted by name, joined as
/// `a=1&b=2`, followed by the API secret, hashed with SHA-256.
fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let joined = sorted
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}
