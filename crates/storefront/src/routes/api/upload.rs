//! Admin image uploads, forwarded to Cloudinary.

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    routing::post,
};
use serde::{Deserialize, Serialize};

use crate::cloudinary::{CloudinaryClient, CloudinaryError, ImageDataUrl, UploadedImage};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::used_phone::MAX_IMAGES;
use crate::routes::ApiJson;
use crate::state::AppState;

/// Folder used when the request names none.
const DEFAULT_FOLDER: &str = "sib-store";

/// Request body limits; base64 inflates images by a third.
const SINGLE_UPLOAD_LIMIT: usize = 15 * 1024 * 1024;
const MULTIPLE_UPLOAD_LIMIT: usize = 64 * 1024 * 1024;

/// Create the upload router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/upload",
            post(upload_one).layer(DefaultBodyLimit::max(SINGLE_UPLOAD_LIMIT)),
        )
        .route(
            "/upload/multiple",
            post(upload_many).layer(DefaultBodyLimit::max(MULTIPLE_UPLOAD_LIMIT)),
        )
}

#[derive(Debug, Deserialize)]
struct UploadRequest {
    image: String,
    #[serde(default)]
    folder: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadManyRequest {
    images: Vec<String>,
    #[serde(default)]
    folder: Option<String>,
}

#[derive(Debug, Serialize)]
struct UploadedUrls {
    urls: Vec<String>,
}

fn client(state: &AppState) -> Result<&CloudinaryClient> {
    state
        .cloudinary()
        .ok_or(AppError::Upload(CloudinaryError::NotConfigured))
}

/// Keep folder names to path-safe ASCII.
///
/// Anything else is dropped; an empty result means the default folder.
fn sanitize_folder(folder: Option<&str>) -> String {
    let cleaned: String = folder
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/'))
        .collect();
    let cleaned = cleaned.trim_matches('/');
    if cleaned.is_empty() {
        DEFAULT_FOLDER.to_string()
    } else {
        cleaned.to_string()
    }
}

/// POST /api/upload
async fn upload_one(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UploadRequest>,
) -> Result<ApiJson<UploadedImage>> {
    let client = client(&state)?;
    let image = ImageDataUrl::parse(&request.image)?;
    let folder = sanitize_folder(request.folder.as_deref());

    let uploaded = client.upload(&image, Some(&folder)).await?;

    tracing::info!(admin = %admin.username, public_id = %uploaded.public_id, "Image uploaded");
    Ok(ApiJson(uploaded))
}

/// POST /api/upload/multiple
///
/// Every image is validated before the first one is sent.
async fn upload_many(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UploadManyRequest>,
) -> Result<ApiJson<UploadedUrls>> {
    let client = client(&state)?;
    if request.images.is_empty() {
        return Err(AppError::BadRequest("images is required".to_string()));
    }
    if request.images.len() > MAX_IMAGES {
        return Err(AppError::BadRequest(format!(
            "at most {MAX_IMAGES} images per upload"
        )));
    }

    let images = request
        .images
        .iter()
        .map(|raw| ImageDataUrl::parse(raw))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let folder = sanitize_folder(request.folder.as_deref());

    let mut urls = Vec::with_capacity(images.len());
    for image in &images {
        urls.push(client.upload(image, Some(&folder)).await?.url);
    }

    tracing::info!(admin = %admin.username, count = urls.len(), "Images uploaded");
    Ok(ApiJson(UploadedUrls { urls }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{Method, StatusCode};
    use secrecy::SecretString;
    use serde_json::json;

    use super::super::test_support::TestApp;
    use super::*;
    use crate::config::CloudinaryConfig;

    const PIXEL: &str = "data:image/png;base64,iVBORw0KGgo=";

    #[test]
    fn test_sanitize_folder() {
        assert_eq!(sanitize_folder(None), "sib-store");
        assert_eq!(sanitize_folder(Some("used-phones")), "used-phones");
        assert_eq!(sanitize_folder(Some("../etc/passwd")), "etc/passwd");
        assert_eq!(sanitize_folder(Some("عکس")), "sib-store");
    }

    #[tokio::test]
    async fn test_upload_requires_admin() {
        let app = TestApp::new().await;
        let (status, _) = app
            .call(Method::POST, "/api/upload", Some(json!({ "image": PIXEL })), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unconfigured_upload_is_unavailable() {
        let app = TestApp::new().await;
        let cookie = app.login().await;
        let (status, body) = app
            .call(
                Method::POST,
                "/api/upload",
                Some(json!({ "image": PIXEL })),
                Some(&cookie),
            )
            .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "سرویس آپلود تصویر پیکربندی نشده است");
    }

    #[tokio::test]
    async fn test_invalid_images_rejected_before_upload() {
        let config = CloudinaryConfig {
            cloud_name: "demo".to_string(),
            api_key: "1234".to_string(),
            api_secret: SecretString::from("secret"),
        };
        let cloudinary = CloudinaryClient::with_api_url(config, "http://127.0.0.1:9").unwrap();
        let app = TestApp::with_clients(None, Some(cloudinary)).await;
        let cookie = app.login().await;

        let (status, _) = app
            .call(
                Method::POST,
                "/api/upload/multiple",
                Some(json!({ "images": [PIXEL, "data:text/plain;base64,aGk="] })),
                Some(&cookie),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .call(
                Method::POST,
                "/api/upload/multiple",
                Some(json!({ "images": [] })),
                Some(&cookie),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app
            .call(
                Method::POST,
                "/api/upload",
                Some(json!({ "image": PIXEL })),
                Some(&cookie),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "آپلود تصویر با خطا مواجه شد");
    }
}
