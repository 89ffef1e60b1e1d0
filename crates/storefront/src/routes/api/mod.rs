//! JSON API under `/api`.
//!
//! Every handler returns `Result<_, AppError>`, so failures share the
//! `{"error": "..."}` body. Admin-only handlers take a
//! [`RequireAdmin`](crate::middleware::RequireAdmin) argument.

pub mod admin;
pub mod analytics;
pub mod catalog;
pub mod chat;
pub mod orders;
pub mod prices;
pub mod upload;
pub mod used_phones;

use axum::Router;

use crate::error::{AppError, add_breadcrumb};
use crate::models::CurrentAdmin;
use crate::state::AppState;

/// Create the `/api` router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(catalog::router())
        .merge(prices::router())
        .merge(orders::router())
        .merge(used_phones::router())
        .merge(analytics::router())
        .merge(chat::router())
        .merge(upload::router())
        .merge(admin::router())
}

fn not_found(what: &str) -> AppError {
    AppError::NotFound(format!("{what} not found"))
}

/// Record an admin write to the catalog and drop cached reads.
async fn catalog_changed(state: &AppState, admin: &CurrentAdmin, action: &str, subject: &str) {
    state.cache().invalidate_all().await;
    add_breadcrumb(
        "catalog",
        action,
        Some(&[("admin", admin.username.as_str()), ("subject", subject)]),
    );
    tracing::info!(admin = %admin.username, subject, "{action}");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod test_support {
    use std::net::SocketAddr;
    use std::sync::LazyLock;

    use axum::{
        Router,
        body::Body,
        Extension,
        extract::ConnectInfo,
        http::{
            Method, Request, StatusCode,
            header::{CONTENT_TYPE, COOKIE, SET_COOKIE},
        },
        response::Response,
    };
    use serde_json::{Value, json};
    use sqlx::SqlitePool;
    use tower::ServiceExt;

    use sib_store_core::{ColorId, ModelId, StorageId};

    use crate::claude::ClaudeClient;
    use crate::cloudinary::CloudinaryClient;
    use crate::config::StoreConfig;
    use crate::db::{
        CategoryRepository, ColorRepository, PriceRepository, ProductModelRepository,
        StorageOptionRepository,
    };
    use crate::models::catalog::{
        CategoryInput, ColorInput, ProductModelInput, ProductPriceInput, StorageOptionInput,
    };
    use crate::services::auth::hash_password;
    use crate::state::AppState;

    pub const ADMIN_USERNAME: &str = "admin";
    pub const ADMIN_PASSWORD: &str = "pomegranate-orchard-17";

    static ADMIN_HASH: LazyLock<String> = LazyLock::new(|| hash_password(ADMIN_PASSWORD).unwrap());

    pub fn config() -> StoreConfig {
        StoreConfig::from_vars([
            ("STORE_DATABASE_URL", "sqlite::memory:"),
            ("STORE_WHATSAPP_NUMBER", "09121234567"),
            ("STORE_ALLOWED_ORIGINS", "http://localhost:5173"),
            ("ADMIN_USERNAME", ADMIN_USERNAME),
            ("ADMIN_PASSWORD_HASH", ADMIN_HASH.as_str()),
        ])
        .unwrap()
    }

    /// The full router over a fresh in-memory database.
    pub struct TestApp {
        pub router: Router,
        pub state: AppState,
    }

    impl TestApp {
        pub async fn new() -> Self {
            Self::with_clients(None, None).await
        }

        pub async fn with_clients(
            claude: Option<ClaudeClient>,
            cloudinary: Option<CloudinaryClient>,
        ) -> Self {
            let pool = crate::db::test_support::pool().await;
            let state = AppState::from_parts(config(), pool, claude, cloudinary);
            let peer = SocketAddr::from(([127, 0, 0, 1], 40_000));
            let router = crate::build_router(state.clone())
                .await
                .unwrap()
                .layer(Extension(ConnectInfo(peer)));
            Self { router, state }
        }

        pub async fn send(&self, request: Request<Body>) -> Response {
            self.router.clone().oneshot(request).await.unwrap()
        }

        /// Send a request with an optional JSON body and session cookie,
        /// returning the status and parsed JSON body (`Null` when empty).
        pub async fn call(
            &self,
            method: Method,
            uri: &str,
            body: Option<Value>,
            cookie: Option<&str>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(cookie) = cookie {
                builder = builder.header(COOKIE, cookie);
            }
            let body = match body {
                Some(value) => {
                    builder = builder.header(CONTENT_TYPE, "application/json");
                    Body::from(value.to_string())
                }
                None => Body::empty(),
            };
            read_json(self.send(builder.body(body).unwrap()).await).await
        }

        pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
            self.call(Method::GET, uri, None, None).await
        }

        /// Log in as the admin and return the session cookie pair.
        pub async fn login(&self) -> String {
            let request = Request::post("/api/admin/login")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD }).to_string(),
                ))
                .unwrap();
            let response = self.send(request).await;
            assert_eq!(response.status(), StatusCode::OK);
            let set_cookie = response.headers()[SET_COOKIE].to_str().unwrap();
            set_cookie.split(';').next().unwrap().to_string()
        }
    }

    pub async fn read_json(response: Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub struct SeededCatalog {
        pub model: ModelId,
        pub white: ColorId,
        pub black: ColorId,
        pub gb256: StorageId,
        pub gb512: StorageId,
    }

    /// iPhone 16 Pro in two colors and two capacities, priced only for
    /// 256GB white.
    pub async fn seed_catalog(pool: &SqlitePool) -> SeededCatalog {
        let category = CategoryRepository::new(pool)
            .create(&CategoryInput {
                name_en: "iPhone".to_string(),
                name_fa: "آیفون".to_string(),
                slug: Some("iphone".to_string()),
                display_order: 0,
            })
            .await
            .unwrap();
        let model = ProductModelRepository::new(pool)
            .create(&ProductModelInput {
                category_id: category.id,
                name_en: "iPhone 16 Pro".to_string(),
                name_fa: "آیفون ۱۶ پرو".to_string(),
                generation: None,
                image_url: None,
                display_order: 0,
                is_active: true,
            })
            .await
            .unwrap();

        let colors = ColorRepository::new(pool);
        let white = colors
            .create(&ColorInput {
                name_en: "White Titanium".to_string(),
                name_fa: "سفید".to_string(),
                hex_code: "#F2F1ED".to_string(),
                display_order: 0,
            })
            .await
            .unwrap();
        let black = colors
            .create(&ColorInput {
                name_en: "Black Titanium".to_string(),
                name_fa: "مشکی".to_string(),
                hex_code: "#3C3C3D".to_string(),
                display_order: 1,
            })
            .await
            .unwrap();

        let storages = StorageOptionRepository::new(pool);
        let gb256 = storages
            .create(&StorageOptionInput {
                name_en: "256GB".to_string(),
                name_fa: "۲۵۶ گیگابایت".to_string(),
                category_id: None,
                display_order: 0,
            })
            .await
            .unwrap();
        let gb512 = storages
            .create(&StorageOptionInput {
                name_en: "512GB".to_string(),
                name_fa: "۵۱۲ گیگابایت".to_string(),
                category_id: None,
                display_order: 1,
            })
            .await
            .unwrap();

        PriceRepository::new(pool)
            .upsert(&ProductPriceInput {
                model_id: model.id,
                color_id: white.id,
                storage_id: gb256.id,
                price: 90_000_000,
                stock: 3,
                is_active: true,
            })
            .await
            .unwrap();

        SeededCatalog {
            model: model.id,
            white: white.id,
            black: black.id,
            gb256: gb256.id,
            gb512: gb512.id,
        }
    }
}
