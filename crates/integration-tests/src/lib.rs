//! End-to-end tests for the Sib Store API.
//!
//! Each test spawns the real router on an ephemeral port over a fresh
//! in-memory database and talks to it with a cookie-keeping `reqwest`
//! client, the way the storefront and admin panel do. Claude and Cloudinary
//! are replaced by small local stubs when a test needs them.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p sib-store-integration-tests
//! ```

use std::net::SocketAddr;
use std::sync::{Arc, LazyLock, Mutex};

use axum::Router;
use reqwest::{Client, Response, StatusCode};
use secrecy::SecretString;
use serde_json::Value;

use sib_store_storefront::claude::ClaudeClient;
use sib_store_storefront::cloudinary::CloudinaryClient;
use sib_store_storefront::config::{ClaudeConfig, CloudinaryConfig, StoreConfig};
use sib_store_storefront::services::auth::hash_password;
use sib_store_storefront::state::AppState;
use sib_store_storefront::{build_router, db};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "saffron-and-pistachio-42";
pub const WHATSAPP_NUMBER: &str = "09121234567";

static ADMIN_HASH: LazyLock<String> =
    LazyLock::new(|| hash_password(ADMIN_PASSWORD).expect("test password hashes"));

/// Which third-party stubs a test server talks to.
#[derive(Debug, Default, Clone)]
pub struct TestOptions {
    /// Claude Messages endpoint; chat falls back when `None`.
    pub claude_endpoint: Option<String>,
    /// Cloudinary API root; uploads are unavailable when `None`.
    pub cloudinary_api_url: Option<String>,
}

/// A running store server and a client with its own cookie jar.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    pub state: AppState,
}

impl TestContext {
    /// Spawn a server without Claude or Cloudinary.
    pub async fn new() -> Self {
        Self::with_options(TestOptions::default()).await
    }

    /// Spawn a server wired to the given stubs.
    ///
    /// # Panics
    ///
    /// Panics if the server cannot be started.
    pub async fn with_options(options: TestOptions) -> Self {
        let config = StoreConfig::from_vars([
            ("STORE_DATABASE_URL", "sqlite::memory:"),
            ("STORE_WHATSAPP_NUMBER", WHATSAPP_NUMBER),
            ("ADMIN_USERNAME", ADMIN_USERNAME),
            ("ADMIN_PASSWORD_HASH", ADMIN_HASH.as_str()),
        ])
        .expect("test config is valid");

        let pool = db::create_pool(&config.database_url)
            .await
            .expect("in-memory database opens");
        db::run_migrations(&pool).await.expect("migrations apply");

        let claude = options.claude_endpoint.map(|endpoint| {
            let config = ClaudeConfig {
                api_key: SecretString::from("sk-ant-integration"),
                model: "claude-test".to_string(),
            };
            ClaudeClient::with_endpoint(&config, &endpoint).expect("claude client builds")
        });
        let cloudinary = options.cloudinary_api_url.map(|api_url| {
            let config = CloudinaryConfig {
                cloud_name: "sib-test".to_string(),
                api_key: "123456".to_string(),
                api_secret: SecretString::from("cloudinary-test-secret"),
            };
            CloudinaryClient::with_api_url(config, &api_url).expect("cloudinary client builds")
        });

        let state = AppState::from_parts(config, pool, claude, cloudinary);
        let app = build_router(state.clone())
            .await
            .expect("router builds");
        let base_url = serve(app).await;

        let client = Client::builder()
            .cookie_store(true)
            .build()
            .expect("client builds");

        Self {
            client,
            base_url,
            state,
        }
    }

    /// Absolute URL for a path on the test server.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET a path and parse the JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the request fails.
    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("GET succeeds");
        json_of(response).await
    }

    /// POST a JSON body and parse the JSON response.
    ///
    /// # Panics
    ///
    /// Panics if the request fails.
    pub async fn post(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("POST succeeds");
        json_of(response).await
    }

    /// PATCH a JSON body and parse the JSON response.
    ///
    /// # Panics
    ///
    /// Panics if the request fails.
    pub async fn patch(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        let response = self
            .client
            .patch(self.url(path))
            .json(body)
            .send()
            .await
            .expect("PATCH succeeds");
        json_of(response).await
    }

    /// DELETE a path and return the status.
    ///
    /// # Panics
    ///
    /// Panics if the request fails.
    pub async fn delete(&self, path: &str) -> StatusCode {
        self.client
            .delete(self.url(path))
            .send()
            .await
            .expect("DELETE succeeds")
            .status()
    }

    /// Log this client in as the admin; the session cookie is kept.
    ///
    /// # Panics
    ///
    /// Panics if the login is rejected.
    pub async fn login(&self) {
        let (status, body) = self
            .post(
                "/api/admin/login",
                &serde_json::json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
    }
}

/// Status and JSON body of a response (`Null` for an empty body).
///
/// # Panics
///
/// Panics if the body is not valid JSON.
pub async fn json_of(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.bytes().await.expect("body is readable");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body is JSON")
    };
    (status, value)
}

/// Serve a router on an ephemeral local port and return its base URL.
///
/// # Panics
///
/// Panics if no local port can be bound.
pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("ephemeral port binds");
    let addr = listener.local_addr().expect("listener has an address");
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    });
    format!("http://{addr}")
}

/// Requests received by a stub, as JSON values.
pub type Recorded = Arc<Mutex<Vec<Value>>>;

/// Read what a stub has recorded so far.
///
/// # Panics
///
/// Panics if a stub handler panicked while holding the lock.
#[must_use]
pub fn recorded(log: &Recorded) -> Vec<Value> {
    log.lock().expect("stub log lock").clone()
}
