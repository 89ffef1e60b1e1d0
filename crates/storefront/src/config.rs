//! Store configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STORE_WHATSAPP_NUMBER` - The store's WhatsApp number (national or international)
//! - `ADMIN_PASSWORD_HASH` - Argon2 PHC hash of the admin password (`sib-cli hash-password`)
//!
//! ## Optional
//! - `STORE_DATABASE_URL` - `SQLite` URL (falls back to `DATABASE_URL`, default: `sqlite://sib-store.db`)
//! - `STORE_HOST` - Bind address (default: 127.0.0.1)
//! - `STORE_PORT` - Listen port (default: 3000)
//! - `STORE_BASE_URL` - Public URL (default: `http://localhost:3000`)
//! - `STORE_ALLOWED_ORIGINS` - Comma-separated CORS origins
//! - `STORE_STATIC_DIR` - Prebuilt SPA directory to serve
//! - `ADMIN_USERNAME` - Admin login name (default: admin)
//! - `CLAUDE_API_KEY`, `CLAUDE_MODEL` - Chat assistant
//! - `CLOUDINARY_CLOUD_NAME`, `CLOUDINARY_API_KEY`, `CLOUDINARY_API_SECRET` - Image uploads
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use sib_store_core::PhoneNumber;
use sib_store_core::text::to_ascii_digits;

/// Default Claude model for the chat assistant.
pub const DEFAULT_CLAUDE_MODEL: &str = "claude-sonnet-4-20250514";

const DEFAULT_DATABASE_URL: &str = "sqlite://sib-store.db";
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Store application configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// `SQLite` database URL
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the store
    pub base_url: Url,
    /// Store WhatsApp number, digits only in international form
    pub whatsapp_number: String,
    /// Admin login credential
    pub admin: AdminConfig,
    /// Chat assistant; chat answers with the fallback message when absent
    pub claude: Option<ClaudeConfig>,
    /// Image uploads; upload endpoints return 503 when absent
    pub cloudinary: Option<CloudinaryConfig>,
    /// Origins allowed by CORS
    pub allowed_origins: Vec<String>,
    /// Prebuilt frontend served for non-API paths
    pub static_dir: Option<PathBuf>,
    /// Error tracking
    pub sentry: SentryConfig,
}

/// The single admin credential.
///
/// Implements `Debug` manually to redact the password hash.
#[derive(Clone)]
pub struct AdminConfig {
    pub username: String,
    /// Argon2 PHC string
    pub password_hash: SecretString,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("username", &self.username)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

/// Anthropic API configuration.
#[derive(Clone)]
pub struct ClaudeConfig {
    pub api_key: SecretString,
    pub model: String,
}

impl std::fmt::Debug for ClaudeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

/// Cloudinary signed upload configuration.
#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: SecretString,
}

impl std::fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

/// Sentry options.
#[derive(Debug, Clone)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub environment: Option<String>,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

impl Default for SentryConfig {
    fn default() -> Self {
        Self {
            dsn: None,
            environment: None,
            sample_rate: 1.0,
            traces_sample_rate: 0.0,
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(&|key| std::env::var(key).ok().filter(|v| !v.trim().is_empty()))
    }

    /// Load configuration from an explicit set of variables, ignoring the
    /// process environment and `.env`.
    ///
    /// # Errors
    ///
    /// Same as [`StoreConfig::from_env`].
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::from_lookup(&move |key| map.get(key).filter(|v| !v.trim().is_empty()).cloned())
    }

    fn from_lookup(env: &Env<'_>) -> Result<Self, ConfigError> {
        let database_url = env("STORE_DATABASE_URL")
            .or_else(|| env("DATABASE_URL"))
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let host = get_or_default(env, "STORE_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("STORE_HOST".to_string(), e.to_string()))?;
        let port = get_or_default(env, "STORE_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("STORE_PORT".to_string(), e.to_string()))?;
        let base_url = Url::parse(&get_or_default(env, "STORE_BASE_URL", "http://localhost:3000"))
            .map_err(|e| ConfigError::InvalidEnvVar("STORE_BASE_URL".to_string(), e.to_string()))?;

        let whatsapp_number = parse_whatsapp_number(&get_required(env, "STORE_WHATSAPP_NUMBER")?)
            .ok_or_else(|| {
                ConfigError::InvalidEnvVar(
                    "STORE_WHATSAPP_NUMBER".to_string(),
                    "must contain 8 to 15 digits".to_string(),
                )
            })?;

        let allowed_origins = env("STORE_ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            database_url: SecretString::from(database_url),
            host,
            port,
            base_url,
            whatsapp_number,
            admin: AdminConfig::from_lookup(env)?,
            claude: ClaudeConfig::from_lookup(env)?,
            cloudinary: CloudinaryConfig::from_lookup(env)?,
            allowed_origins,
            static_dir: env("STORE_STATIC_DIR").map(PathBuf::from),
            sentry: SentryConfig::from_lookup(env)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

impl AdminConfig {
    fn from_lookup(env: &Env<'_>) -> Result<Self, ConfigError> {
        let password_hash = get_required(env, "ADMIN_PASSWORD_HASH")?;
        argon2::PasswordHash::new(&password_hash).map_err(|e| {
            ConfigError::InvalidEnvVar("ADMIN_PASSWORD_HASH".to_string(), e.to_string())
        })?;

        Ok(Self {
            username: get_or_default(env, "ADMIN_USERNAME", "admin"),
            password_hash: SecretString::from(password_hash),
        })
    }
}

impl ClaudeConfig {
    fn from_lookup(env: &Env<'_>) -> Result<Option<Self>, ConfigError> {
        let Some(api_key) = env("CLAUDE_API_KEY") else {
            return Ok(None);
        };
        validate_secret_strength(&api_key, "CLAUDE_API_KEY")?;

        Ok(Some(Self {
            api_key: SecretString::from(api_key),
            model: get_or_default(env, "CLAUDE_MODEL", DEFAULT_CLAUDE_MODEL),
        }))
    }
}

impl CloudinaryConfig {
    fn from_lookup(env: &Env<'_>) -> Result<Option<Self>, ConfigError> {
        let keys = [
            "CLOUDINARY_CLOUD_NAME",
            "CLOUDINARY_API_KEY",
            "CLOUDINARY_API_SECRET",
        ];
        match keys.map(env) {
            [Some(cloud_name), Some(api_key), Some(api_secret)] => {
                validate_secret_strength(&api_secret, "CLOUDINARY_API_SECRET")?;
                Ok(Some(Self {
                    cloud_name,
                    api_key,
                    api_secret: SecretString::from(api_secret),
                }))
            }
            [None, None, None] => Ok(None),
            values => {
                let missing = keys
                    .iter()
                    .zip(values.iter())
                    .find(|(_, value)| value.is_none())
                    .map_or("CLOUDINARY_*", |(key, _)| *key);
                Err(ConfigError::MissingEnvVar(format!(
                    "{missing} (Cloudinary settings must be given together)"
                )))
            }
        }
    }
}

impl SentryConfig {
    fn from_lookup(env: &Env<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            dsn: env("SENTRY_DSN"),
            environment: env("SENTRY_ENVIRONMENT"),
            sample_rate: get_rate(env, "SENTRY_SAMPLE_RATE", 1.0)?,
            traces_sample_rate: get_rate(env, "SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

type Env<'a> = dyn Fn(&str) -> Option<String> + 'a;

/// Get a required environment variable.
fn get_required(env: &Env<'_>, key: &str) -> Result<String, ConfigError> {
    env(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_or_default(env: &Env<'_>, key: &str, default: &str) -> String {
    env(key).unwrap_or_else(|| default.to_string())
}

/// Parse a sample rate in `0.0..=1.0`.
fn get_rate(env: &Env<'_>, key: &str, default: f32) -> Result<f32, ConfigError> {
    let Some(raw) = env(key) else {
        return Ok(default);
    };
    let rate = raw
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be between 0.0 and 1.0".to_string(),
        ));
    }
    Ok(rate)
}

/// Normalize the store's WhatsApp number to the digits `wa.me` expects.
///
/// Iranian mobiles in national form gain the `98` prefix; anything else is
/// kept as its digits.
fn parse_whatsapp_number(raw: &str) -> Option<String> {
    if let Ok(mobile) = PhoneNumber::parse(raw) {
        return Some(mobile.international());
    }
    let digits: String = to_ascii_digits(raw)
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    let digits = digits.strip_prefix("00").map_or(digits.as_str(), |d| d);
    (8..=15).contains(&digits.len()).then(|| digits.to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the real key."
            ),
        ));
    }

    Ok(())
}
