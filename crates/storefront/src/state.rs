//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::claude::{ClaudeClient, ClaudeError};
use crate::cloudinary::{CloudinaryClient, CloudinaryError};
use crate::config::StoreConfig;
use crate::services::catalog::CatalogCache;

/// Error building the third-party clients.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("claude client: {0}")]
    Claude(#[from] ClaudeError),
    #[error("cloudinary client: {0}")]
    Cloudinary(#[from] CloudinaryError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StoreConfig,
    pool: SqlitePool,
    cache: CatalogCache,
    claude: Option<ClaudeClient>,
    cloudinary: Option<CloudinaryClient>,
}

impl AppState {
    /// Create the application state, building the Claude and Cloudinary
    /// clients when they are configured.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured client cannot be built.
    pub fn new(config: StoreConfig, pool: SqlitePool) -> Result<Self, StateError> {
        let claude = config.claude.as_ref().map(ClaudeClient::new).transpose()?;
        let cloudinary = config
            .cloudinary
            .clone()
            .map(CloudinaryClient::new)
            .transpose()?;

        Ok(Self::from_parts(config, pool, claude, cloudinary))
    }

    /// Assemble state from already-built clients.
    #[must_use]
    pub fn from_parts(
        config: StoreConfig,
        pool: SqlitePool,
        claude: Option<ClaudeClient>,
        cloudinary: Option<CloudinaryClient>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                cache: CatalogCache::new(),
                claude,
                cloudinary,
            }),
        }
    }

    /// Get a reference to the store configuration.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    /// The catalog read cache.
    #[must_use]
    pub fn cache(&self) -> &CatalogCache {
        &self.inner.cache
    }

    /// The chat provider client, when an API key is configured.
    #[must_use]
    pub fn claude(&self) -> Option<&ClaudeClient> {
        self.inner.claude.as_ref()
    }

    /// The image upload client, when Cloudinary is configured.
    #[must_use]
    pub fn cloudinary(&self) -> Option<&CloudinaryClient> {
        self.inner.cloudinary.as_ref()
    }
}
