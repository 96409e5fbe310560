//! Application configuration module
//!
//! Provides configuration types for the client core: the remote gateway
//! base URL, the local database location, and the cache worker's bucket
//! version, asset root and shell manifest.

use thiserror::Error;

/// Default cache bucket version tag
pub const DEFAULT_CACHE_VERSION: &str = "tienda-cache-v1";

/// Canonical static-asset root served by the cache worker
pub const DEFAULT_ASSET_ROOT: &str = "/app/";

/// Client configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Remote gateway base URL, e.g. `https://api.example.com/api`
    pub api_base_url: String,
    /// Local database path; `sqlite::memory:` for an in-memory store
    pub database_path: String,
    /// Version tag naming the current resource cache bucket
    pub cache_version: String,
    /// Application root all shell assets live under
    pub asset_root: String,
    /// Offline fallback page, relative to the asset root
    pub offline_page: String,
    /// Shell resources primed during the cache worker install phase
    pub shell_manifest: Vec<String>,
    /// Public VAPID key handed to the push-messaging service
    pub vapid_key: Option<String>,
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.is_empty() {
            return Err(ConfigError::MissingValue("api_base_url"));
        }
        if !self.api_base_url.starts_with("http") {
            return Err(ConfigError::InvalidUrl(self.api_base_url.clone()));
        }
        Ok(())
    }

    /// Absolute URL of the offline fallback page
    pub fn offline_page_url(&self) -> String {
        format!("{}{}", self.asset_root, self.offline_page)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            database_path: "sqlite::memory:".to_string(),
            cache_version: DEFAULT_CACHE_VERSION.to_string(),
            asset_root: DEFAULT_ASSET_ROOT.to_string(),
            offline_page: "offline.html".to_string(),
            shell_manifest: default_shell_manifest(DEFAULT_ASSET_ROOT),
            vapid_key: None,
        }
    }
}

/// Shell resources cached for offline navigation, under the given root
pub fn default_shell_manifest(root: &str) -> Vec<String> {
    [
        "",
        "index.html",
        "login.html",
        "offline.html",
        "pages/admin/dashboard.html",
        "pages/admin/pedidos.html",
        "pages/admin/productos.html",
        "pages/admin/repartidores.html",
        "pages/admin/tiendas.html",
        "pages/repartidor/inicio.html",
        "pages/repartidor/pedidos.html",
        "pages/repartidor/perfil.html",
        "css/styles.css",
        "css/responsive.css",
        "img/192.png",
        "img/512.png",
    ]
    .iter()
    .map(|p| format!("{}{}", root, p))
    .collect()
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    api_base_url: Option<String>,
    database_path: Option<String>,
    cache_version: Option<String>,
    asset_root: Option<String>,
    offline_page: Option<String>,
    shell_manifest: Option<Vec<String>>,
    vapid_key: Option<String>,
}

impl AppConfigBuilder {
    /// Set the remote gateway base URL
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    /// Set the local database path
    pub fn database_path(mut self, path: impl Into<String>) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Set the cache bucket version tag
    pub fn cache_version(mut self, version: impl Into<String>) -> Self {
        self.cache_version = Some(version.into());
        self
    }

    /// Set the canonical asset root
    pub fn asset_root(mut self, root: impl Into<String>) -> Self {
        self.asset_root = Some(root.into());
        self
    }

    /// Set the offline fallback page
    pub fn offline_page(mut self, page: impl Into<String>) -> Self {
        self.offline_page = Some(page.into());
        self
    }

    /// Replace the shell manifest
    pub fn shell_manifest(mut self, manifest: Vec<String>) -> Self {
        self.shell_manifest = Some(manifest);
        self
    }

    /// Set the public VAPID key
    pub fn vapid_key(mut self, key: impl Into<String>) -> Self {
        self.vapid_key = Some(key.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let asset_root = self
            .asset_root
            .unwrap_or_else(|| DEFAULT_ASSET_ROOT.to_string());
        let config = AppConfig {
            api_base_url: self.api_base_url.ok_or(ConfigError::MissingValue("api_base_url"))?,
            database_path: self
                .database_path
                .unwrap_or_else(|| "sqlite::memory:".to_string()),
            cache_version: self
                .cache_version
                .unwrap_or_else(|| DEFAULT_CACHE_VERSION.to_string()),
            shell_manifest: self
                .shell_manifest
                .unwrap_or_else(|| default_shell_manifest(&asset_root)),
            offline_page: self.offline_page.unwrap_or_else(|| "offline.html".to_string()),
            vapid_key: self.vapid_key,
            asset_root,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
}
