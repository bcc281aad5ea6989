//! Application configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API connection settings
    pub api: ApiConfig,

    /// Session storage settings
    pub session: SessionConfig,

    /// Endpoint prefixes of the two tenant scopes
    pub scopes: ScopeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL all API paths are relative to
    pub base_url: String,

    /// Request timeout in seconds
    pub request_timeout: u64,

    /// Connect timeout in seconds
    pub connect_timeout: u64,

    /// User agent string
    pub user_agent: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Token file (defaults to session.json in the data directory)
    pub store_path: Option<PathBuf>,

    /// Share one refresh call between concurrent 401s
    pub coalesce_refresh: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    pub admin_prefix: String,
    pub restaurant_prefix: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://dispatcher.mouhannadabdalrhem.online/api/v1".to_string(),
            request_timeout: 30,
            connect_timeout: 10,
            user_agent: format!("dispatch-console/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            admin_prefix: "admin".to_string(),
            restaurant_prefix: "restaurant".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = match path {
            Some(p) => PathBuf::from(p),
            None => Self::default_config_path()?,
        };

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config from {:?}", config_path))?;

            let config = Self::from_toml(&contents)?;

            tracing::info!("Loaded configuration from {:?}", config_path);
            Ok(config)
        } else {
            tracing::info!("No configuration file found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to file
    pub fn save(&self, path: Option<&str>) -> Result<()> {
        let config_path = match path {
            Some(p) => PathBuf::from(p),
            None => Self::default_config_path()?,
        };

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, contents)?;

        tracing::info!("Saved configuration to {:?}", config_path);
        Ok(())
    }

    /// Check values that would only fail later, at request time
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &str, reason: &str| ConfigError::ValidationError {
            field: field.to_string(),
            reason: reason.to_string(),
        };

        let url = url::Url::parse(&self.api.base_url)
            .map_err(|e| invalid("api.base_url", &e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("api.base_url", "scheme must be http or https"));
        }
        if self.api.request_timeout == 0 {
            return Err(invalid("api.request_timeout", "must be greater than 0"));
        }
        if self.api.connect_timeout == 0 {
            return Err(invalid("api.connect_timeout", "must be greater than 0"));
        }
        if self.scopes.admin_prefix.trim_matches('/').is_empty() {
            return Err(invalid("scopes.admin_prefix", "must not be empty"));
        }
        if self.scopes.restaurant_prefix.trim_matches('/').is_empty() {
            return Err(invalid("scopes.restaurant_prefix", "must not be empty"));
        }

        Ok(())
    }

    /// Token file location, honouring `session.store_path`
    pub fn session_store_path(&self) -> Result<PathBuf> {
        match &self.session.store_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::data_dir()?.join("session.json")),
        }
    }

    /// Get default configuration file path
    fn default_config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("online", "dispatcher", "dispatch-console")
            .context("Failed to determine config directory")?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get data directory path
    pub fn data_dir() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("online", "dispatcher", "dispatch-console")
            .context("Failed to determine data directory")?;

        Ok(dirs.data_dir().to_path_buf())
    }
}
