//! Configuration loading and management
//!
//! Configuration comes from an optional YAML file, then environment
//! variables override individual values:
//!
//! | Variable | Overrides |
//! |---|---|
//! | `POCKETBOOKS_CONFIG` | path of the YAML file (default `config/pocketbooks.yaml`) |
//! | `POCKETBOOKS_ADDR` | `server.addr` |
//! | `POCKETBOOKS_STORAGE` | `storage.backend` (`memory` or `mongodb`) |
//! | `MONGODB_URI` | `storage.uri` |
//! | `POCKETBOOKS_DATABASE` | `storage.database` |
//! | `POCKETBOOKS_LOG` | `logging.level` |

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config/pocketbooks.yaml";

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub pagination: PaginationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:3000")
    pub addr: String,

    /// Allowed CORS origins; empty means any origin
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:3000".to_string(),
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Mongodb,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// MongoDB connection string
    pub uri: String,

    /// MongoDB database name
    pub database: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            uri: "mongodb://localhost:27017".to_string(),
            database: "pocketbooks".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Page size when the request has no `limit`
    pub default_limit: usize,

    /// Upper bound for `limit`
    pub max_limit: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info,tower_http=debug".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the file named by `POCKETBOOKS_CONFIG` (if it exists) and apply
    /// environment overrides
    pub fn load() -> Result<Self> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        let path = vars
            .get("POCKETBOOKS_CONFIG")
            .cloned()
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        let mut config = if Path::new(&path).exists() {
            Self::from_yaml_file(&path)?
        } else {
            tracing::debug!(path = %path, "config file not found, using defaults");
            Self::default()
        };

        config.apply_overrides(&vars)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment-style overrides
    pub fn apply_overrides(&mut self, vars: &HashMap<String, String>) -> Result<()> {
        if let Some(addr) = vars.get("POCKETBOOKS_ADDR") {
            self.server.addr = addr.clone();
        }
        if let Some(backend) = vars.get("POCKETBOOKS_STORAGE") {
            self.storage.backend = match backend.to_ascii_lowercase().as_str() {
                "memory" => StorageBackend::Memory,
                "mongodb" => StorageBackend::Mongodb,
                other => bail!("unknown storage backend '{}'", other),
            };
        }
        if let Some(uri) = vars.get("MONGODB_URI") {
            self.storage.uri = uri.clone();
        }
        if let Some(database) = vars.get("POCKETBOOKS_DATABASE") {
            self.storage.database = database.clone();
        }
        if let Some(level) = vars.get("POCKETBOOKS_LOG") {
            self.logging.level = level.clone();
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.pagination.default_limit == 0 || self.pagination.max_limit == 0 {
            bail!("pagination limits must be at least 1");
        }
        if self.pagination.default_limit > self.pagination.max_limit {
            bail!(
                "pagination.default_limit ({}) exceeds pagination.max_limit ({})",
                self.pagination.default_limit,
                self.pagination.max_limit
            );
        }
        if self.storage.database.is_empty() {
            bail!("storage.database must not be empty");
        }
        Ok(())
    }
}
