use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "asset-dispatch.toml";

/// Prefix of environment overrides, e.g. `ASSET_DISPATCH_STORE__BACKEND=sqlite`
pub const ENV_PREFIX: &str = "ASSET_DISPATCH";

/// Main configuration structure for asset-dispatch
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DispatchConfig {
    /// Persistence backend
    pub store: StoreConfig,
    /// Workflow engine tuning
    pub engine: EngineSettings,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    #[default]
    File,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// JSON document path for the file backend
    pub path: String,
    /// SQLite URL for the sqlite backend
    pub database_url: String,
    /// Maximum connections in pool
    pub max_connections: u32,
    /// Enable automatic migrations
    pub auto_migrate: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::File,
            path: ".asset-dispatch/assets.json".to_string(),
            database_url: "sqlite://.asset-dispatch/assets.db".to_string(),
            max_connections: 5,
            auto_migrate: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EngineSettings {
    /// Timeout applied to each store call, in milliseconds
    pub store_timeout_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            store_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level or `EnvFilter` directive
    pub log_level: String,
    /// Emit JSON lines instead of human-readable logs
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            json_logs: false,
        }
    }
}

impl DispatchConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (`path`, or `asset-dispatch.toml` when present)
    /// 3. Environment variables (prefixed with `ASSET_DISPATCH_`, nested with `__`)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(
            Config::try_from(&DispatchConfig::default())
                .context("Failed to build default configuration")?,
        );

        match path {
            Some(path) => {
                if !path.exists() {
                    bail!("Configuration file not found: {}", path.display());
                }
                builder = builder.add_source(File::from(path));
            }
            None => {
                if Path::new(DEFAULT_CONFIG_FILE).exists() {
                    builder = builder.add_source(File::with_name(DEFAULT_CONFIG_FILE));
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: DispatchConfig = builder
            .build()?
            .try_deserialize()
            .context("Invalid asset-dispatch configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.engine.store_timeout_ms == 0 {
            bail!("engine.store_timeout_ms must be greater than zero");
        }
        if self.store.max_connections == 0 {
            bail!("store.max_connections must be greater than zero");
        }
        match self.store.backend {
            StoreBackend::File if self.store.path.trim().is_empty() => {
                bail!("store.path is required for the file backend")
            }
            StoreBackend::Sqlite if self.store.database_url.trim().is_empty() => {
                bail!("store.database_url is required for the sqlite backend")
            }
            _ => Ok(()),
        }
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("dispatch.toml");
        std::fs::write(
            &path,
            "[store]\nbackend = \"memory\"\n\n[engine]\nstore_timeout_ms = 250\n",
        )
        .unwrap();

        let config = DispatchConfig::load(Some(&path)).unwrap();
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.engine.store_timeout_ms, 250);
        assert_eq!(config.store.max_connections, StoreConfig::default().max_connections);
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("saved.toml");
        let mut config = DispatchConfig::default();
        config.store.backend = StoreBackend::Sqlite;
        config.store.database_url = "sqlite://inventory.db".to_string();
        config.save_to_file(&path).unwrap();

        let loaded = DispatchConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded.store, config.store);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        assert!(DispatchConfig::load(Some(&temp_dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let mut config = DispatchConfig::default();
        config.engine.store_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = DispatchConfig::default();
        config.store.path = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_environment_overrides_nested_keys() {
        std::env::set_var("ASSET_DISPATCH_OBSERVABILITY__JSON_LOGS", "true");
        let config = DispatchConfig::load(None).unwrap();
        std::env::remove_var("ASSET_DISPATCH_OBSERVABILITY__JSON_LOGS");
        assert!(config.observability.json_logs);
    }
}
