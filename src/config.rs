//! Configuration System
//!
//! Layered configuration for the fabula store and CLI: serde defaults,
//! then a global config file, then workspace `config/config.toml` and an
//! environment-named overlay. Logging env-var overrides are handled by the
//! logging module at init time.

use crate::error::CommandError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod sources;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FabulaConfig {
    /// Workspace root path (defaults to current directory)
    #[serde(default)]
    pub workspace_root: Option<PathBuf>,

    /// Storage settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Storage settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Store directory. Resolved against the platform data directory when
    /// unset.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolve the store directory: explicit setting, then the platform
    /// data dir, then a workspace-local fallback.
    pub fn resolve_data_dir(&self, workspace_root: &Path) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        if let Some(dirs) = directories::ProjectDirs::from("", "", "fabula") {
            return dirs.data_local_dir().join("store");
        }
        workspace_root.join(".fabula").join("store")
    }

    fn validate(&self) -> Result<(), String> {
        if let Some(dir) = &self.data_dir {
            if dir.as_os_str().is_empty() {
                return Err("Store data_dir cannot be empty".to_string());
            }
        }
        Ok(())
    }
}

impl FabulaConfig {
    /// Validate the full configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.storage.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Configuration loading facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence (lowest to highest): defaults, global config file,
    /// workspace `config/config.toml`, workspace `config/{FABULA_ENV}.toml`.
    pub fn load(workspace_root: &Path) -> Result<FabulaConfig, CommandError> {
        let mut builder = config::Config::builder();
        builder = sources::add_global_sources(builder)
            .map_err(|e| CommandError::Config(e.to_string()))?;
        builder = sources::add_workspace_sources(builder, workspace_root)
            .map_err(|e| CommandError::Config(e.to_string()))?;
        let raw = builder
            .build()
            .map_err(|e| CommandError::Config(e.to_string()))?;
        let loaded: FabulaConfig = raw
            .try_deserialize()
            .map_err(|e| CommandError::Config(e.to_string()))?;
        loaded.validate().map_err(CommandError::Config)?;
        Ok(loaded)
    }

    /// Load configuration from one explicit file, skipping discovery.
    pub fn load_from_file(path: &Path) -> Result<FabulaConfig, CommandError> {
        let raw = config::Config::builder()
            .add_source(config::File::from(path.to_path_buf()).required(true))
            .build()
            .map_err(|e| CommandError::Config(e.to_string()))?;
        let loaded: FabulaConfig = raw
            .try_deserialize()
            .map_err(|e| CommandError::Config(e.to_string()))?;
        loaded.validate().map_err(CommandError::Config)?;
        Ok(loaded)
    }

    /// Write a starter workspace config file. Refuses to overwrite.
    pub fn write_default(workspace_root: &Path) -> Result<PathBuf, CommandError> {
        let config_dir = workspace_root.join("config");
        let path = config_dir.join("config.toml");
        if path.exists() {
            return Err(CommandError::Config(format!(
                "config file already exists: {}",
                path.display()
            )));
        }
        std::fs::create_dir_all(&config_dir)
            .map_err(|e| CommandError::Config(format!("Failed to create config dir: {}", e)))?;
        let rendered = toml::to_string_pretty(&FabulaConfig::default())
            .map_err(|e| CommandError::Config(format!("Failed to render config: {}", e)))?;
        std::fs::write(&path, rendered)
            .map_err(|e| CommandError::Config(format!("Failed to write config: {}", e)))?;
        Ok(path)
    }
}
