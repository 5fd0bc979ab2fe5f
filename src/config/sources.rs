//! Config file sources: global config dir, then workspace
//! `config/config.toml` and `config/{FABULA_ENV}.toml`.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::Path;

/// Add the global config file (platform config dir) to the builder.
pub fn add_global_sources(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let mut builder = builder;
    if let Some(dirs) = directories::ProjectDirs::from("", "", "fabula") {
        let global_path = dirs.config_dir().join("config.toml");
        if global_path.exists() {
            if let Some(path) = global_path.to_str() {
                builder = builder.add_source(File::with_name(path).required(false));
            }
        }
    }
    Ok(builder)
}

/// Add workspace config files to the builder.
/// Precedence: config/config.toml (base) then config/{FABULA_ENV}.toml.
pub fn add_workspace_sources(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let config_dir = workspace_root.join("config");
    let env_name = std::env::var("FABULA_ENV").unwrap_or_else(|_| "development".to_string());

    let mut builder = builder;

    let base_config_path = config_dir.join("config.toml");
    if base_config_path.exists() {
        if let Some(path) = base_config_path.to_str() {
            builder = builder.add_source(File::with_name(path).required(false));
        }
    }

    let env_config_path = config_dir.join(format!("{}.toml", env_name));
    if env_config_path.exists() {
        if let Some(path) = env_config_path.to_str() {
            builder = builder.add_source(File::with_name(path).required(false));
        }
    }

    Ok(builder)
}
