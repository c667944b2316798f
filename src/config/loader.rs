//! Configuration file discovery and loading.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::ProvisionConfig;
use crate::error::{ProvisionError, Result};

/// System-wide configuration location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/ec-provision/config.yml";

/// Load configuration.
///
/// An explicit path must exist. Without one, the system-wide file is used
/// when present and defaults otherwise.
pub fn load_config(explicit: Option<&Path>) -> Result<ProvisionConfig> {
    match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(ProvisionError::ConfigNotFound {
                    path: path.to_path_buf(),
                });
            }
            load_config_file(path)
        }
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default.exists() {
                load_config_file(&default)
            } else {
                tracing::debug!("No config at {}, using defaults", DEFAULT_CONFIG_PATH);
                Ok(ProvisionConfig::default())
            }
        }
    }
}

/// Parse and validate a single configuration file.
pub fn load_config_file(path: &Path) -> Result<ProvisionConfig> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content).map_err(|e| ProvisionError::ConfigParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    config.validate()?;
    tracing::debug!("Loaded config from {}", path.display());
    Ok(config)
}

fn parse_config(content: &str) -> std::result::Result<ProvisionConfig, serde_yaml::Error> {
    // An empty document deserializes to unit, not to a mapping.
    if content.trim().is_empty() {
        return Ok(ProvisionConfig::default());
    }
    serde_yaml::from_str(content)
}
