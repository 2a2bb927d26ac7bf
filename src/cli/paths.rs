use anyhow::Result;
use std::path::PathBuf;

use crate::config::ConfigStore;

/// Resolve the config file location, falling back to the default path.
pub fn resolve_config_path(config: Option<String>) -> Result<PathBuf> {
    match config {
        Some(path) => Ok(PathBuf::from(path)),
        None => ConfigStore::default_path(),
    }
}
