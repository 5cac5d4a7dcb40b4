//! Load client config and entity declarations from JSON.

use crate::config::FullConfig;
use crate::error::ConfigError;
use std::path::Path;

/// Parse a JSON config document.
pub fn load_from_str(json: &str) -> Result<FullConfig, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::Load(e.to_string()))
}

/// Read and parse a JSON config file.
pub async fn load_from_path(path: impl AsRef<Path>) -> Result<FullConfig, ConfigError> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    let config = load_from_str(&text)?;
    tracing::debug!(path = %path.display(), entities = config.entities.len(), "config loaded");
    Ok(config)
}
