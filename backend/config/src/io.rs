//! Locating and reading the config file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::fs;
use tracing::{debug, info};

const CONFIG_FILE_NAME: &str = "config.yaml";

/// `MEDASSIST_CONFIG_DIR` if set, else `~/.medassist/`.
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("MEDASSIST_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    match dirs::home_dir() {
        Some(home) => home.join(".medassist"),
        None => PathBuf::from(".medassist"),
    }
}

/// Resolve the config file: an explicit path, else `MEDASSIST_CONFIG`, else
/// `config.yaml` in [`config_dir`].
pub fn config_file_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Some(path) = std::env::var_os("MEDASSIST_CONFIG").filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    config_dir().join(CONFIG_FILE_NAME)
}

/// Read the file as an untyped tree so `${VAR}` can appear in any field.
/// A missing file or an empty document yields an empty object.
pub async fn load_raw_config(path: &Path) -> Result<Value> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(Value::Object(Default::default()));
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let value: Value = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(match value {
        Value::Null => Value::Object(Default::default()),
        other => other,
    })
}
