use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::fs;
use tracing::debug;

/// Upload name up to the first `.`: `283_ex1.pdf` → `283_ex1`.
pub fn document_stem(file_name: &str) -> &str {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    base.split('.').next().unwrap_or(base)
}

/// `<dir>/<stem>_gt.json` for an uploaded document.
pub fn ground_truth_path(dir: &Path, file_name: &str) -> PathBuf {
    dir.join(format!("{}_gt.json", document_stem(file_name)))
}

/// Load the ground truth for `file_name`, `None` when no file exists.
pub async fn load_ground_truth(dir: &Path, file_name: &str) -> Result<Option<Value>> {
    let path = ground_truth_path(dir, file_name);
    if !fs::try_exists(&path).await.unwrap_or(false) {
        debug!(path = %path.display(), "No ground truth for document");
        return Ok(None);
    }
    let raw = fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read ground truth: {}", path.display()))?;
    let value = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid ground truth JSON: {}", path.display()))?;
    Ok(Some(value))
}
