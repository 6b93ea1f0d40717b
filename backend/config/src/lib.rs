//! `medassist-config`: MedAssist runtime configuration.
//!
//! Provides:
//! - Typed config schema (server, LLM, OCR, knowledge base, extraction, logging)
//! - YAML loading with `${ENV_VAR}` substitution
//! - Environment overrides for deployment secrets
//! - Default value application
//! - Validation and redaction for safe display

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{
    apply_env_overrides, apply_env_overrides_with, collect_referenced_vars, resolve_env_vars,
    resolve_env_vars_with, MissingEnvVarError,
};
pub use io::{config_dir, config_file_path, load_raw_config};
pub use redact::redact;
pub use schema::{
    ExtractionConfig, KnowledgeConfig, LlmConfig, LoggingConfig, MedAssistConfig, OcrConfig,
    ServerConfig,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::Value;

/// Load a config file using the process environment.
///
/// This is the main entry point for loading a config at runtime.
pub async fn load_and_prepare(path: &Path) -> Result<MedAssistConfig> {
    let raw = load_raw_config(path).await?;
    prepare(raw, &std::env::vars().collect())
}

/// Substitute, parse, override, default and validate a raw config tree.
/// Warnings are logged; any validation error fails the load.
pub fn prepare(raw: Value, env: &HashMap<String, String>) -> Result<MedAssistConfig> {
    let value = resolve_env_vars_with(&raw, env).context("Failed to resolve env vars in config")?;

    let config: MedAssistConfig =
        serde_json::from_value(value).context("Failed to deserialize config")?;

    let config = apply_all_defaults(apply_env_overrides_with(config, env));

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if let Some(first) = report.errors.into_iter().next() {
        bail!(first);
    }

    Ok(config)
}
