//! Environment handling: `${VAR}` substitution in the raw config tree and
//! the fixed set of environment overrides applied after parsing.
//!
//! Only uppercase `[A-Z_][A-Z0-9_]*` names are substituted. `$${VAR}` is an
//! escape for a literal `${VAR}`.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use tracing::{debug, warn};

use crate::schema::{LlmConfig, LoggingConfig, MedAssistConfig, OcrConfig, ServerConfig};

/// Matches `${VAR}` with an optional leading `$` marking the escape form.
static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\$?)\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references from the process environment.
pub fn resolve_env_vars(value: &Value) -> Result<Value, MissingEnvVarError> {
    resolve_env_vars_with(value, &std::env::vars().collect())
}

/// Substitute `${VAR}` references from `env`. Unset or empty variables are
/// an error naming the config path.
pub fn resolve_env_vars_with(
    value: &Value,
    env: &HashMap<String, String>,
) -> Result<Value, MissingEnvVarError> {
    substitute_value(value, env, "")
}

fn substitute_value(
    value: &Value,
    env: &HashMap<String, String>,
    path: &str,
) -> Result<Value, MissingEnvVarError> {
    match value {
        Value::String(s) => substitute_string(s, env, path).map(Value::String),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map {
                let child = if path.is_empty() { k.clone() } else { format!("{path}.{k}") };
                out.insert(k.clone(), substitute_value(v, env, &child)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(
    s: &str,
    env: &HashMap<String, String>,
    path: &str,
) -> Result<String, MissingEnvVarError> {
    if !s.contains("${") {
        return Ok(s.to_string());
    }

    let mut missing = None;
    let replaced = ENV_VAR_PATTERN.replace_all(s, |caps: &Captures| {
        let name = &caps[2];
        if !caps[1].is_empty() {
            return format!("${{{name}}}");
        }
        match env.get(name) {
            Some(v) if !v.is_empty() => v.clone(),
            _ => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });

    match missing {
        Some(err) => Err(err),
        None => Ok(replaced.into_owned()),
    }
}

/// Names of all variables referenced in a config tree, sorted and deduplicated.
pub fn collect_referenced_vars(value: &Value) -> Vec<String> {
    let mut vars = Vec::new();
    collect_vars(value, &mut vars);
    vars.sort();
    vars.dedup();
    vars
}

fn collect_vars(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.extend(
            ENV_VAR_PATTERN
                .captures_iter(s)
                .filter(|c| c[1].is_empty())
                .map(|c| c[2].to_string()),
        ),
        Value::Array(items) => items.iter().for_each(|v| collect_vars(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_vars(v, out)),
        _ => {}
    }
}

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: MedAssistConfig) -> MedAssistConfig {
    apply_env_overrides_with(config, &std::env::vars().collect())
}

/// Apply the recognised overrides from `env`. Empty values are ignored.
pub fn apply_env_overrides_with(
    mut config: MedAssistConfig,
    env: &HashMap<String, String>,
) -> MedAssistConfig {
    let get = |name: &str| env.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());

    if let Some(port) = get("MEDASSIST_PORT") {
        match port.parse::<u16>() {
            Ok(port) => config.server.get_or_insert_with(ServerConfig::default).port = Some(port),
            Err(_) => warn!(value = port, "Ignoring invalid MEDASSIST_PORT"),
        }
    }
    if let Some(bind) = get("MEDASSIST_BIND") {
        config.server.get_or_insert_with(ServerConfig::default).bind = Some(bind.to_string());
    }
    if let Some(endpoint) = get("AZURE_OPENAI_ENDPOINT") {
        config.llm.get_or_insert_with(LlmConfig::default).endpoint = Some(endpoint.to_string());
    }
    if let Some(key) = get("AZURE_OPENAI_API_KEY") {
        config.llm.get_or_insert_with(LlmConfig::default).api_key = Some(key.to_string());
    }
    if let Some(endpoint) = get("AZURE_OCR_ENDPOINT") {
        config.ocr.get_or_insert_with(OcrConfig::default).endpoint = Some(endpoint.to_string());
    }
    if let Some(key) = get("AZURE_OCR_API_KEY") {
        config.ocr.get_or_insert_with(OcrConfig::default).api_key = Some(key.to_string());
    }
    if let Some(level) = get("RUST_LOG") {
        config.logging.get_or_insert_with(LoggingConfig::default).level = Some(level.to_string());
    }

    debug!("Applied environment overrides");
    config
}
