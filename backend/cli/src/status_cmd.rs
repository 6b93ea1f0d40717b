//! `medassist status`: query a running gateway's `/health` and show the
//! effective configuration with credentials masked.

use std::time::Duration;

use anyhow::{Context, Result};
use medassist_config::{redact, MedAssistConfig};

use crate::terminal_output::{heading, note_info, note_warn};

/// Loopback when the server binds every interface.
fn health_url(config: &MedAssistConfig) -> String {
    let server = config.server.clone().unwrap_or_default();
    let host = match server.bind.as_deref() {
        None | Some("0.0.0.0") => "127.0.0.1".to_string(),
        Some("::") => "[::1]".to_string(),
        Some(bind) if bind.contains(':') => format!("[{bind}]"),
        Some(bind) => bind.to_string(),
    };
    format!("http://{host}:{}/health", server.port.unwrap_or(8000))
}

pub async fn run(config: &MedAssistConfig) -> Result<()> {
    let url = health_url(config);
    let client = reqwest::Client::builder().timeout(Duration::from_secs(5)).build()?;

    heading("Gateway");
    match client.get(&url).send().await {
        Ok(resp) => {
            let body: serde_json::Value = resp.json().await.context("Invalid /health response")?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Err(e) => note_warn(&format!("MedAssist is not reachable at {url} ({e})")),
    }

    heading("Configuration");
    let value = serde_json::to_value(config).context("Failed to serialize config")?;
    println!("{}", serde_json::to_string_pretty(&redact(&value))?);
    note_info("API keys are masked");
    Ok(())
}
