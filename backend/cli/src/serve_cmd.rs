//! `medassist serve`: load the knowledge base, wire providers and run the
//! HTTP gateway until Ctrl-C.

use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use medassist_assistant::{InfoCollector, QueryAnswerer};
use medassist_config::MedAssistConfig;
use medassist_extraction::FormExtractor;
use medassist_gateway::{start_server, GatewayState};
use medassist_knowledge::KnowledgeBase;
use tracing::{info, warn};

use crate::providers;

pub async fn run(config: MedAssistConfig, port: Option<u16>) -> Result<()> {
    let server = config.server.clone().unwrap_or_default();
    let bind: IpAddr = server
        .bind
        .as_deref()
        .unwrap_or("0.0.0.0")
        .parse()
        .context("server.bind is not an IP address")?;
    let addr = SocketAddr::new(bind, port.or(server.port).unwrap_or(8000));

    let state = build_state(&config).await?;

    info!(%addr, "Starting MedAssist gateway");
    start_server(addr, state).await
}

async fn build_state(config: &MedAssistConfig) -> Result<GatewayState> {
    let knowledge_cfg = providers::knowledge_config(config);
    let kb_path = knowledge_cfg
        .path
        .clone()
        .unwrap_or_else(|| "knowledge_base_embeddings_chunked.json".to_string());
    let knowledge = KnowledgeBase::load(Path::new(&kb_path))
        .await
        .with_context(|| format!("Failed to load knowledge base from {kb_path}; run `medassist build-kb` first"))?;
    info!(chunks = knowledge.len(), files = knowledge.files().count(), "Knowledge base loaded");

    let chat = providers::chat_provider(config)?;
    let embeddings = providers::embedding_provider(config, knowledge.dimension())?;

    let collector = InfoCollector::new(chat.clone(), providers::chat_model(config));
    let answerer = QueryAnswerer::new(
        chat.clone(),
        Arc::from(embeddings),
        Arc::new(knowledge),
        providers::answer_settings(config),
    );
    let extractor = match providers::ocr_provider(config) {
        Some(ocr) => Some(Arc::new(FormExtractor::new(ocr, chat, providers::extraction_settings(config)))),
        None => {
            warn!("OCR endpoint or key not configured; /extract will answer 503");
            None
        }
    };

    let extraction = config.extraction.clone().unwrap_or_default();
    let mut state = GatewayState::new(
        Arc::new(collector),
        Arc::new(answerer),
        extractor,
        extraction.ground_truth_dir.unwrap_or_else(|| "gt".to_string()),
    )
    .with_session_ttl(Duration::from_secs(
        config.server.as_ref().and_then(|s| s.session_ttl_secs).unwrap_or(30 * 60),
    ));
    if let Some(reference) = extraction.reference_template {
        state = state.with_reference_template(reference);
    }
    Ok(state)
}
