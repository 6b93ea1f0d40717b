//! Builds the chat, embedding and OCR clients described by the config.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use medassist_assistant::AnswerSettings;
use medassist_config::{KnowledgeConfig, LlmConfig, MedAssistConfig, OcrConfig};
use medassist_core::LlmProvider;
use medassist_extraction::{AzureDocumentIntelligence, ExtractionSettings, OcrProvider};
use medassist_knowledge::{
    create_provider, EmbeddingProvider, EmbeddingProviderKind, DEFAULT_DISTANCE_THRESHOLD,
};
use medassist_llm::{create_chat_provider, ChatProviderKind};
use tracing::info;

/// Vector size used by the offline embedding stand-in.
const MOCK_EMBEDDING_DIMENSION: usize = 1536;

fn provider_name(llm: &LlmConfig) -> &str {
    llm.provider.as_deref().unwrap_or("azure")
}

fn required(value: &Option<String>, path: &str) -> Result<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => bail!("{path} is required for this provider"),
    }
}

pub fn is_mock(config: &MedAssistConfig) -> bool {
    config.llm.as_ref().is_some_and(|llm| provider_name(llm) == "mock")
}

pub fn chat_provider(config: &MedAssistConfig) -> Result<Arc<dyn LlmProvider>> {
    let llm = config.llm.clone().unwrap_or_default();
    let kind = match provider_name(&llm) {
        "azure" => ChatProviderKind::Azure {
            endpoint: required(&llm.endpoint, "llm.endpoint")?,
            api_key: required(&llm.api_key, "llm.apiKey")?,
            api_version: llm.api_version.clone().unwrap_or_default(),
        },
        "openai" => ChatProviderKind::OpenAI {
            base_url: llm.endpoint.clone(),
            api_key: required(&llm.api_key, "llm.apiKey")?,
        },
        "mock" => ChatProviderKind::Mock { response: None },
        other => bail!("Unknown llm.provider '{other}'"),
    };
    let provider = create_chat_provider(kind);
    info!(provider = provider.name(), "Chat provider ready");
    Ok(provider)
}

/// `dimension` sizes the mock provider's vectors; real providers ignore it.
pub fn embedding_provider(config: &MedAssistConfig, dimension: usize) -> Result<Box<dyn EmbeddingProvider>> {
    let llm = config.llm.clone().unwrap_or_default();
    let kind = match provider_name(&llm) {
        "azure" => EmbeddingProviderKind::Azure {
            endpoint: required(&llm.endpoint, "llm.endpoint")?,
            api_key: required(&llm.api_key, "llm.apiKey")?,
            deployment: llm.embedding_model.clone(),
            api_version: llm.api_version.clone().unwrap_or_default(),
        },
        "openai" => EmbeddingProviderKind::OpenAI {
            api_key: required(&llm.api_key, "llm.apiKey")?,
            model: llm.embedding_model.clone(),
            base_url: llm.endpoint.clone(),
        },
        "mock" => EmbeddingProviderKind::Static {
            vector: vec![1.0; if dimension == 0 { MOCK_EMBEDDING_DIMENSION } else { dimension }],
        },
        other => bail!("Unknown llm.provider '{other}'"),
    };
    Ok(create_provider(kind))
}

/// Azure Document Intelligence when both endpoint and key are configured.
pub fn ocr_provider(config: &MedAssistConfig) -> Option<Arc<dyn OcrProvider>> {
    let ocr = config.ocr.clone().unwrap_or_default();
    let OcrConfig { endpoint: Some(endpoint), api_key: Some(api_key), .. } = &ocr else {
        return None;
    };
    if endpoint.trim().is_empty() || api_key.trim().is_empty() {
        return None;
    }

    let mut client = AzureDocumentIntelligence::new(endpoint.trim(), api_key.trim());
    if let Some(model) = &ocr.model {
        client = client.with_model(model);
    }
    if let Some(version) = &ocr.api_version {
        client = client.with_api_version(version);
    }
    if let (Some(interval), Some(max_polls)) = (ocr.poll_interval_ms, ocr.max_polls) {
        client = client.with_polling(Duration::from_millis(interval), max_polls);
    }
    Some(Arc::new(client))
}

pub fn extraction_settings(config: &MedAssistConfig) -> ExtractionSettings {
    let defaults = ExtractionSettings::default();
    let llm = config.llm.clone().unwrap_or_default();
    ExtractionSettings {
        model: llm.chat_model.unwrap_or(defaults.model),
        max_tokens: llm.max_tokens.unwrap_or(defaults.max_tokens),
    }
}

pub fn answer_settings(config: &MedAssistConfig) -> AnswerSettings {
    let knowledge = config.knowledge.clone().unwrap_or_default();
    AnswerSettings {
        model: chat_model(config),
        distance_threshold: knowledge.distance_threshold.unwrap_or(DEFAULT_DISTANCE_THRESHOLD),
    }
}

pub fn chat_model(config: &MedAssistConfig) -> String {
    config
        .llm
        .as_ref()
        .and_then(|llm| llm.chat_model.clone())
        .unwrap_or_else(|| "gpt-4o".to_string())
}

pub fn knowledge_config(config: &MedAssistConfig) -> KnowledgeConfig {
    config.knowledge.clone().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use medassist_config::apply_all_defaults;

    fn config(provider: &str) -> MedAssistConfig {
        apply_all_defaults(MedAssistConfig {
            llm: Some(LlmConfig { provider: Some(provider.into()), ..Default::default() }),
            ..Default::default()
        })
    }

    #[test]
    fn test_mock_needs_no_credentials() {
        let cfg = config("mock");
        assert!(is_mock(&cfg));
        assert_eq!(chat_provider(&cfg).unwrap().name(), "mock");
        assert_eq!(embedding_provider(&cfg, 3).unwrap().dimension(), 3);
    }

    #[test]
    fn test_azure_requires_endpoint() {
        let err = chat_provider(&config("azure")).err().unwrap();
        assert!(err.to_string().contains("llm.endpoint"));
    }

    #[test]
    fn test_ocr_needs_endpoint_and_key() {
        let mut cfg = config("mock");
        assert!(ocr_provider(&cfg).is_none());

        let ocr = cfg.ocr.get_or_insert_with(OcrConfig::default);
        ocr.endpoint = Some("https://ocr.example.com".into());
        ocr.api_key = Some("key".into());
        assert_eq!(ocr_provider(&cfg).unwrap().name(), "azure-document-intelligence");
    }

    #[test]
    fn test_settings_follow_config() {
        let mut cfg = config("mock");
        cfg.llm.as_mut().unwrap().chat_model = Some("gpt-4o-mini".into());
        cfg.knowledge.as_mut().unwrap().distance_threshold = Some(0.25);

        assert_eq!(extraction_settings(&cfg).model, "gpt-4o-mini");
        assert_eq!(extraction_settings(&cfg).max_tokens, 1000);
        assert_eq!(answer_settings(&cfg).distance_threshold, 0.25);
    }
}
