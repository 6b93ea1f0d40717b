use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use medassist_core::{Language, LlmProvider, LlmRequest};
use medassist_llm::parse_model_json;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::cleanup::clean_numeric_fields;
use crate::ocr::{DocumentKind, OcrProvider};
use crate::prompt::build_extraction_messages;
use crate::schema::{conform_to_template, detect_record_language, template};

#[derive(Debug, Clone)]
pub struct ExtractionSettings {
    /// Chat model or Azure deployment.
    pub model: String,
    pub max_tokens: u32,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self { model: "gpt-4o".to_string(), max_tokens: 1000 }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractedForm {
    pub language: Language,
    pub record: Value,
    pub ocr_text: String,
}

impl ExtractedForm {
    /// Indented JSON of the record with Hebrew left unescaped.
    pub fn to_pretty_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.record).context("Failed to serialize extracted record")
    }
}

/// OCR → prompt → chat completion → schema-conformant record.
pub struct FormExtractor {
    ocr: Arc<dyn OcrProvider>,
    llm: Arc<dyn LlmProvider>,
    settings: ExtractionSettings,
}

impl FormExtractor {
    pub fn new(ocr: Arc<dyn OcrProvider>, llm: Arc<dyn LlmProvider>, settings: ExtractionSettings) -> Self {
        Self { ocr, llm, settings }
    }

    pub async fn extract(&self, document: &[u8], kind: DocumentKind) -> Result<ExtractedForm> {
        let output = self
            .ocr
            .recognize(document, kind)
            .await
            .with_context(|| format!("OCR via {} failed", self.ocr.name()))?;
        self.extract_from_text(&output.text).await
    }

    /// Run the model step on already recognised text.
    pub async fn extract_from_text(&self, ocr_text: &str) -> Result<ExtractedForm> {
        let start = Instant::now();
        let ocr_text = clean_numeric_fields(ocr_text);

        let request = LlmRequest::new(&self.settings.model)
            .with_messages(build_extraction_messages(&ocr_text))
            .with_max_tokens(self.settings.max_tokens);
        let response = self.llm.complete(&request).await?;
        let reply = parse_model_json(&response.content)?;

        let language = detect_record_language(&reply).unwrap_or_else(|| {
            let fallback = Language::detect(&ocr_text);
            warn!(%fallback, "Model reply matches neither template; using OCR text language");
            fallback
        });
        let record = conform_to_template(&reply, &template(language));

        info!(
            %language,
            provider = %response.provider,
            tokens = response.tokens_used,
            latency_ms = start.elapsed().as_millis() as u64,
            "Form extracted"
        );

        Ok(ExtractedForm { language, record, ocr_text })
    }
}
