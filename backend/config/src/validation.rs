//! Config validation with user-facing messages.

use thiserror::Error;

use crate::schema::MedAssistConfig;

pub const KNOWN_LLM_PROVIDERS: [&str; 3] = ["azure", "openai", "mock"];

/// A problem found at a config path.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError { path: path.into(), message: message.into() });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError { path: path.into(), message: message.into() });
    }
}

/// Validate the config and return every error and warning found.
pub fn validate(config: &MedAssistConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(config, &mut report);
    validate_llm(config, &mut report);
    validate_ocr(config, &mut report);
    validate_knowledge(config, &mut report);
    validate_extraction(config, &mut report);
    report
}

fn is_blank(value: Option<&str>) -> bool {
    value.map(str::trim).is_none_or(str::is_empty)
}

fn validate_server(config: &MedAssistConfig, report: &mut ValidationReport) {
    let Some(server) = &config.server else { return };
    if server.port == Some(0) {
        report.error("server.port", "port must be between 1 and 65535");
    }
    if server.session_ttl_secs == Some(0) {
        report.error("server.sessionTtlSecs", "sessionTtlSecs must be > 0");
    }
    if let Some(bind) = &server.bind {
        if bind.parse::<std::net::IpAddr>().is_err() {
            report.error("server.bind", format!("'{bind}' is not an IP address"));
        }
    }
}

fn validate_llm(config: &MedAssistConfig, report: &mut ValidationReport) {
    let Some(llm) = &config.llm else { return };
    let provider = llm.provider.as_deref().unwrap_or("azure");

    if !KNOWN_LLM_PROVIDERS.contains(&provider) {
        report.error(
            "llm.provider",
            format!("Unknown provider '{provider}'. Use 'azure', 'openai', or 'mock'"),
        );
        return;
    }
    if provider == "mock" {
        return;
    }
    if is_blank(llm.api_key.as_deref()) {
        report.warn("llm.apiKey", "No API key configured; chat and embedding calls will fail");
    }
    if provider == "azure" && is_blank(llm.endpoint.as_deref()) {
        report.warn("llm.endpoint", "Azure OpenAI requires an endpoint");
    }
    if let Some(t) = llm.temperature {
        if !(0.0..=2.0).contains(&t) {
            report.error("llm.temperature", "temperature must be in [0, 2]");
        }
    }
    if llm.max_tokens == Some(0) {
        report.error("llm.maxTokens", "maxTokens must be > 0");
    }
}

fn validate_ocr(config: &MedAssistConfig, report: &mut ValidationReport) {
    let Some(ocr) = &config.ocr else { return };
    if !is_blank(ocr.endpoint.as_deref()) && is_blank(ocr.api_key.as_deref()) {
        report.warn("ocr.apiKey", "OCR endpoint is set but no API key is configured");
    }
    if ocr.max_polls == Some(0) {
        report.error("ocr.maxPolls", "maxPolls must be >= 1");
    }
}

fn validate_knowledge(config: &MedAssistConfig, report: &mut ValidationReport) {
    let Some(knowledge) = &config.knowledge else { return };
    if let Some(threshold) = knowledge.distance_threshold {
        if !(0.0..=2.0).contains(&threshold) {
            report.error(
                "knowledge.distanceThreshold",
                format!("{threshold} is outside the cosine distance range [0, 2]"),
            );
        }
    }
    if knowledge.max_chunk_tokens == Some(0) {
        report.error("knowledge.maxChunkTokens", "maxChunkTokens must be > 0");
    }
}

fn validate_extraction(config: &MedAssistConfig, report: &mut ValidationReport) {
    let Some(extraction) = &config.extraction else { return };
    if let Some(reference) = &extraction.reference_template {
        if !reference.is_object() {
            report.error("extraction.referenceTemplate", "referenceTemplate must be a JSON object");
        }
    }
}
