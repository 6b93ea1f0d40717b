//! Config defaults: fills every unset field after loading.

use crate::schema::{
    ExtractionConfig, KnowledgeConfig, LlmConfig, LoggingConfig, MedAssistConfig, OcrConfig,
    ServerConfig,
};

pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_SESSION_TTL_SECS: u64 = 30 * 60;

pub const DEFAULT_LLM_PROVIDER: &str = "azure";
pub const DEFAULT_LLM_API_VERSION: &str = "2023-07-01-preview";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

pub const DEFAULT_OCR_MODEL: &str = "prebuilt-document";
pub const DEFAULT_OCR_API_VERSION: &str = "2023-07-31";
pub const DEFAULT_OCR_POLL_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_OCR_MAX_POLLS: u32 = 60;

pub const DEFAULT_KNOWLEDGE_PATH: &str = "knowledge_base_embeddings_chunked.json";
pub const DEFAULT_DISTANCE_THRESHOLD: f32 = 0.3;
pub const DEFAULT_MAX_CHUNK_TOKENS: usize = 150;
pub const DEFAULT_DATA_DIR: &str = "./data";

pub const DEFAULT_GROUND_TRUTH_DIR: &str = "gt";

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_LOG_FILE_PREFIX: &str = "medassist.log";

/// Apply all defaults to a freshly loaded config. Values already set win.
pub fn apply_all_defaults(config: MedAssistConfig) -> MedAssistConfig {
    let config = apply_server_defaults(config);
    let config = apply_llm_defaults(config);
    let config = apply_ocr_defaults(config);
    let config = apply_knowledge_defaults(config);
    let config = apply_extraction_defaults(config);
    apply_logging_defaults(config)
}

fn fill<T>(slot: &mut Option<T>, value: impl FnOnce() -> T) {
    if slot.is_none() {
        *slot = Some(value());
    }
}

fn apply_server_defaults(mut config: MedAssistConfig) -> MedAssistConfig {
    let server = config.server.get_or_insert_with(ServerConfig::default);
    fill(&mut server.bind, || DEFAULT_BIND.to_string());
    fill(&mut server.port, || DEFAULT_PORT);
    fill(&mut server.session_ttl_secs, || DEFAULT_SESSION_TTL_SECS);
    config
}

fn apply_llm_defaults(mut config: MedAssistConfig) -> MedAssistConfig {
    let llm = config.llm.get_or_insert_with(LlmConfig::default);
    fill(&mut llm.provider, || DEFAULT_LLM_PROVIDER.to_string());
    fill(&mut llm.api_version, || DEFAULT_LLM_API_VERSION.to_string());
    fill(&mut llm.chat_model, || DEFAULT_CHAT_MODEL.to_string());
    fill(&mut llm.embedding_model, || DEFAULT_EMBEDDING_MODEL.to_string());
    fill(&mut llm.max_tokens, || DEFAULT_MAX_TOKENS);
    config
}

fn apply_ocr_defaults(mut config: MedAssistConfig) -> MedAssistConfig {
    let ocr = config.ocr.get_or_insert_with(OcrConfig::default);
    fill(&mut ocr.model, || DEFAULT_OCR_MODEL.to_string());
    fill(&mut ocr.api_version, || DEFAULT_OCR_API_VERSION.to_string());
    fill(&mut ocr.poll_interval_ms, || DEFAULT_OCR_POLL_INTERVAL_MS);
    fill(&mut ocr.max_polls, || DEFAULT_OCR_MAX_POLLS);
    config
}

fn apply_knowledge_defaults(mut config: MedAssistConfig) -> MedAssistConfig {
    let knowledge = config.knowledge.get_or_insert_with(KnowledgeConfig::default);
    fill(&mut knowledge.path, || DEFAULT_KNOWLEDGE_PATH.to_string());
    fill(&mut knowledge.distance_threshold, || DEFAULT_DISTANCE_THRESHOLD);
    fill(&mut knowledge.max_chunk_tokens, || DEFAULT_MAX_CHUNK_TOKENS);
    fill(&mut knowledge.data_dir, || DEFAULT_DATA_DIR.to_string());
    config
}

fn apply_extraction_defaults(mut config: MedAssistConfig) -> MedAssistConfig {
    let extraction = config.extraction.get_or_insert_with(ExtractionConfig::default);
    fill(&mut extraction.ground_truth_dir, || DEFAULT_GROUND_TRUTH_DIR.to_string());
    config
}

fn apply_logging_defaults(mut config: MedAssistConfig) -> MedAssistConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    fill(&mut logging.level, || DEFAULT_LOG_LEVEL.to_string());
    fill(&mut logging.dir, || DEFAULT_LOG_DIR.to_string());
    fill(&mut logging.file_prefix, || DEFAULT_LOG_FILE_PREFIX.to_string());
    config
}
