use thiserror::Error;

/// Top-level error type shared by the medassist crates.
#[derive(Debug, Error)]
pub enum MedAssistError {
    #[error("LLM provider error ({provider}): {message}")]
    LlmError { provider: String, message: String },

    #[error("embedding provider error: {0}")]
    EmbeddingError(String),

    #[error("OCR error: {0}")]
    OcrError(String),

    #[error("malformed model reply: {0}")]
    MalformedModelReply(String),

    #[error("knowledge base error: {0}")]
    KnowledgeBase(String),

    #[error("no relevant information found in the knowledge base")]
    NoRelevantContext,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("unsupported document type: {0}")]
    UnsupportedDocument(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MedAssistError {
    /// True for errors caused by the caller's input rather than by a backend.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            MedAssistError::Validation(_) | MedAssistError::UnsupportedDocument(_)
        )
    }
}
