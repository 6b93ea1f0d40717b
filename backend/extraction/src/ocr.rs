//! Optical Character Recognition
//!
//! Sends scanned claim forms to Azure Document Intelligence and collects the
//! recognised lines as plain text.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use medassist_core::MedAssistError;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

pub const DEFAULT_MODEL: &str = "prebuilt-document";
pub const DEFAULT_API_VERSION: &str = "2023-07-31";

/// Accepted upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Jpeg,
    Png,
}

impl DocumentKind {
    pub fn from_file_name(name: &str) -> Result<Self, MedAssistError> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Ok(Self::Pdf),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            _ => Err(MedAssistError::UnsupportedDocument(name.to_string())),
        }
    }

    pub fn from_mime(mime: &str) -> Result<Self, MedAssistError> {
        match mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase().as_str() {
            "application/pdf" => Ok(Self::Pdf),
            "image/jpeg" | "image/jpg" => Ok(Self::Jpeg),
            "image/png" => Ok(Self::Png),
            other => Err(MedAssistError::UnsupportedDocument(other.to_string())),
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OcrOutput {
    /// Recognised lines joined with `\n`, pages in order.
    pub text: String,
    pub page_count: usize,
}

#[async_trait]
pub trait OcrProvider: Send + Sync {
    fn name(&self) -> &str;
    async fn recognize(&self, document: &[u8], kind: DocumentKind) -> Result<OcrOutput>;
}

// ---------------------------------------------------------------------------
// Azure Document Intelligence
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeOperation {
    status: String,
    #[serde(default)]
    analyze_result: Option<AnalyzeResult>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResult {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    lines: Vec<Line>,
}

#[derive(Debug, Deserialize)]
struct Line {
    content: String,
}

impl AnalyzeResult {
    fn into_output(self) -> OcrOutput {
        let page_count = self.pages.len();
        let text = self
            .pages
            .into_iter()
            .flat_map(|p| p.lines.into_iter().map(|l| l.content))
            .collect::<Vec<_>>()
            .join("\n");
        OcrOutput { text, page_count }
    }
}

/// Asynchronous analyze call: submit the document, then poll the
/// `Operation-Location` URL until the job leaves the running states.
pub struct AzureDocumentIntelligence {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    api_version: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl AzureDocumentIntelligence {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            poll_interval: Duration::from_secs(1),
            max_polls: 60,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn with_polling(mut self, interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls.max(1);
        self
    }

    fn analyze_url(&self) -> String {
        format!(
            "{}/formrecognizer/documentModels/{}:analyze?api-version={}",
            self.endpoint, self.model, self.api_version
        )
    }
}

#[async_trait]
impl OcrProvider for AzureDocumentIntelligence {
    fn name(&self) -> &str {
        "azure-document-intelligence"
    }

    async fn recognize(&self, document: &[u8], kind: DocumentKind) -> Result<OcrOutput> {
        let start = Instant::now();
        debug!(model = %self.model, bytes = document.len(), mime = kind.mime(), "Submitting document for analysis");

        let response = self
            .client
            .post(self.analyze_url())
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, kind.mime())
            .body(document.to_vec())
            .send()
            .await
            .context("Document Intelligence HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MedAssistError::OcrError(format!("analyze returned {status}: {body}")).into());
        }

        let operation_url = response
            .headers()
            .get("operation-location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| MedAssistError::OcrError("response had no Operation-Location header".into()))?;

        for attempt in 1..=self.max_polls {
            tokio::time::sleep(self.poll_interval).await;

            let operation: AnalyzeOperation = self
                .client
                .get(&operation_url)
                .header("Ocp-Apim-Subscription-Key", &self.api_key)
                .send()
                .await
                .context("Document Intelligence poll request failed")?
                .json()
                .await
                .context("Failed to parse Document Intelligence poll response")?;

            match operation.status.as_str() {
                "succeeded" => {
                    let output = operation
                        .analyze_result
                        .ok_or_else(|| MedAssistError::OcrError("succeeded without analyzeResult".into()))?
                        .into_output();
                    info!(
                        pages = output.page_count,
                        chars = output.text.chars().count(),
                        latency_ms = start.elapsed().as_millis() as u64,
                        "OCR completed"
                    );
                    return Ok(output);
                }
                "failed" => {
                    let detail = operation.error.map(|e| e.to_string()).unwrap_or_default();
                    return Err(MedAssistError::OcrError(format!("analysis failed: {detail}")).into());
                }
                other => debug!(attempt, status = other, "Analysis still running"),
            }
        }

        Err(MedAssistError::OcrError(format!(
            "analysis did not finish after {} polls",
            self.max_polls
        ))
        .into())
    }
}

// ---------------------------------------------------------------------------
// Static (offline / tests)
// ---------------------------------------------------------------------------

/// Returns fixed text regardless of the document.
pub struct StaticOcr {
    text: String,
}

impl StaticOcr {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl OcrProvider for StaticOcr {
    fn name(&self) -> &str {
        "static"
    }

    async fn recognize(&self, _document: &[u8], _kind: DocumentKind) -> Result<OcrOutput> {
        Ok(OcrOutput { text: self.text.clone(), page_count: 1 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_file_name() {
        assert_eq!(DocumentKind::from_file_name("283_ex1.pdf").unwrap(), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_file_name("scan.JPG").unwrap(), DocumentKind::Jpeg);
        assert_eq!(DocumentKind::from_file_name("scan.png").unwrap(), DocumentKind::Png);
        assert!(matches!(
            DocumentKind::from_file_name("notes.docx"),
            Err(MedAssistError::UnsupportedDocument(_))
        ));
        assert!(DocumentKind::from_file_name("noext").is_err());
    }

    #[test]
    fn test_kind_from_mime() {
        assert_eq!(DocumentKind::from_mime("application/pdf").unwrap(), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_mime("image/png; charset=binary").unwrap(), DocumentKind::Png);
        assert!(DocumentKind::from_mime("text/plain").is_err());
    }

    #[test]
    fn test_analyze_result_joins_pages() {
        let raw = r#"{
            "status": "succeeded",
            "analyzeResult": {"pages": [
                {"lines": [{"content": "טופס 283"}, {"content": "שם משפחה"}]},
                {"lines": [{"content": "חתימה"}]}
            ]}
        }"#;
        let op: AnalyzeOperation = serde_json::from_str(raw).unwrap();
        let output = op.analyze_result.unwrap().into_output();
        assert_eq!(output.page_count, 2);
        assert_eq!(output.text, "טופס 283\nשם משפחה\nחתימה");
    }

    #[test]
    fn test_analyze_url() {
        let ocr = AzureDocumentIntelligence::new("https://ocr.example.com/", "k");
        assert_eq!(
            ocr.analyze_url(),
            "https://ocr.example.com/formrecognizer/documentModels/prebuilt-document:analyze?api-version=2023-07-31"
        );
    }

    #[tokio::test]
    async fn test_static_ocr() {
        let ocr = StaticOcr::new("hello");
        let out = ocr.recognize(b"%PDF", DocumentKind::Pdf).await.unwrap();
        assert_eq!(out.text, "hello");
    }
}
