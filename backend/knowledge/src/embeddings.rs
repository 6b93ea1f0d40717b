/// Embedding providers for the knowledge base.
///
/// Supports: Azure OpenAI, OpenAI.
/// All providers implement the `EmbeddingProvider` trait.
use anyhow::{Context, Result};
use async_trait::async_trait;
use medassist_core::MedAssistError;
use reqwest::Client;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Return the embedding dimension for this provider/model.
    fn dimension(&self) -> usize;
    /// Embed a single text string.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
    /// Embed a batch of texts (default: sequential).
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

fn model_dimension(model: &str) -> usize {
    if model.contains("3-large") { 3072 } else { 1536 }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
}

fn first_embedding(res: EmbedResponse, provider: &str) -> Result<Vec<f32>> {
    res.data
        .into_iter()
        .next()
        .map(|d| d.embedding)
        .ok_or_else(|| MedAssistError::EmbeddingError(format!("empty {provider} embedding response")).into())
}

// ---------------------------------------------------------------------------
// Azure OpenAI
// ---------------------------------------------------------------------------

pub struct AzureOpenAIEmbeddings {
    endpoint: String,
    api_key: String,
    deployment: String,
    api_version: String,
    dimension: usize,
    client: Client,
}

impl AzureOpenAIEmbeddings {
    pub fn new(endpoint: String, api_key: String, deployment: Option<String>, api_version: String) -> Self {
        let deployment = deployment.unwrap_or_else(|| "text-embedding-ada-002".to_string());
        let dimension = model_dimension(&deployment);
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            deployment,
            api_version,
            dimension,
            client: Client::new(),
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/embeddings?api-version={}",
            self.endpoint, self.deployment, self.api_version
        )
    }
}

#[async_trait]
impl EmbeddingProvider for AzureOpenAIEmbeddings {
    fn dimension(&self) -> usize { self.dimension }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = EmbedRequest { model: None, input: text };
        let res: EmbedResponse = self.client
            .post(self.url())
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Azure OpenAI embeddings request failed")?
            .error_for_status()?
            .json()
            .await?;
        first_embedding(res, "Azure OpenAI")
    }
}

// ---------------------------------------------------------------------------
// OpenAI
// ---------------------------------------------------------------------------

pub struct OpenAIEmbeddings {
    api_key: String,
    model: String,
    base_url: String,
    dimension: usize,
    client: Client,
}

impl OpenAIEmbeddings {
    pub fn new(api_key: String, model: Option<String>, base_url: Option<String>) -> Self {
        let model = model.unwrap_or_else(|| "text-embedding-ada-002".to_string());
        let dimension = model_dimension(&model);
        let base_url = base_url
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string())
            .trim_end_matches('/')
            .to_string();
        Self { api_key, model, base_url, dimension, client: Client::new() }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddings {
    fn dimension(&self) -> usize { self.dimension }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = EmbedRequest { model: Some(&self.model), input: text };
        let res: EmbedResponse = self.client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("OpenAI embeddings request failed")?
            .error_for_status()?
            .json()
            .await?;
        first_embedding(res, "OpenAI")
    }
}

// ---------------------------------------------------------------------------
// Static (tests and offline runs)
// ---------------------------------------------------------------------------

/// Returns a fixed vector for known texts and a default vector otherwise.
pub struct StaticEmbeddings {
    dimension: usize,
    known: Vec<(String, Vec<f32>)>,
    fallback: Vec<f32>,
}

impl StaticEmbeddings {
    pub fn new(fallback: Vec<f32>) -> Self {
        Self { dimension: fallback.len(), known: Vec::new(), fallback }
    }

    pub fn with_text(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.known.push((text.into(), vector));
        self
    }
}

#[async_trait]
impl EmbeddingProvider for StaticEmbeddings {
    fn dimension(&self) -> usize { self.dimension }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self
            .known
            .iter()
            .find(|(t, _)| t == text)
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| self.fallback.clone()))
    }
}

// ---------------------------------------------------------------------------
// Factory from config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum EmbeddingProviderKind {
    Azure { endpoint: String, api_key: String, deployment: Option<String>, api_version: String },
    OpenAI { api_key: String, model: Option<String>, base_url: Option<String> },
    Static { vector: Vec<f32> },
}

pub fn create_provider(kind: EmbeddingProviderKind) -> Box<dyn EmbeddingProvider> {
    match kind {
        EmbeddingProviderKind::Azure { endpoint, api_key, deployment, api_version } => {
            Box::new(AzureOpenAIEmbeddings::new(endpoint, api_key, deployment, api_version))
        }
        EmbeddingProviderKind::OpenAI { api_key, model, base_url } => {
            Box::new(OpenAIEmbeddings::new(api_key, model, base_url))
        }
        EmbeddingProviderKind::Static { vector } => Box::new(StaticEmbeddings::new(vector)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_azure_url() {
        let p = AzureOpenAIEmbeddings::new(
            "https://lab.openai.azure.com/".into(),
            "k".into(),
            None,
            "2023-07-01-preview".into(),
        );
        assert_eq!(
            p.url(),
            "https://lab.openai.azure.com/openai/deployments/text-embedding-ada-002/embeddings?api-version=2023-07-01-preview"
        );
        assert_eq!(p.dimension(), 1536);
    }

    #[test]
    fn test_large_model_dimension() {
        let p = OpenAIEmbeddings::new("k".into(), Some("text-embedding-3-large".into()), None);
        assert_eq!(p.dimension(), 3072);
    }

    #[tokio::test]
    async fn test_static_embeddings() {
        let p = StaticEmbeddings::new(vec![0.0, 1.0]).with_text("dental", vec![1.0, 0.0]);
        assert_eq!(p.embed("dental").await.unwrap(), vec![1.0, 0.0]);
        assert_eq!(p.embed("other").await.unwrap(), vec![0.0, 1.0]);
        let batch = p.embed_batch(&["dental", "x"]).await.unwrap();
        assert_eq!(batch.len(), 2);
    }
}
