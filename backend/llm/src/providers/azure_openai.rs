use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use medassist_core::{LlmProvider, LlmRequest, LlmResponse};

use super::wire::{read_chat_response, ChatRequest};

pub const DEFAULT_API_VERSION: &str = "2023-07-01-preview";

/// Azure OpenAI chat-completions provider. `LlmRequest::model` names the deployment.
pub struct AzureOpenAIProvider {
    client: Client,
    endpoint: String,
    api_key: String,
    api_version: String,
}

impl AzureOpenAIProvider {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    fn completions_url(&self, deployment: &str) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, deployment, self.api_version
        )
    }
}

#[async_trait]
impl LlmProvider for AzureOpenAIProvider {
    fn name(&self) -> &str {
        "azure"
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let start = Instant::now();
        let body = ChatRequest::from_request(request, false);

        debug!(
            deployment = %request.model,
            messages = request.messages.len(),
            "Sending request to Azure OpenAI"
        );

        let response = self
            .client
            .post(self.completions_url(&request.model))
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Azure OpenAI HTTP request failed")?;

        let (content, tokens_used) = read_chat_response(self.name(), response).await?;

        Ok(LlmResponse {
            content,
            provider: self.name().to_string(),
            model: request.model.clone(),
            tokens_used,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}
