use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use medassist_core::{LlmProvider, LlmRequest, LlmResponse};

/// A mock LLM provider that returns canned responses.
///
/// Scripted replies are consumed in order; once the script is exhausted the
/// fixed response (or a default) is returned. Every request is recorded.
pub struct MockProvider {
    name: String,
    fixed_response: Option<String>,
    script: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fixed_response: None,
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.fixed_response = Some(response.into());
        self
    }

    pub fn with_script<I, S>(self, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend(replies.into_iter().map(Into::into));
        self
    }

    /// Requests seen so far, oldest first.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, req: &LlmRequest) -> Result<LlmResponse> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(req.clone());

        let scripted = self.script.lock().unwrap_or_else(|e| e.into_inner()).pop_front();
        let content = scripted
            .or_else(|| self.fixed_response.clone())
            .unwrap_or_else(|| "Mock response".to_string());

        Ok(LlmResponse {
            content,
            provider: self.name.clone(),
            model: req.model.clone(),
            tokens_used: 0,
            latency_ms: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_then_fixed() {
        let mock = MockProvider::new("mock")
            .with_response("fallback")
            .with_script(["first", "second"]);
        let req = LlmRequest::new("gpt-4o");

        assert_eq!(mock.complete(&req).await.unwrap().content, "first");
        assert_eq!(mock.complete(&req).await.unwrap().content, "second");
        assert_eq!(mock.complete(&req).await.unwrap().content, "fallback");
        assert_eq!(mock.requests().len(), 3);
    }
}
