//! Chat-completions wire format shared by the Azure and OpenAI-compatible providers.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use medassist_core::{ChatMessage, LlmRequest, MedAssistError};

#[derive(Serialize)]
pub(crate) struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
    pub messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl<'a> ChatRequest<'a> {
    /// Azure addresses the model through the deployment URL, so `model` is
    /// left out of the body there.
    pub fn from_request(request: &'a LlmRequest, include_model: bool) -> Self {
        Self {
            model: include_model.then_some(request.model.as_str()),
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct ChatResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Deserialize)]
pub(crate) struct Choice {
    pub message: ResponseMessage,
}

#[derive(Deserialize)]
pub(crate) struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct Usage {
    pub total_tokens: Option<u64>,
}

/// Check the status and pull `(content, total_tokens)` out of a chat-completions response.
pub(crate) async fn read_chat_response(
    provider: &str,
    response: reqwest::Response,
) -> Result<(String, u64)> {
    let status = response.status();
    if !status.is_success() {
        let error_body = response.text().await.unwrap_or_default();
        return Err(MedAssistError::LlmError {
            provider: provider.to_string(),
            message: format!("{status}: {error_body}"),
        }
        .into());
    }

    let chat_response: ChatResponse = response
        .json()
        .await
        .with_context(|| format!("Failed to parse {provider} response"))?;

    let content = chat_response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default();

    let tokens_used = chat_response
        .usage
        .and_then(|u| u.total_tokens)
        .unwrap_or(0);

    Ok((content.trim().to_string(), tokens_used))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_azure_body_omits_model() {
        let req = LlmRequest::new("gpt-4o").with_message(ChatMessage::user("hello"));
        let body = serde_json::to_value(ChatRequest::from_request(&req, false)).unwrap();
        assert!(body.get("model").is_none());
        assert!(body.get("max_tokens").is_none());
        assert_eq!(body["messages"][0]["role"], "user");
    }

    #[test]
    fn test_openai_body_has_model() {
        let req = LlmRequest::new("gpt-4o").with_max_tokens(10);
        let body = serde_json::to_value(ChatRequest::from_request(&req, true)).unwrap();
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_tokens"], 10);
    }

    #[test]
    fn test_response_null_content() {
        let parsed: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
        assert!(parsed.usage.is_none());
    }
}
