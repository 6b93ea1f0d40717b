pub mod azure_openai;
pub mod mock;
pub mod openai_compat;
mod wire;

use std::sync::Arc;

use medassist_core::LlmProvider;

use self::azure_openai::AzureOpenAIProvider;
use self::mock::MockProvider;
use self::openai_compat::OpenAICompatProvider;

/// Which chat backend to construct, with its connection details.
#[derive(Debug, Clone)]
pub enum ChatProviderKind {
    Azure {
        endpoint: String,
        api_key: String,
        api_version: String,
    },
    OpenAI {
        base_url: Option<String>,
        api_key: String,
    },
    /// Canned replies, for local runs without credentials.
    Mock { response: Option<String> },
}

pub fn create_chat_provider(kind: ChatProviderKind) -> Arc<dyn LlmProvider> {
    match kind {
        ChatProviderKind::Azure { endpoint, api_key, api_version } => {
            Arc::new(AzureOpenAIProvider::new(endpoint, api_key).with_api_version(api_version))
        }
        ChatProviderKind::OpenAI { base_url, api_key } => {
            let provider = OpenAICompatProvider::new(api_key);
            match base_url {
                Some(url) => Arc::new(provider.with_base_url(url)),
                None => Arc::new(provider),
            }
        }
        ChatProviderKind::Mock { response } => {
            let provider = MockProvider::new("mock");
            match response {
                Some(r) => Arc::new(provider.with_response(r)),
                None => Arc::new(provider),
            }
        }
    }
}
