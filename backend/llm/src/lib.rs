pub mod providers;
pub mod reply;

pub use providers::mock::MockProvider;
pub use providers::{create_chat_provider, ChatProviderKind};
pub use reply::{extract_json_block, parse_model_json};
