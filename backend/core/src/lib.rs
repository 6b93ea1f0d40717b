pub mod error;
pub mod traits;
pub mod types;

pub use error::MedAssistError;
pub use traits::{ChatMessage, ChatRole, LlmProvider, LlmRequest, LlmResponse};
pub use types::Language;
