//! MedAssist conversation logic
//!
//! Phase one collects and confirms the member's details through a chat model,
//! validating every value locally. Phase two answers questions from the
//! knowledge base, tailored to the member's HMO and tier.

pub mod answer;
pub mod collector;
pub mod fields;
pub mod prompts;
pub mod state;

pub use answer::{Answer, AnswerSettings, QueryAnswerer, UserProfile};
pub use collector::{FieldUpdate, InfoCollector, ModelReply, TurnOutcome, TurnStatus, CONFIRMED_MESSAGE};
pub use fields::{validate_field, FieldError, Hmo, MembershipTier, UserField};
pub use state::{ConversationState, Phase, TranscriptEntry, MAX_TRANSCRIPT_ENTRIES};
