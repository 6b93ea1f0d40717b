//! Structured logging for MedAssist.
//!
//! Console plus daily-rotated JSON file output, redaction of member
//! identifiers and credentials, and conversation event records.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{ConversationEvent, EventLogEntry, EventLogger};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
