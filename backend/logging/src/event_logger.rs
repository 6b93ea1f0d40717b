//! Conversation Event Logger
//!
//! Structured per-session events written through `tracing` on the
//! `conversation_events` target, so they land in the rolling NDJSON files.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationEvent {
    UserMessage { content: String },
    AssistantMessage { content: String },
    FieldAccepted { field: String },
    FieldRejected { field: String, reason: String },
    PhaseTransition { from: String, to: String },
    Error { message: String },
}

impl ConversationEvent {
    fn redacted(mut self) -> Self {
        match &mut self {
            ConversationEvent::UserMessage { content } | ConversationEvent::AssistantMessage { content } => {
                *content = redact_sensitive_data(content);
            }
            ConversationEvent::FieldRejected { reason, .. } => {
                *reason = redact_sensitive_data(reason);
            }
            ConversationEvent::Error { message } => {
                *message = redact_sensitive_data(message);
            }
            ConversationEvent::FieldAccepted { .. } | ConversationEvent::PhaseTransition { .. } => {}
        }
        self
    }
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: ConversationEvent,
}

impl EventLogEntry {
    pub fn new(session_id: &str, event: ConversationEvent) -> Self {
        Self { session_id: session_id.into(), timestamp: Utc::now(), event: event.redacted() }
    }
}

pub struct EventLogger;

impl EventLogger {
    /// Redact and emit one event.
    pub fn log_event(session_id: &str, event: ConversationEvent) {
        let entry = EventLogEntry::new(session_id, event);
        let json = serde_json::to_string(&entry).unwrap_or_default();
        info!(target: "conversation_events", session_id, event = %json, "Conversation event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_is_redacted() {
        let entry = EventLogEntry::new(
            "s1",
            ConversationEvent::UserMessage { content: "my id is 123456789".into() },
        );
        assert_eq!(entry.event, ConversationEvent::UserMessage { content: "my id is [REDACTED_ID]".into() });
    }

    #[test]
    fn test_entry_serialization() {
        let entry = EventLogEntry::new(
            "s1",
            ConversationEvent::PhaseTransition { from: "confirming".into(), to: "question_answering".into() },
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["event"]["type"], "phase_transition");
        assert_eq!(json["event"]["to"], "question_answering");
        assert_eq!(json["session_id"], "s1");
    }
}
