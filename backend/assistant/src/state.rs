//! Per-session conversation state.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use medassist_core::ChatRole;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fields::UserField;

/// Transcript entries kept per session; older ones are dropped.
pub const MAX_TRANSCRIPT_ENTRIES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// At least one member detail is still missing.
    Collecting,
    /// Everything is collected and awaits the member's confirmation.
    Confirming,
    /// Details confirmed; questions go to the knowledge base.
    QuestionAnswering,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: ChatRole,
    pub content: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    pub session_id: Uuid,
    pub collected: BTreeMap<UserField, String>,
    pub confirmed: bool,
    pub phase: Phase,
    pub transcript: Vec<TranscriptEntry>,
}

impl ConversationState {
    pub fn new(session_id: Uuid) -> Self {
        Self {
            session_id,
            collected: BTreeMap::new(),
            confirmed: false,
            phase: Phase::Collecting,
            transcript: Vec::new(),
        }
    }

    /// Fields not yet collected, in the order they are asked for.
    pub fn missing_fields(&self) -> Vec<UserField> {
        UserField::ALL
            .into_iter()
            .filter(|f| self.collected.get(f).is_none_or(|v| v.trim().is_empty()))
            .collect()
    }

    /// Recompute the phase from the collected data. Question answering is
    /// only ever entered through [`ConversationState::enter_question_answering`].
    pub fn refresh_phase(&mut self) {
        if self.phase == Phase::QuestionAnswering {
            return;
        }
        if self.missing_fields().is_empty() {
            self.phase = Phase::Confirming;
        } else {
            self.phase = Phase::Collecting;
            self.confirmed = false;
        }
    }

    pub fn enter_question_answering(&mut self) {
        self.confirmed = true;
        self.phase = Phase::QuestionAnswering;
    }

    pub fn push_transcript(&mut self, role: ChatRole, content: impl Into<String>) {
        self.transcript.push(TranscriptEntry { role, content: content.into(), at: Utc::now() });
        if self.transcript.len() > MAX_TRANSCRIPT_ENTRIES {
            let excess = self.transcript.len() - MAX_TRANSCRIPT_ENTRIES;
            self.transcript.drain(..excess);
        }
    }

    pub fn last_assistant_message(&self) -> Option<&str> {
        self.transcript
            .iter()
            .rev()
            .find(|e| e.role == ChatRole::Assistant)
            .map(|e| e.content.as_str())
    }

    /// Collected values keyed by field name, as sent to clients and prompts.
    pub fn collected_json(&self) -> serde_json::Map<String, serde_json::Value> {
        self.collected
            .iter()
            .map(|(f, v)| (f.as_str().to_string(), serde_json::Value::String(v.clone())))
            .collect()
    }
}
