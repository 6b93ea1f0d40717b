//! Phase one: collecting and confirming member details.
//!
//! The chat model drives the dialogue, but every value it proposes is
//! validated locally before it is stored, and the move to question answering
//! is gated on the collected data rather than on the model's say-so.

use std::sync::Arc;

use anyhow::Result;
use medassist_core::{ChatRole, LlmProvider, LlmRequest, MedAssistError};
use medassist_llm::parse_model_json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::fields::{validate_field, UserField};
use crate::prompts::{collecting_prompt, confirming_prompt};
use crate::state::{ConversationState, Phase};

pub const CONFIRMED_MESSAGE: &str = "Thank you for confirming! You can now ask questions.";
pub const ALREADY_CONFIRMED_MESSAGE: &str = "Your details are already confirmed. You can ask questions now.";
const PARSE_ERROR_MESSAGE: &str = "There was an issue processing your input. Please try again.";
const STRUCTURE_ERROR_MESSAGE: &str = "An unexpected issue occurred. Please try again.";
const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred. Please try again later.";
const INVALID_INPUT_MESSAGE: &str = "Invalid input. Please provide the required information.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnStatus {
    Success,
    Pending,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub status: TurnStatus,
    pub response: String,
    pub collected_data: Map<String, Value>,
    pub confirmation_status: bool,
    pub transition_to_qa: bool,
    pub phase: Phase,
    /// What happened to the value proposed this turn, if any.
    #[serde(skip)]
    pub field_update: Option<FieldUpdate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate {
    Accepted(UserField),
    Rejected { field: UserField, reason: String },
}

/// The structured reply the model is asked to produce.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelReply {
    pub field_to_update: Option<String>,
    pub value: Option<String>,
    pub message_to_user: String,
    pub confirmation_status: bool,
    pub transition_to_qa: bool,
}

const REQUIRED_KEYS: [&str; 3] = ["confirmation_status", "message_to_user", "transition_to_qa"];

impl ModelReply {
    /// Parse raw model output. Fails with `MalformedModelReply` when the text
    /// is not a JSON object or lacks one of the required keys.
    pub fn parse(raw: &str) -> Result<Self, MedAssistError> {
        let value = parse_model_json(raw)?;
        let Value::Object(obj) = value else {
            return Err(MedAssistError::MalformedModelReply("reply is not a JSON object".into()));
        };
        if let Some(key) = REQUIRED_KEYS.iter().find(|k| !obj.contains_key(**k)) {
            return Err(MedAssistError::MalformedModelReply(format!("reply is missing '{key}'")));
        }

        Ok(Self {
            field_to_update: obj.get("field_to_update").and_then(scalar_text),
            value: obj.get("value").and_then(scalar_text),
            message_to_user: obj.get("message_to_user").and_then(scalar_text).unwrap_or_default(),
            confirmation_status: truthy(&obj["confirmation_status"]),
            transition_to_qa: truthy(&obj["transition_to_qa"]),
        })
    }
}

/// Strings as-is, numbers and booleans stringified, everything else absent.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

pub struct InfoCollector {
    llm: Arc<dyn LlmProvider>,
    model: String,
}

impl InfoCollector {
    pub fn new(llm: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self { llm, model: model.into() }
    }

    /// Run one user turn against `state`. Only `Error` outcomes leave the
    /// state untouched.
    pub async fn handle_turn(&self, state: &mut ConversationState, user_input: &str) -> TurnOutcome {
        state.refresh_phase();
        let phase_before = state.phase;

        if phase_before == Phase::QuestionAnswering {
            return outcome(state, TurnStatus::Success, ALREADY_CONFIRMED_MESSAGE, true);
        }

        let missing = state.missing_fields();
        debug!(session_id = %state.session_id, ?phase_before, missing = missing.len(), "Collecting user information");

        let collected = state.collected_json();
        let previous = state.last_assistant_message().unwrap_or_default();
        let prompt = if missing.is_empty() {
            confirming_prompt(&collected, user_input, previous, state.confirmed)
        } else {
            collecting_prompt(&collected, user_input, previous, state.confirmed)
        };

        let request = LlmRequest::system_only(&self.model, prompt);
        let raw = match self.llm.complete(&request).await {
            Ok(response) => response.content,
            Err(e) => {
                error!(session_id = %state.session_id, error = %e, "Chat completion failed");
                return outcome(state, TurnStatus::Error, INTERNAL_ERROR_MESSAGE, false);
            }
        };

        let reply = match ModelReply::parse(&raw) {
            Ok(reply) => reply,
            Err(e) => {
                error!(session_id = %state.session_id, error = %e, "Invalid model reply");
                let message = if parse_model_json(&raw).is_ok() {
                    STRUCTURE_ERROR_MESSAGE
                } else {
                    PARSE_ERROR_MESSAGE
                };
                return outcome(state, TurnStatus::Error, message, false);
            }
        };

        state.push_transcript(ChatRole::User, user_input);
        let result = self.apply_reply(state, phase_before, !missing.is_empty(), reply);
        state.push_transcript(ChatRole::Assistant, result.response.clone());
        result
    }

    fn apply_reply(
        &self,
        state: &mut ConversationState,
        phase_before: Phase,
        collecting: bool,
        reply: ModelReply,
    ) -> TurnOutcome {
        let value = reply.value.as_deref().map(str::trim).filter(|v| !v.is_empty());

        let Some(value) = value else {
            if collecting {
                warn!(session_id = %state.session_id, field = ?reply.field_to_update, "No value in reply, re-prompting");
                let message = non_empty(&reply.message_to_user).unwrap_or(INVALID_INPUT_MESSAGE);
                return outcome(state, TurnStatus::Pending, message, false);
            }
            return self.settle_confirmation(state, phase_before, &reply, false);
        };

        let field = match reply.field_to_update.as_deref().map(str::parse::<UserField>) {
            Some(Ok(field)) => field,
            other => {
                warn!(session_id = %state.session_id, field = ?reply.field_to_update, "Reply names no known field");
                let message = match other {
                    Some(Err(e)) => format!("{e} Please try again."),
                    _ => non_empty(&reply.message_to_user).unwrap_or(INVALID_INPUT_MESSAGE).to_string(),
                };
                return outcome(state, TurnStatus::Pending, &message, false);
            }
        };

        match validate_field(field, value) {
            Ok(accepted) => {
                info!(session_id = %state.session_id, %field, "Field accepted");
                state.collected.insert(field, accepted);
            }
            Err(e) => {
                warn!(session_id = %state.session_id, %field, reason = %e, "Field rejected");
                let mut rejected = outcome(state, TurnStatus::Pending, &format!("{e} Please try again."), false);
                rejected.field_update = Some(FieldUpdate::Rejected { field, reason: e.0 });
                return rejected;
            }
        }

        let mut settled = self.settle_confirmation(state, phase_before, &reply, phase_before == Phase::Confirming);
        settled.field_update = Some(FieldUpdate::Accepted(field));
        settled
    }

    /// Apply the model's confirmation flags after any field update.
    fn settle_confirmation(
        &self,
        state: &mut ConversationState,
        phase_before: Phase,
        reply: &ModelReply,
        corrected: bool,
    ) -> TurnOutcome {
        let confirmed = reply.confirmation_status && !corrected;
        let complete = state.missing_fields().is_empty();
        let transition =
            reply.transition_to_qa && confirmed && complete && phase_before == Phase::Confirming;

        if reply.transition_to_qa && !transition {
            debug!(session_id = %state.session_id, confirmed, complete, ?phase_before, "Ignoring premature transition");
        }

        if transition {
            state.enter_question_answering();
            info!(session_id = %state.session_id, "Transitioning to Q&A phase");
            return outcome(state, TurnStatus::Success, CONFIRMED_MESSAGE, true);
        }

        state.confirmed = confirmed && complete;
        state.refresh_phase();
        outcome(state, TurnStatus::Success, &reply.message_to_user, false)
    }
}

fn non_empty(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty()).then_some(s)
}

fn outcome(state: &ConversationState, status: TurnStatus, response: &str, transition_to_qa: bool) -> TurnOutcome {
    TurnOutcome {
        status,
        response: response.to_string(),
        collected_data: state.collected_json(),
        confirmation_status: state.confirmed,
        transition_to_qa,
        phase: state.phase,
        field_update: None,
    }
}
