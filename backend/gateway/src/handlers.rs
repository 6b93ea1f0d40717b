//! API request handlers.

use axum::{
    extract::{rejection::JsonRejection, Multipart, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use medassist_assistant::{
    validate_field, ConversationState, FieldUpdate, Phase, TurnOutcome, TurnStatus, UserField,
    UserProfile,
};
use medassist_core::ChatRole;
use medassist_extraction::{
    document_stem, load_ground_truth, template, validate_dynamic, validate_with_ground_truth,
    DocumentKind,
};
use medassist_logging::{ConversationEvent, EventLogger};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::server::GatewayState;
use crate::types::{
    AnswerRequest, AnswerResponse, CollectRequest, ExtractQuery, HealthResponse, ValidatedExtraction,
    ValidationOutcome, WelcomeResponse,
};

/// GET /
pub async fn root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse { message: "Welcome to the Medical Chatbot API" })
}

/// GET /health
pub async fn health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "medassist",
        version: env!("CARGO_PKG_VERSION"),
        sessions: state.sessions.len().await,
        knowledge_chunks: state.answerer.knowledge().len(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}

fn parse_session_id(raw: Option<&str>) -> Result<Uuid, ApiError> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty()).ok_or_else(|| {
        warn!("Session ID is missing in the request");
        ApiError::bad_request("Session ID is required.")
    })?;
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request("Invalid session ID format."))
}

/// Build a new session from whatever the client already holds. Values that
/// fail validation are dropped.
fn seed_state(session_id: Uuid, req: &CollectRequest) -> ConversationState {
    let mut state = ConversationState::new(session_id);
    if let Some(collected) = &req.collected_data {
        for (key, value) in collected {
            let (Ok(field), Some(value)) = (key.parse::<UserField>(), value.as_str()) else {
                debug!(%session_id, key, "Ignoring unknown seeded field");
                continue;
            };
            if let Ok(value) = validate_field(field, value) {
                state.collected.insert(field, value);
            }
        }
    }
    if let Some(previous) = req.previous_gpt_output.as_deref().filter(|p| !p.trim().is_empty()) {
        state.push_transcript(ChatRole::Assistant, previous);
    }
    state.refresh_phase();
    state.confirmed = req.confirmation_status.unwrap_or(false) && state.missing_fields().is_empty();
    info!(%session_id, seeded = state.collected.len(), "Created conversation session");
    state
}

fn log_turn(session_id: &str, outcome: &TurnOutcome, phase_before: Phase) {
    match &outcome.field_update {
        Some(FieldUpdate::Accepted(field)) => {
            EventLogger::log_event(session_id, ConversationEvent::FieldAccepted { field: field.to_string() })
        }
        Some(FieldUpdate::Rejected { field, reason }) => EventLogger::log_event(
            session_id,
            ConversationEvent::FieldRejected { field: field.to_string(), reason: reason.clone() },
        ),
        None => {}
    }
    if outcome.status == TurnStatus::Error {
        EventLogger::log_event(session_id, ConversationEvent::Error { message: outcome.response.clone() });
    } else {
        EventLogger::log_event(
            session_id,
            ConversationEvent::AssistantMessage { content: outcome.response.clone() },
        );
    }
    if outcome.phase != phase_before {
        EventLogger::log_event(
            session_id,
            ConversationEvent::PhaseTransition {
                from: phase_name(phase_before),
                to: phase_name(outcome.phase),
            },
        );
    }
}

fn phase_name(phase: Phase) -> String {
    match phase {
        Phase::Collecting => "collecting",
        Phase::Confirming => "confirming",
        Phase::QuestionAnswering => "question_answering",
    }
    .to_string()
}

/// POST /collect_user_info
///
/// Runs one phase-one turn. Model trouble is reported in the body
/// (`status: "error" | "pending"`), not as an HTTP error.
pub async fn collect_user_info(
    State(state): State<GatewayState>,
    payload: Result<Json<CollectRequest>, JsonRejection>,
) -> Result<Json<TurnOutcome>, ApiError> {
    info!("Received request to collect user information");
    let Json(req) = payload?;
    let session_id = parse_session_id(req.session_id.as_deref())?;
    let sid = session_id.to_string();

    let session = state
        .sessions
        .get_or_create(session_id, || seed_state(session_id, &req))
        .await;
    let mut conversation = session.lock().await;

    EventLogger::log_event(&sid, ConversationEvent::UserMessage { content: req.user_input.clone() });
    let phase_before = conversation.phase;

    let outcome = state.collector.handle_turn(&mut conversation, &req.user_input).await;
    log_turn(&sid, &outcome, phase_before);

    Ok(Json(outcome))
}

/// POST /answer_query
pub async fn answer_query(
    State(state): State<GatewayState>,
    payload: Result<Json<AnswerRequest>, JsonRejection>,
) -> Result<Json<AnswerResponse>, ApiError> {
    info!("Received request to answer user query");
    let Json(req) = payload?;
    let question = req.question.as_deref().map(str::trim).unwrap_or_default();
    let user_info = match &req.user_info {
        Some(info @ Value::Object(map)) if !map.is_empty() && !question.is_empty() => info,
        _ => {
            warn!("User info or question is missing in the request");
            return Err(ApiError::bad_request("User info and question are required"));
        }
    };

    let profile = UserProfile::from_json(user_info)?;
    let answer = state.answerer.answer(&profile, question).await?;

    Ok(Json(AnswerResponse {
        status: "success",
        closest_match: answer.closest_match,
        answer: answer.answer,
    }))
}

/// DELETE /sessions/:id
pub async fn delete_session(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let session_id = parse_session_id(Some(&id))?;
    if state.sessions.remove(&session_id).await {
        info!(%session_id, "Session removed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Session not found."))
    }
}

/// POST /extract
///
/// Accepts multipart form data with a `file` field (PDF, JPEG or PNG).
/// Returns the extracted record as a JSON download, or with `?validate=true`
/// the record together with its validation report.
pub async fn extract(
    State(state): State<GatewayState>,
    Query(query): Query<ExtractQuery>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let Some(extractor) = state.extractor.clone() else {
        warn!("Rejecting extraction: OCR is not configured");
        return Err(ApiError::service_unavailable("OCR is not configured."));
    };
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(|e| ApiError::bad_request(e.to_string()))?;
        upload = Some((file_name, content_type, data));
    }

    let Some((file_name, content_type, data)) = upload else {
        return Err(ApiError::bad_request("A file is required."));
    };

    let kind = match content_type.as_deref() {
        Some(mime) if mime != "application/octet-stream" => DocumentKind::from_mime(mime),
        _ => DocumentKind::from_file_name(&file_name),
    }?;

    info!(file = %file_name, bytes = data.len(), ?kind, "Extracting claim form");
    let form = extractor.extract(&data, kind).await?;

    if !query.validate {
        let body = form.to_pretty_json()?;
        let disposition = HeaderValue::from_str(&format!(
            "attachment; filename=\"{}.json\"",
            document_stem(&file_name)
        ))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment; filename=\"extracted.json\""));
        return Ok((
            [
                (header::CONTENT_TYPE, HeaderValue::from_static("application/json; charset=utf-8")),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            body,
        )
            .into_response());
    }

    let validation = match load_ground_truth(&state.ground_truth_dir, &file_name).await? {
        Some(ground_truth) => {
            ValidationOutcome::GroundTruth(validate_with_ground_truth(&form.record, &ground_truth))
        }
        None => {
            let reference = match &state.reference_template {
                Some(reference) => reference.as_ref().clone(),
                None => template(form.language),
            };
            ValidationOutcome::Dynamic(validate_dynamic(&form.record, &reference))
        }
    };

    Ok(Json(ValidatedExtraction {
        file_name,
        language: form.language,
        record: form.record,
        validation,
    })
    .into_response())
}
