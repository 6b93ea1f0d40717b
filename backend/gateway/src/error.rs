use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use medassist_core::MedAssistError;
use serde_json::json;
use tracing::{error, warn};

const INTERNAL_MESSAGE: &str = "Internal Server Error";
const INVALID_BODY_MESSAGE: &str = "Invalid request body.";
const NO_CONTEXT_MESSAGE: &str = "No relevant information found in the knowledge base.";

/// HTTP error with a message safe to show to clients.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self { status: StatusCode::NOT_FOUND, message: message.into() }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self { status: StatusCode::SERVICE_UNAVAILABLE, message: message.into() }
    }

    pub fn internal() -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: INTERNAL_MESSAGE.into() }
    }
}

impl From<MedAssistError> for ApiError {
    fn from(err: MedAssistError) -> Self {
        match &err {
            e if e.is_client_error() => ApiError::bad_request(e.to_string()),
            MedAssistError::NoRelevantContext => ApiError::not_found(NO_CONTEXT_MESSAGE),
            _ => {
                error!(error = %err, "Request failed");
                ApiError::internal()
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<MedAssistError>() {
            Ok(typed) => typed.into(),
            Err(other) => {
                error!(error = %format!("{other:#}"), "Request failed");
                ApiError::internal()
            }
        }
    }
}

/// Malformed or wrongly typed JSON bodies. Serde's text stays in the logs.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(status = %rejection.status(), error = %rejection.body_text(), "Rejected request body");
        ApiError::bad_request(INVALID_BODY_MESSAGE)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "status": "error", "detail": self.message }))).into_response()
    }
}
