//! Request and response bodies.

use medassist_core::Language;
use medassist_extraction::{DynamicReport, GroundTruthReport};
use medassist_knowledge::KnowledgeMatch;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Serialize)]
pub struct WelcomeResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub sessions: usize,
    pub knowledge_chunks: usize,
    pub uptime_seconds: u64,
}

/// Body of `POST /collect_user_info`. Everything except `session_id` is only
/// used to seed a session the server has not seen before.
#[derive(Debug, Default, Deserialize)]
pub struct CollectRequest {
    pub session_id: Option<String>,
    #[serde(default)]
    pub user_input: String,
    #[serde(default)]
    pub previous_gpt_output: Option<String>,
    #[serde(default)]
    pub collected_data: Option<Map<String, Value>>,
    #[serde(default)]
    pub confirmation_status: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub user_info: Option<Value>,
    pub question: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub status: &'static str,
    pub closest_match: Vec<KnowledgeMatch>,
    pub answer: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExtractQuery {
    #[serde(default)]
    pub validate: bool,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationOutcome {
    GroundTruth(GroundTruthReport),
    Dynamic(DynamicReport),
}

#[derive(Debug, Serialize)]
pub struct ValidatedExtraction {
    pub file_name: String,
    pub language: Language,
    pub record: Value,
    pub validation: ValidationOutcome,
}
