//! Router-level tests for the gateway endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use medassist_assistant::{AnswerSettings, InfoCollector, QueryAnswerer};
use medassist_extraction::{ExtractionSettings, FormExtractor, StaticOcr};
use medassist_gateway::{build_router, GatewayState};
use medassist_knowledge::{KnowledgeBase, KnowledgeChunk, StaticEmbeddings};
use medassist_llm::MockProvider;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

const BOUNDARY: &str = "----medassist";

struct Mocks {
    chat: Arc<MockProvider>,
    answers: Arc<MockProvider>,
    extraction: Arc<MockProvider>,
}

fn knowledge() -> Arc<KnowledgeBase> {
    Arc::new(
        KnowledgeBase::from_files(vec![(
            "dentel_services.html".into(),
            vec![KnowledgeChunk {
                chunk_id: "dentel_services.html_chunk_0".into(),
                embedding: vec![1.0, 0.0],
                content: "ניקוי שיניים: זהב 80% הנחה".into(),
            }],
        )])
        .unwrap(),
    )
}

fn state_with(mocks: &Mocks, ground_truth_dir: &std::path::Path) -> GatewayState {
    let embeddings = StaticEmbeddings::new(vec![0.0, 1.0]).with_text("teeth cleaning", vec![1.0, 0.0]);
    let collector = InfoCollector::new(mocks.chat.clone(), "gpt-4o");
    let answerer = QueryAnswerer::new(
        mocks.answers.clone(),
        Arc::new(embeddings),
        knowledge(),
        AnswerSettings::default(),
    );
    let extractor = FormExtractor::new(
        Arc::new(StaticOcr::new("Last name: Smith")),
        mocks.extraction.clone(),
        ExtractionSettings::default(),
    );
    GatewayState::new(
        Arc::new(collector),
        Arc::new(answerer),
        Some(Arc::new(extractor)),
        ground_truth_dir,
    )
}

fn app(mocks: &Mocks) -> Router {
    build_router(state_with(mocks, std::path::Path::new("/nonexistent/ground_truth")))
}

fn mocks() -> Mocks {
    Mocks {
        chat: Arc::new(MockProvider::new("chat")),
        answers: Arc::new(MockProvider::new("answers").with_response("You get 80% off.")),
        extraction: Arc::new(
            MockProvider::new("extraction").with_response(r#"{"lastName": "Smith", "idNumber": "123456789"}"#),
        ),
    }
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn upload(uri: &str, file_name: &str, content_type: &str) -> Request<Body> {
    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
         Content-Type: {content_type}\r\n\
         \r\n\
         %PDF-1.4 test\r\n\
         --{BOUNDARY}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_welcome() {
    let response = app(&mocks())
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "Welcome to the Medical Chatbot API");
}

#[tokio::test]
async fn test_health_reports_knowledge_size() {
    let response = app(&mocks())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let health = body_json(response).await;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["knowledge_chunks"], 1);
    assert_eq!(health["sessions"], 0);
}

#[tokio::test]
async fn test_collect_requires_session_id() {
    let response = app(&mocks())
        .oneshot(post_json("/collect_user_info", json!({ "user_input": "hi" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["detail"], "Session ID is required.");
}

#[tokio::test]
async fn test_collect_rejects_malformed_session_id() {
    let response = app(&mocks())
        .oneshot(post_json(
            "/collect_user_info",
            json!({ "session_id": "not-a-uuid", "user_input": "hi" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["detail"], "Invalid session ID format.");
}

#[tokio::test]
async fn test_collect_rejects_wrongly_typed_body() {
    let response = app(&mocks())
        .oneshot(post_json(
            "/collect_user_info",
            json!({ "session_id": Uuid::new_v4().to_string(), "user_input": null }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("application/json"));
    let body = body_json(response).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["detail"], "Invalid request body.");
}

#[tokio::test]
async fn test_collect_rejects_non_json_body() {
    let request = Request::builder()
        .method("POST")
        .uri("/collect_user_info")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app(&mocks()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["detail"], "Invalid request body.");
}

#[tokio::test]
async fn test_idle_sessions_expire() {
    let mocks = mocks();
    let app = build_router(
        state_with(&mocks, std::path::Path::new("/nonexistent/ground_truth"))
            .with_session_ttl(Duration::from_millis(20)),
    );
    let turn = |id: Uuid| post_json("/collect_user_info", json!({ "session_id": id.to_string(), "user_input": "hi" }));

    app.clone().oneshot(turn(Uuid::new_v4())).await.unwrap();
    app.clone().oneshot(turn(Uuid::new_v4())).await.unwrap();
    tokio::time::sleep(Duration::from_millis(60)).await;
    app.clone().oneshot(turn(Uuid::new_v4())).await.unwrap();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_json(response).await["sessions"], 1);
}

#[tokio::test]
async fn test_collect_keeps_state_between_turns() {
    let mocks = Mocks {
        chat: Arc::new(MockProvider::new("chat").with_script([
            r#"{"field_to_update": "first_name", "value": "Dana", "message_to_user": "And your last name?", "confirmation_status": false, "transition_to_qa": false}"#,
            r#"{"field_to_update": "last_name", "value": "Cohen", "message_to_user": "What is your ID number?", "confirmation_status": false, "transition_to_qa": false}"#,
        ])),
        ..mocks()
    };
    let app = app(&mocks);
    let session_id = Uuid::new_v4().to_string();

    let first = app
        .clone()
        .oneshot(post_json(
            "/collect_user_info",
            json!({ "session_id": session_id, "user_input": "I'm Dana" }),
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let first = body_json(first).await;
    assert_eq!(first["status"], "success");
    assert_eq!(first["response"], "And your last name?");

    // The client no longer sends collected_data; the server remembers it.
    let second = app
        .oneshot(post_json(
            "/collect_user_info",
            json!({ "session_id": session_id, "user_input": "Cohen" }),
        ))
        .await
        .unwrap();
    let second = body_json(second).await;
    assert_eq!(second["collected_data"]["first_name"], "Dana");
    assert_eq!(second["collected_data"]["last_name"], "Cohen");
    assert_eq!(second["phase"], "collecting");

    let requests = mocks.chat.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[1].messages[0].content.contains("And your last name?"));
}

#[tokio::test]
async fn test_collect_seeded_session_transitions_to_qa() {
    let mocks = Mocks {
        chat: Arc::new(MockProvider::new("chat").with_response(
            r#"{"field_to_update": null, "value": null, "message_to_user": "Great", "confirmation_status": true, "transition_to_qa": true}"#,
        )),
        ..mocks()
    };
    let response = app(&mocks)
        .oneshot(post_json(
            "/collect_user_info",
            json!({
                "session_id": Uuid::new_v4().to_string(),
                "user_input": "Yes, all correct",
                "previous_gpt_output": "Please confirm your details.",
                "collected_data": {
                    "first_name": "Dana",
                    "last_name": "Cohen",
                    "id_number": "123456789",
                    "gender": "female",
                    "age": "34",
                    "hmo_name": "maccabi",
                    "hmo_card_number": "987654321",
                    "insurance_membership_tier": "gold"
                },
                "confirmation_status": false
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["transition_to_qa"], true);
    assert_eq!(body["confirmation_status"], true);
    assert_eq!(body["phase"], "question_answering");
}

#[tokio::test]
async fn test_collect_model_failure_reported_in_body() {
    let mocks = Mocks {
        chat: Arc::new(MockProvider::new("chat").with_response("I am not JSON")),
        ..mocks()
    };
    let response = app(&mocks)
        .oneshot(post_json(
            "/collect_user_info",
            json!({ "session_id": Uuid::new_v4().to_string(), "user_input": "hello" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "error");
}

#[tokio::test]
async fn test_answer_requires_user_info_and_question() {
    let response = app(&mocks())
        .oneshot(post_json("/answer_query", json!({ "question": "teeth cleaning" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["detail"], "User info and question are required");
}

#[tokio::test]
async fn test_answer_rejects_wrongly_typed_question() {
    let response = app(&mocks())
        .oneshot(post_json(
            "/answer_query",
            json!({ "user_info": { "hmo_name": "maccabi" }, "question": 5 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["detail"], "Invalid request body.");
}

#[tokio::test]
async fn test_answer_incomplete_profile() {
    let response = app(&mocks())
        .oneshot(post_json(
            "/answer_query",
            json!({ "user_info": { "hmo_name": "maccabi" }, "question": "teeth cleaning" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_answer_success() {
    let mocks = mocks();
    let response = app(&mocks)
        .oneshot(post_json(
            "/answer_query",
            json!({
                "user_info": { "hmo_name": "maccabi", "insurance_membership_tier": "gold" },
                "question": "teeth cleaning"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["answer"], "You get 80% off.");
    assert_eq!(body["closest_match"][0]["chunk_id"], "dentel_services.html_chunk_0");
    assert_eq!(mocks.answers.requests().len(), 1);
}

#[tokio::test]
async fn test_answer_without_context_is_not_found() {
    let response = app(&mocks())
        .oneshot(post_json(
            "/answer_query",
            json!({
                "user_info": { "hmo_name": "maccabi", "insurance_membership_tier": "gold" },
                "question": "where do I park?"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await["detail"],
        "No relevant information found in the knowledge base."
    );
}

#[tokio::test]
async fn test_extract_returns_json_download() {
    let response = app(&mocks())
        .oneshot(upload("/extract", "claim_form.pdf", "application/pdf"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"claim_form.json\""
    );
    let record = body_json(response).await;
    assert_eq!(record["lastName"], "Smith");
    assert_eq!(record["firstName"], "");
    assert_eq!(record["dateOfBirth"]["year"], "");
}

#[tokio::test]
async fn test_extract_without_ocr_is_unavailable() {
    let mocks = mocks();
    let mut state = state_with(&mocks, std::path::Path::new("/nonexistent/ground_truth"));
    state.extractor = None;

    let response = build_router(state)
        .oneshot(upload("/extract", "claim_form.pdf", "application/pdf"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["detail"], "OCR is not configured.");
    assert!(mocks.extraction.requests().is_empty());
}

#[tokio::test]
async fn test_extract_missing_file() {
    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{BOUNDARY}--\r\n"
    );
    let request = Request::builder()
        .method("POST")
        .uri("/extract")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap();

    let response = app(&mocks()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_extract_rejects_unsupported_type() {
    let response = app(&mocks())
        .oneshot(upload("/extract", "notes.txt", "text/plain"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_extract_validates_against_ground_truth() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("form_gt.json"),
        json!({ "lastName": "Smith", "idNumber": "123456780" }).to_string(),
    )
    .unwrap();
    let app = build_router(state_with(&mocks(), dir.path()));

    let response = app
        .oneshot(upload("/extract?validate=true", "form.pdf", "application/pdf"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["file_name"], "form.pdf");
    assert_eq!(body["validation"]["kind"], "ground_truth");
    assert_eq!(body["validation"]["accuracy"], 50.0);
    assert_eq!(body["validation"]["completeness"], 100.0);
    assert_eq!(body["validation"]["mismatched_fields"]["idNumber"]["expected"], "123456780");
}

#[tokio::test]
async fn test_extract_falls_back_to_dynamic_validation() {
    let response = app(&mocks())
        .oneshot(upload("/extract?validate=true", "scan.jpg", "image/jpeg"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["validation"]["kind"], "dynamic");
    assert_eq!(body["validation"]["completeness"], 100.0);
}

#[tokio::test]
async fn test_delete_session() {
    let mocks = Mocks {
        chat: Arc::new(MockProvider::new("chat").with_response(
            r#"{"field_to_update": "age", "value": "34", "message_to_user": "Thanks", "confirmation_status": false, "transition_to_qa": false}"#,
        )),
        ..mocks()
    };
    let app = app(&mocks);
    let session_id = Uuid::new_v4().to_string();

    app.clone()
        .oneshot(post_json(
            "/collect_user_info",
            json!({ "session_id": session_id, "user_input": "34" }),
        ))
        .await
        .unwrap();

    let delete = |id: &str| {
        Request::builder()
            .method("DELETE")
            .uri(format!("/sessions/{id}"))
            .body(Body::empty())
            .unwrap()
    };

    let response = app.clone().oneshot(delete(&session_id)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.oneshot(delete(&session_id)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
