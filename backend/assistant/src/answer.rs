//! Phase two: answering questions from the knowledge base.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use medassist_core::{LlmProvider, LlmRequest, MedAssistError};
use medassist_knowledge::{EmbeddingProvider, KnowledgeBase, KnowledgeMatch, DEFAULT_DISTANCE_THRESHOLD};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::fields::UserField;
use crate::prompts::answer_prompt;

#[derive(Debug, Clone)]
pub struct AnswerSettings {
    pub model: String,
    pub distance_threshold: f32,
}

impl Default for AnswerSettings {
    fn default() -> Self {
        Self { model: "gpt-4o".to_string(), distance_threshold: DEFAULT_DISTANCE_THRESHOLD }
    }
}

/// The member details retrieval is tailored to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub hmo_name: String,
    pub membership_tier: String,
}

impl UserProfile {
    /// Read `hmo_name` and `insurance_membership_tier` from a client-supplied
    /// `user_info` object.
    pub fn from_json(user_info: &Value) -> Result<Self, MedAssistError> {
        let field = |name: &str| {
            user_info
                .get(name)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        match (field("hmo_name"), field("insurance_membership_tier")) {
            (Some(hmo_name), Some(membership_tier)) => Ok(Self { hmo_name, membership_tier }),
            _ => Err(MedAssistError::Validation(
                "user info must include hmo_name and insurance_membership_tier".into(),
            )),
        }
    }

    pub fn from_collected(collected: &BTreeMap<UserField, String>) -> Option<Self> {
        Some(Self {
            hmo_name: collected.get(&UserField::HmoName)?.clone(),
            membership_tier: collected.get(&UserField::InsuranceMembershipTier)?.clone(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub closest_match: Vec<KnowledgeMatch>,
    pub answer: String,
}

pub struct QueryAnswerer {
    llm: Arc<dyn LlmProvider>,
    embeddings: Arc<dyn EmbeddingProvider>,
    knowledge: Arc<KnowledgeBase>,
    settings: AnswerSettings,
}

impl QueryAnswerer {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        embeddings: Arc<dyn EmbeddingProvider>,
        knowledge: Arc<KnowledgeBase>,
        settings: AnswerSettings,
    ) -> Self {
        Self { llm, embeddings, knowledge, settings }
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Embed the question, retrieve the chunks within the distance threshold
    /// and have the model answer from them alone.
    ///
    /// Fails with `Validation` for a blank question and `NoRelevantContext`
    /// when nothing is close enough.
    pub async fn answer(&self, profile: &UserProfile, question: &str) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(MedAssistError::Validation("question is required".into()).into());
        }
        let start = Instant::now();
        info!(hmo = %profile.hmo_name, tier = %profile.membership_tier, "Answering user query");

        let query_embedding = self
            .embeddings
            .embed(question)
            .await
            .context("Failed to embed the question")?;

        let matches = self
            .knowledge
            .find_closest_match(&query_embedding, self.settings.distance_threshold);
        if matches.is_empty() {
            warn!("No relevant information found in the knowledge base");
            return Err(MedAssistError::NoRelevantContext.into());
        }
        debug!(matches = matches.len(), best = matches[0].distance, "Retrieved context");

        let contexts = matches.iter().map(|m| m.content.as_str()).collect::<Vec<_>>().join("\n---\n");
        let prompt = answer_prompt(&profile.hmo_name, &profile.membership_tier, &contexts, question);
        let response = self
            .llm
            .complete(&LlmRequest::system_only(&self.settings.model, prompt))
            .await?;

        info!(
            matches = matches.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Query answered"
        );

        Ok(Answer { closest_match: matches, answer: response.content.trim().to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medassist_knowledge::{KnowledgeChunk, StaticEmbeddings};
    use medassist_llm::MockProvider;
    use serde_json::json;

    fn knowledge() -> Arc<KnowledgeBase> {
        let chunk = |id: &str, embedding: Vec<f32>, content: &str| KnowledgeChunk {
            chunk_id: id.into(),
            embedding,
            content: content.into(),
        };
        Arc::new(
            KnowledgeBase::from_files(vec![
                (
                    "dentel_services.html".into(),
                    vec![
                        chunk("dentel_services.html_chunk_0", vec![1.0, 0.0], "ניקוי שיניים: זהב 80% הנחה"),
                        chunk("dentel_services.html_chunk_1", vec![0.9, 0.2], "צילום שיניים: כסף 50% הנחה"),
                    ],
                ),
                (
                    "optometry_services.html".into(),
                    vec![chunk("optometry_services.html_chunk_0", vec![0.0, 1.0], "משקפיים")],
                ),
            ])
            .unwrap(),
        )
    }

    fn answerer(mock: Arc<MockProvider>) -> QueryAnswerer {
        let embeddings = StaticEmbeddings::new(vec![0.0, -1.0]).with_text("teeth cleaning", vec![1.0, 0.05]);
        QueryAnswerer::new(mock, Arc::new(embeddings), knowledge(), AnswerSettings::default())
    }

    fn profile() -> UserProfile {
        UserProfile { hmo_name: "maccabi".into(), membership_tier: "gold".into() }
    }

    #[tokio::test]
    async fn test_answer_uses_retrieved_context() {
        let mock = Arc::new(MockProvider::new("mock").with_response("  80% discount.  "));
        let answerer = answerer(mock.clone());

        let answer = answerer.answer(&profile(), "teeth cleaning").await.unwrap();

        assert_eq!(answer.answer, "80% discount.");
        assert_eq!(answer.closest_match.len(), 2);
        assert_eq!(answer.closest_match[0].chunk_id, "dentel_services.html_chunk_0");

        let requests = mock.requests();
        let prompt = &requests[0].messages[0].content;
        assert!(prompt.contains("ניקוי שיניים: זהב 80% הנחה\n---\nצילום שיניים"));
        assert!(prompt.contains("- Membership Tier: gold"));
        assert!(!prompt.contains("משקפיים"));
    }

    #[tokio::test]
    async fn test_no_relevant_context() {
        let mock = Arc::new(MockProvider::new("mock"));
        let err = answerer(mock.clone()).answer(&profile(), "parking").await.unwrap_err();
        assert!(matches!(err.downcast_ref::<MedAssistError>(), Some(MedAssistError::NoRelevantContext)));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_blank_question_rejected() {
        let err = answerer(Arc::new(MockProvider::new("mock"))).answer(&profile(), "  ").await.unwrap_err();
        assert!(matches!(err.downcast_ref::<MedAssistError>(), Some(MedAssistError::Validation(_))));
    }

    #[test]
    fn test_profile_from_json() {
        let profile = UserProfile::from_json(&json!({
            "first_name": "Dana",
            "hmo_name": "מכבי",
            "insurance_membership_tier": "זהב"
        }))
        .unwrap();
        assert_eq!(profile.hmo_name, "מכבי");

        assert!(UserProfile::from_json(&json!({"hmo_name": "maccabi"})).is_err());
        assert!(UserProfile::from_json(&json!({"hmo_name": "", "insurance_membership_tier": "gold"})).is_err());
    }

    #[test]
    fn test_profile_from_collected() {
        let mut collected = BTreeMap::new();
        collected.insert(UserField::HmoName, "clalit".to_string());
        assert!(UserProfile::from_collected(&collected).is_none());
        collected.insert(UserField::InsuranceMembershipTier, "silver".to_string());
        assert_eq!(UserProfile::from_collected(&collected).unwrap().membership_tier, "silver");
    }
}
