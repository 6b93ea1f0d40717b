//! Active Conversation Registry.
//!
//! One `ConversationState` per session id. Turns within a session are
//! serialised by the per-session mutex; separate sessions never share state.
//! Sessions idle for longer than the TTL are swept when a new one is created.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use medassist_assistant::ConversationState;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

pub type SharedConversation = Arc<Mutex<ConversationState>>;

/// Idle time after which a session may be dropped.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

struct SessionEntry {
    conversation: SharedConversation,
    last_active: Instant,
}

#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
    pub idle_ttl: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_idle_ttl(DEFAULT_SESSION_TTL)
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
        Self { sessions: Arc::new(RwLock::new(HashMap::new())), idle_ttl }
    }

    /// Existing session, or a new one built by `init`. Either way the
    /// session counts as active now.
    pub async fn get_or_create(
        &self,
        session_id: Uuid,
        init: impl FnOnce() -> ConversationState,
    ) -> SharedConversation {
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();

        if let Some(entry) = sessions.get_mut(&session_id) {
            entry.last_active = now;
            return entry.conversation.clone();
        }

        let before = sessions.len();
        // A session still held by an in-flight turn is never swept.
        sessions.retain(|_, entry| {
            now.duration_since(entry.last_active) <= self.idle_ttl
                || Arc::strong_count(&entry.conversation) > 1
        });
        if sessions.len() < before {
            debug!(evicted = before - sessions.len(), "Swept idle sessions");
        }

        let conversation = Arc::new(Mutex::new(init()));
        sessions.insert(session_id, SessionEntry { conversation: conversation.clone(), last_active: now });
        conversation
    }

    pub async fn get(&self, session_id: &Uuid) -> Option<SharedConversation> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .map(|entry| entry.conversation.clone())
    }

    /// Drop a session. Returns whether it existed.
    pub async fn remove(&self, session_id: &Uuid) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
