use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::conversation::Conversation;

pub type SessionId = String;

/// Handle to one session's conversation.
///
/// The mutex is held for the whole submit, so requests within a session run
/// one at a time while other sessions proceed independently.
pub type SessionHandle = Arc<Mutex<Conversation>>;

#[derive(Debug, Default, Clone)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<SessionId, SessionHandle>>>,
}

impl SessionManager {
    pub async fn create_session(&self) -> SessionId {
        let session_id = Uuid::new_v4().to_string();
        self.sessions
            .write()
            .await
            .insert(session_id.clone(), Arc::new(Mutex::new(Conversation::new())));
        session_id
    }

    pub async fn get(&self, session_id: &str) -> Option<SessionHandle> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).cloned()
    }

    pub async fn has_session(&self, session_id: &str) -> bool {
        let sessions = self.sessions.read().await;
        sessions.contains_key(session_id)
    }

    /// Copy of the session's history, if the session exists.
    pub async fn snapshot(&self, session_id: &str) -> Option<Conversation> {
        let handle = self.get(session_id).await?;
        let conversation = handle.lock().await;
        Some(conversation.clone())
    }

    /// Clear a session's history, keeping the id valid.
    pub async fn reset(&self, session_id: &str) -> bool {
        let Some(handle) = self.get(session_id).await else {
            return false;
        };
        handle.lock().await.clear();
        true
    }

    /// End a session and discard its history.
    pub async fn remove(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
