//! Per-session conversation state.
//!
//! Every session owns an independent history/context pair; nothing is
//! shared across callers. The per-session lock serializes turns so a
//! session processes one request at a time.

use super::{Context, ConversationHistory};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Conversation state owned by one session.
#[derive(Debug, Default)]
pub struct Session {
    pub history: ConversationHistory,
    pub context: Context,
}

/// Maps session ids to their isolated conversation state.
///
/// Sessions are created on first contact and removed on session end.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a session, creating it when the id is unknown or absent.
    ///
    /// Returns the effective session id alongside the session handle.
    pub fn get_or_create(&self, id: Option<Uuid>) -> (Uuid, Arc<Mutex<Session>>) {
        let id = id.unwrap_or_else(Uuid::new_v4);
        let mut sessions = self.sessions.write().unwrap();
        let session = sessions
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(Session::default())))
            .clone();
        (id, session)
    }

    /// Look up an existing session.
    pub fn get(&self, id: Uuid) -> Option<Arc<Mutex<Session>>> {
        self.sessions.read().unwrap().get(&id).cloned()
    }

    /// Tear down a session. Returns false if the id was unknown.
    pub fn end(&self, id: Uuid) -> bool {
        self.sessions.write().unwrap().remove(&id).is_some()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Message;

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SessionStore::new();
        let (id_a, session_a) = store.get_or_create(None);
        let (id_b, session_b) = store.get_or_create(None);
        assert_ne!(id_a, id_b);

        session_a.lock().await.history.push(Message::user("hi"));
        assert_eq!(session_a.lock().await.history.len(), 1);
        assert!(session_b.lock().await.history.is_empty());
    }

    #[tokio::test]
    async fn test_get_or_create_reuses_existing() {
        let store = SessionStore::new();
        let (id, session) = store.get_or_create(None);
        session.lock().await.history.push(Message::user("hi"));

        let (same_id, same_session) = store.get_or_create(Some(id));
        assert_eq!(id, same_id);
        assert_eq!(same_session.lock().await.history.len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_end_session() {
        let store = SessionStore::new();
        let (id, _) = store.get_or_create(None);
        assert!(store.end(id));
        assert!(!store.end(id));
        assert!(store.is_empty());
    }
}
