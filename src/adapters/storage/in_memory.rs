//! In-memory session state storage for tests and single-process runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::engine::SessionState;
use crate::domain::foundation::SessionId;
use crate::ports::{SessionStateStorage, StateStorageError};

/// [`SessionStateStorage`] backed by a shared hash map.
///
/// Clones share the same map, so one instance can be handed to several
/// tasks.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStateStorage {
    states: Arc<RwLock<HashMap<SessionId, SessionState>>>,
}

impl InMemoryStateStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every stored state.
    pub async fn clear(&self) {
        self.states.write().await.clear();
    }

    /// Number of sessions currently stored.
    pub async fn state_count(&self) -> usize {
        self.states.read().await.len()
    }
}

#[async_trait]
impl SessionStateStorage for InMemoryStateStorage {
    async fn save_state(
        &self,
        session_id: SessionId,
        state: &SessionState,
    ) -> Result<(), StateStorageError> {
        self.states.write().await.insert(session_id, state.clone());
        Ok(())
    }

    async fn load_state(&self, session_id: SessionId) -> Result<SessionState, StateStorageError> {
        self.states
            .read()
            .await
            .get(&session_id)
            .cloned()
            .ok_or(StateStorageError::NotFound(session_id))
    }

    async fn exists(&self, session_id: SessionId) -> Result<bool, StateStorageError> {
        Ok(self.states.read().await.contains_key(&session_id))
    }

    async fn delete(&self, session_id: SessionId) -> Result<(), StateStorageError> {
        self.states.write().await.remove(&session_id);
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<SessionId>, StateStorageError> {
        Ok(self.states.read().await.keys().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Locale;
    use crate::domain::phases::Phase;
    use serde_json::json;

    fn state() -> SessionState {
        SessionState::new("Dana", 9, Locale::Korean).unwrap()
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let storage = InMemoryStateStorage::new();
        let id = SessionId::new();
        let mut state = state();
        state.memoize(Phase::Explore, json!({"key_episode": "a fight"}));

        storage.save_state(id, &state).await.unwrap();
        let loaded = storage.load_state(id).await.unwrap();
        assert_eq!(loaded, state);
    }

    #[tokio::test]
    async fn load_of_unknown_session_is_not_found() {
        let storage = InMemoryStateStorage::new();
        let id = SessionId::new();

        let err = storage.load_state(id).await.unwrap_err();
        assert!(matches!(err, StateStorageError::NotFound(missing) if missing == id));
    }

    #[tokio::test]
    async fn save_overwrites_previous_state() {
        let storage = InMemoryStateStorage::new();
        let id = SessionId::new();
        let mut state = state();

        storage.save_state(id, &state).await.unwrap();
        state.advance_to(Phase::Label);
        storage.save_state(id, &state).await.unwrap();

        let loaded = storage.load_state(id).await.unwrap();
        assert_eq!(loaded.current_phase(), Phase::Label);
        assert_eq!(storage.state_count().await, 1);
    }

    #[tokio::test]
    async fn delete_then_exists_is_false() {
        let storage = InMemoryStateStorage::new();
        let id = SessionId::new();

        storage.save_state(id, &state()).await.unwrap();
        assert!(storage.exists(id).await.unwrap());

        storage.delete(id).await.unwrap();
        assert!(!storage.exists(id).await.unwrap());
    }

    #[tokio::test]
    async fn list_sessions_returns_every_saved_id() {
        let storage = InMemoryStateStorage::new();
        let a = SessionId::new();
        let b = SessionId::new();
        storage.save_state(a, &state()).await.unwrap();
        storage.save_state(b, &state()).await.unwrap();

        let mut sessions = storage.list_sessions().await.unwrap();
        sessions.sort();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(sessions, expected);
    }

    #[tokio::test]
    async fn clones_share_the_same_map() {
        let storage = InMemoryStateStorage::new();
        let clone = storage.clone();
        let id = SessionId::new();

        storage.save_state(id, &state()).await.unwrap();
        assert!(clone.exists(id).await.unwrap());
    }
}
