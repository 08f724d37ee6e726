//! State Storage Port - interface for persisting session state.
//!
//! The engine keeps session state in memory; this port is how a host
//! application parks it between turns or across restarts.

use async_trait::async_trait;

use crate::domain::engine::SessionState;
use crate::domain::foundation::SessionId;

/// Errors from state storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StateStorageError {
    #[error("No state stored for session {0}")]
    NotFound(SessionId),

    #[error("Failed to serialize state: {0}")]
    SerializationFailed(String),

    #[error("Failed to deserialize state: {0}")]
    DeserializationFailed(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Port for persisting and loading session state.
#[async_trait]
pub trait SessionStateStorage: Send + Sync {
    /// Saves the state for a session, replacing any previous record.
    async fn save_state(
        &self,
        session_id: SessionId,
        state: &SessionState,
    ) -> Result<(), StateStorageError>;

    /// Loads the state for a session.
    ///
    /// # Errors
    ///
    /// Returns `StateStorageError::NotFound` if nothing was saved.
    async fn load_state(&self, session_id: SessionId) -> Result<SessionState, StateStorageError>;

    /// Returns true if a state record exists for the session.
    async fn exists(&self, session_id: SessionId) -> Result<bool, StateStorageError>;

    /// Deletes the state for a session, if present.
    async fn delete(&self, session_id: SessionId) -> Result<(), StateStorageError>;

    /// Lists every session with a stored state record.
    async fn list_sessions(&self) -> Result<Vec<SessionId>, StateStorageError>;
}
