//! File-based session state storage.
//!
//! One JSON file per session under a base directory, named by the
//! session id. The record format is [`SessionState::dump`]'s, so files
//! written before locale support still load.

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::domain::engine::SessionState;
use crate::domain::foundation::SessionId;
use crate::ports::{SessionStateStorage, StateStorageError};

/// [`SessionStateStorage`] backed by a directory of JSON files.
#[derive(Debug, Clone)]
pub struct FileStateStorage {
    base_path: PathBuf,
}

impl FileStateStorage {
    /// Creates a storage rooted at `base_path`. The directory is
    /// created on first save, not here.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn state_path(&self, session_id: SessionId) -> PathBuf {
        self.base_path.join(format!("{}.json", session_id))
    }
}

#[async_trait]
impl SessionStateStorage for FileStateStorage {
    async fn save_state(
        &self,
        session_id: SessionId,
        state: &SessionState,
    ) -> Result<(), StateStorageError> {
        tokio::fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| StateStorageError::IoError(e.to_string()))?;

        let record = state
            .dump()
            .map_err(|e| StateStorageError::SerializationFailed(e.to_string()))?;
        let body = serde_json::to_string_pretty(&record)
            .map_err(|e| StateStorageError::SerializationFailed(e.to_string()))?;

        tokio::fs::write(self.state_path(session_id), body)
            .await
            .map_err(|e| StateStorageError::IoError(e.to_string()))
    }

    async fn load_state(&self, session_id: SessionId) -> Result<SessionState, StateStorageError> {
        let path = self.state_path(session_id);
        let body = match tokio::fs::read_to_string(&path).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StateStorageError::NotFound(session_id));
            }
            Err(e) => return Err(StateStorageError::IoError(e.to_string())),
        };

        let record: Value = serde_json::from_str(&body)
            .map_err(|e| StateStorageError::DeserializationFailed(e.to_string()))?;
        SessionState::load(record)
            .map_err(|e| StateStorageError::DeserializationFailed(e.to_string()))
    }

    async fn exists(&self, session_id: SessionId) -> Result<bool, StateStorageError> {
        match tokio::fs::metadata(self.state_path(session_id)).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StateStorageError::IoError(e.to_string())),
        }
    }

    async fn delete(&self, session_id: SessionId) -> Result<(), StateStorageError> {
        match tokio::fs::remove_file(self.state_path(session_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StateStorageError::IoError(e.to_string())),
        }
    }

    async fn list_sessions(&self) -> Result<Vec<SessionId>, StateStorageError> {
        let mut entries = match tokio::fs::read_dir(&self.base_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StateStorageError::IoError(e.to_string())),
        };

        let mut sessions = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StateStorageError::IoError(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<SessionId>().ok())
            {
                Some(id) => sessions.push(id),
                None => warn!(path = %path.display(), "skipping file with non-session name"),
            }
        }

        Ok(sessions)
    }
}
