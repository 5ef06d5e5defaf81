use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::models::{LiveError, LiveSession};

/// Durable list of sessions, serialized as one JSON document. Read once at
/// startup and rewritten on every lifecycle transition. Presence and chat
/// are deliberately absent; they live only in active topic subscriptions.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted session list. A missing file is an empty list,
    /// not an error; a corrupt file is surfaced so the operator notices.
    pub async fn load(&self) -> Result<Vec<LiveSession>, LiveError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No session store at {}; starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(LiveError::StoreFailure(format!(
                    "reading {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        serde_json::from_str::<Vec<LiveSession>>(&raw).map_err(|e| {
            LiveError::StoreFailure(format!("parsing {}: {}", self.path.display(), e))
        })
    }

    /// Rewrite the full session list. Best-effort durability: a failure is
    /// reported but callers keep serving from memory.
    pub async fn save(&self, sessions: &[LiveSession]) -> Result<(), LiveError> {
        let body = serde_json::to_string_pretty(sessions)
            .map_err(|e| LiveError::StoreFailure(format!("serializing sessions: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = tokio::fs::create_dir_all(parent).await {
                    warn!("Could not create store directory {}: {}", parent.display(), e);
                }
            }
        }

        tokio::fs::write(&self.path, body).await.map_err(|e| {
            LiveError::StoreFailure(format!("writing {}: {}", self.path.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionStatus;
    use chrono::Utc;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir().join(format!("studio-live-store-{}.json", uuid::Uuid::new_v4()))
    }

    fn session(id: &str) -> LiveSession {
        LiveSession {
            id: id.to_string(),
            title: "Demo".to_string(),
            description: String::new(),
            status: SessionStatus::Live,
            host_id: "h-1".to_string(),
            host_name: "Harper".to_string(),
            host_avatar: "https://cdn.test/h.png".to_string(),
            started_at: Some(Utc::now()),
            scheduled_for: None,
            ended_at: None,
            participants: Vec::new(),
            is_locked: false,
        }
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let store = SessionStore::new(scratch_path());
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let path = scratch_path();
        let store = SessionStore::new(&path);
        store.save(&[session("s-1"), session("s-2")]).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, "s-1");
        assert_eq!(loaded[0].status, SessionStatus::Live);

        let _ = tokio::fs::remove_file(path).await;
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let path = scratch_path();
        tokio::fs::write(&path, "{ not json").await.unwrap();
        let store = SessionStore::new(&path);
        assert!(matches!(store.load().await, Err(LiveError::StoreFailure(_))));
        let _ = tokio::fs::remove_file(path).await;
    }
}
