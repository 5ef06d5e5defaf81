use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::models::{LiveError, LiveSession, SessionStatus};
use crate::store::session_store::SessionStore;

/// Owner of the `LiveSession` records: lookup, listing, and the mutations
/// the lifecycle controller drives. Newest sessions first, matching how the
/// dashboard presents them. Every mutation is written through to the store;
/// a write failure is logged and served state keeps going from memory.
pub struct SessionRegistry {
    sessions: RwLock<Vec<LiveSession>>,
    store: SessionStore,
}

impl SessionRegistry {
    /// Read the persisted session list and serve from it. An unreadable
    /// store logs and starts empty rather than keeping the service down.
    pub async fn load(store: SessionStore) -> Self {
        let sessions = match store.load().await {
            Ok(sessions) => {
                info!("Loaded {} persisted sessions", sessions.len());
                sessions
            }
            Err(e) => {
                error!("Failed to load session store: {}", e);
                warn!("Starting with an empty session list");
                Vec::new()
            }
        };
        Self { sessions: RwLock::new(sessions), store }
    }

    pub async fn list(&self) -> Vec<LiveSession> {
        self.sessions.read().await.clone()
    }

    pub async fn get(&self, session_id: &str) -> Result<LiveSession, LiveError> {
        let sessions = self.sessions.read().await;
        sessions
            .iter()
            .find(|s| s.id == session_id)
            .cloned()
            .ok_or_else(|| LiveError::SessionNotFound(session_id.to_string()))
    }

    /// Add a freshly created session at the head of the list.
    pub async fn insert(&self, session: LiveSession) -> LiveSession {
        {
            let mut sessions = self.sessions.write().await;
            sessions.insert(0, session.clone());
        }
        self.persist().await;
        session
    }

    /// Apply a mutation to one session and write the result through. The
    /// mutation sees the current record and may reject; rejection leaves
    /// the registry untouched.
    pub async fn update<F>(&self, session_id: &str, mutate: F) -> Result<LiveSession, LiveError>
    where
        F: FnOnce(&mut LiveSession) -> Result<(), LiveError>,
    {
        let updated = {
            let mut sessions = self.sessions.write().await;
            let session = sessions
                .iter_mut()
                .find(|s| s.id == session_id)
                .ok_or_else(|| LiveError::SessionNotFound(session_id.to_string()))?;
            mutate(session)?;
            session.clone()
        };
        self.persist().await;
        Ok(updated)
    }

    /// Session totals by status, for diagnostics.
    pub async fn counts(&self) -> (u32, u32, u32, u32) {
        let sessions = self.sessions.read().await;
        let mut live = 0;
        let mut scheduled = 0;
        let mut ended = 0;
        for session in sessions.iter() {
            match session.status {
                SessionStatus::Live => live += 1,
                SessionStatus::Scheduled => scheduled += 1,
                SessionStatus::Ended => ended += 1,
            }
        }
        (sessions.len() as u32, live, scheduled, ended)
    }

    async fn persist(&self) {
        let snapshot = self.sessions.read().await.clone();
        if let Err(e) = self.store.save(&snapshot).await {
            warn!("Session store write failed: {}", e);
        }
    }
}
