use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::bus::SignalBus;
use crate::models::{LiveError, LiveParticipant, LiveSession, SessionStatus, Signal, User};
use crate::registry::SessionRegistry;

/// Guards the session state machine: who may create, start, and end a room,
/// and in which order the statuses may move. Authorization and transition
/// violations are rejected synchronously with no side effects; everything
/// downstream of a successful `end` is best-effort broadcast.
pub struct SessionLifecycleController {
    registry: Arc<SessionRegistry>,
    bus: Arc<dyn SignalBus>,
}

impl SessionLifecycleController {
    pub fn new(registry: Arc<SessionRegistry>, bus: Arc<dyn SignalBus>) -> Self {
        Self { registry, bus }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Create a session hosted by `user`. A future `scheduled_for` makes it
    /// SCHEDULED; otherwise it goes live immediately.
    pub async fn create(
        &self,
        user: &User,
        title: String,
        description: String,
        scheduled_for: Option<DateTime<Utc>>,
    ) -> Result<LiveSession, LiveError> {
        if !user.can_broadcast() {
            return Err(LiveError::Unauthorized(format!(
                "user '{}' may not create broadcast sessions",
                user.id
            )));
        }

        let now = Utc::now();
        let scheduled = matches!(scheduled_for, Some(at) if at > now);
        let session = LiveSession {
            id: Uuid::new_v4().to_string(),
            title,
            description,
            status: if scheduled { SessionStatus::Scheduled } else { SessionStatus::Live },
            host_id: user.id.clone(),
            host_name: user.full_name.clone(),
            host_avatar: user.avatar.clone(),
            started_at: if scheduled { None } else { Some(now) },
            scheduled_for: if scheduled { scheduled_for } else { None },
            ended_at: None,
            participants: Vec::new(),
            is_locked: false,
        };

        info!(
            "Session {} created by {} ({})",
            session.id, user.id, session.status
        );
        Ok(self.registry.insert(session).await)
    }

    /// Move a scheduled session live. Host or admin only.
    pub async fn start(&self, session_id: &str, user: &User) -> Result<LiveSession, LiveError> {
        let user = user.clone();
        let updated = self
            .registry
            .update(session_id, move |session| {
                if !session.is_host(&user.id) && !user.can_broadcast() {
                    return Err(LiveError::Unauthorized(format!(
                        "user '{}' may not start session '{}'",
                        user.id, session.id
                    )));
                }
                if !session.status.can_transition_to(SessionStatus::Live) {
                    return Err(LiveError::InvalidTransition {
                        from: session.status,
                        attempted: "start",
                    });
                }
                session.status = SessionStatus::Live;
                session.started_at = Some(Utc::now());
                Ok(())
            })
            .await?;
        info!("Session {} is now live", updated.id);
        Ok(updated)
    }

    /// End a live session. Host only. After the transition is recorded, an
    /// END_SESSION broadcast goes out on the session topic and the topic
    /// handle is released; delivery is best-effort with no acknowledgment.
    pub async fn end(&self, session_id: &str, user: &User) -> Result<LiveSession, LiveError> {
        let caller = user.clone();
        let updated = self
            .registry
            .update(session_id, move |session| {
                if !session.is_host(&caller.id) {
                    return Err(LiveError::Unauthorized(format!(
                        "user '{}' is not the host of session '{}'",
                        caller.id, session.id
                    )));
                }
                if !session.status.can_transition_to(SessionStatus::Ended) {
                    return Err(LiveError::InvalidTransition {
                        from: session.status,
                        attempted: "end",
                    });
                }
                session.status = SessionStatus::Ended;
                session.ended_at = Some(Utc::now());
                session.is_locked = false;
                Ok(())
            })
            .await?;

        // Tell whoever is still in the room. Losing this broadcast only
        // strands observers until their transport drops; the session record
        // itself is already final.
        match self.bus.open(session_id).await {
            Ok(topic) => {
                topic.send(&Signal::EndSession {});
                drop(topic);
            }
            Err(e) => {
                info!("No topic to notify for ended session {}: {}", session_id, e);
            }
        }

        info!("Session {} ended by host {}", updated.id, user.id);
        Ok(updated)
    }

    /// Replace the display snapshot of who is in the room, as shown on
    /// session listings. Host only, and advisory: the live membership
    /// stays with each observer's own store.
    pub async fn sync_participants(
        &self,
        session_id: &str,
        user: &User,
        participants: Vec<LiveParticipant>,
    ) -> Result<LiveSession, LiveError> {
        let caller = user.clone();
        self.registry
            .update(session_id, move |session| {
                if !session.is_host(&caller.id) {
                    return Err(LiveError::Unauthorized(format!(
                        "user '{}' is not the host of session '{}'",
                        caller.id, session.id
                    )));
                }
                if session.status == SessionStatus::Ended {
                    return Err(LiveError::InvalidTransition {
                        from: session.status,
                        attempted: "sync participants",
                    });
                }
                session.participants = participants;
                Ok(())
            })
            .await
    }

    /// Lock or unlock a live session against new joins. Host only.
    pub async fn set_locked(
        &self,
        session_id: &str,
        user: &User,
        locked: bool,
    ) -> Result<LiveSession, LiveError> {
        let caller = user.clone();
        let updated = self
            .registry
            .update(session_id, move |session| {
                if !session.is_host(&caller.id) {
                    return Err(LiveError::Unauthorized(format!(
                        "user '{}' is not the host of session '{}'",
                        caller.id, session.id
                    )));
                }
                if session.status == SessionStatus::Ended {
                    return Err(LiveError::InvalidTransition {
                        from: session.status,
                        attempted: "lock",
                    });
                }
                session.is_locked = locked;
                Ok(())
            })
            .await?;
        info!(
            "Session {} {} by host {}",
            updated.id,
            if locked { "locked" } else { "unlocked" },
            user.id
        );
        Ok(updated)
    }
}
