use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::participant::LiveParticipant;

/// Lifecycle status of a broadcast room. Transitions are monotonic:
/// SCHEDULED -> LIVE -> ENDED, never backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Scheduled,
    Live,
    Ended,
}

impl SessionStatus {
    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        matches!(
            (self, next),
            (SessionStatus::Scheduled, SessionStatus::Live)
                | (SessionStatus::Live, SessionStatus::Ended)
        )
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Scheduled => write!(f, "SCHEDULED"),
            SessionStatus::Live => write!(f, "LIVE"),
            SessionStatus::Ended => write!(f, "ENDED"),
        }
    }
}

/// One broadcast room. The `participants` list is a display snapshot kept by
/// the registry; while the room is live the authoritative membership lives in
/// each observer's status store.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LiveSession {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: SessionStatus,
    pub host_id: String,
    pub host_name: String,
    pub host_avatar: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub participants: Vec<LiveParticipant>,
    #[serde(default)]
    pub is_locked: bool,
}

impl LiveSession {
    pub fn is_live(&self) -> bool {
        self.status == SessionStatus::Live
    }

    pub fn is_host(&self, user_id: &str) -> bool {
        self.host_id == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_are_monotonic() {
        assert!(SessionStatus::Scheduled.can_transition_to(SessionStatus::Live));
        assert!(SessionStatus::Live.can_transition_to(SessionStatus::Ended));

        assert!(!SessionStatus::Live.can_transition_to(SessionStatus::Scheduled));
        assert!(!SessionStatus::Ended.can_transition_to(SessionStatus::Live));
        assert!(!SessionStatus::Ended.can_transition_to(SessionStatus::Scheduled));
        assert!(!SessionStatus::Scheduled.can_transition_to(SessionStatus::Ended));
    }
}
