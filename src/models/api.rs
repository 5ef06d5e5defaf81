use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::participant::LiveParticipant;
use super::user::User;

/// Request body for creating a session. With `scheduled_for` absent (or in
/// the past) the session goes live immediately.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub user: User,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
}

/// Request body for host actions on an existing session (start/end).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionActionRequest {
    pub user: User,
}

/// Request body for refreshing a session's participant display snapshot.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncParticipantsRequest {
    pub user: User,
    #[serde(default)]
    pub participants: Vec<LiveParticipant>,
}

/// Request body for locking or unlocking a session against new joins.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LockSessionRequest {
    pub user: User,
    pub locked: bool,
}
