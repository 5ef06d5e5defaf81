use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::user::User;

/// Advisory link quality, broadcast alongside the control flags. Observers
/// may transiently disagree on it; nothing load-bearing reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionQuality {
    Good,
    Fair,
    Poor,
}

/// One observer currently joined to a session. Each observer owns and
/// publishes updates to its own record; every other record it holds is a
/// cached copy rebuilt from protocol messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LiveParticipant {
    pub id: String,
    pub session_id: String,
    pub name: String,
    pub avatar: String,
    pub is_muted: bool,
    pub is_camera_off: bool,
    pub is_screen_sharing: bool,
    pub is_hand_raised: bool,
    pub joined_at: DateTime<Utc>,
    pub connection_quality: ConnectionQuality,
}

impl LiveParticipant {
    /// Initial record for a user entering a session. `muted`/`camera_off`
    /// reflect whether local media acquisition succeeded.
    pub fn on_join(user: &User, session_id: &str, muted: bool, camera_off: bool) -> Self {
        Self {
            id: user.id.clone(),
            session_id: session_id.to_string(),
            name: user.full_name.clone(),
            avatar: user.avatar.clone(),
            is_muted: muted,
            is_camera_off: camera_off,
            is_screen_sharing: false,
            is_hand_raised: false,
            joined_at: Utc::now(),
            connection_quality: ConnectionQuality::Good,
        }
    }
}

/// Partial update for a participant record. Fields left as `None` are not
/// touched by the merge; this is what makes `UPDATE_STATUS` a field-level
/// overwrite rather than an object replacement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_muted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_camera_off: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_screen_sharing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_hand_raised: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_quality: Option<ConnectionQuality>,
}

impl StatusUpdate {
    pub fn muted(state: bool) -> Self {
        Self { is_muted: Some(state), ..Self::default() }
    }

    pub fn camera_off(state: bool) -> Self {
        Self { is_camera_off: Some(state), ..Self::default() }
    }

    pub fn screen_sharing(state: bool) -> Self {
        Self { is_screen_sharing: Some(state), ..Self::default() }
    }

    pub fn hand_raised(state: bool) -> Self {
        Self { is_hand_raised: Some(state), ..Self::default() }
    }

    /// Overwrite only the fields present in this update.
    pub fn apply_to(&self, record: &mut LiveParticipant) {
        if let Some(muted) = self.is_muted {
            record.is_muted = muted;
        }
        if let Some(camera_off) = self.is_camera_off {
            record.is_camera_off = camera_off;
        }
        if let Some(sharing) = self.is_screen_sharing {
            record.is_screen_sharing = sharing;
        }
        if let Some(raised) = self.is_hand_raised {
            record.is_hand_raised = raised;
        }
        if let Some(quality) = self.connection_quality {
            record.connection_quality = quality;
        }
    }
}
