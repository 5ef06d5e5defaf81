use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::user::User;

/// One chat utterance. Append-only, never edited, and never persisted beyond
/// the lifetime of the observer that holds the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LiveMessage {
    pub id: String,
    pub session_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl LiveMessage {
    pub fn new(sender: &User, session_id: &str, text: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            sender_id: sender.id.clone(),
            sender_name: sender.full_name.clone(),
            text,
            timestamp: Utc::now(),
        }
    }
}
