use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::error;

use crate::models::{ErrorResponse, LiveSession, SyncParticipantsRequest};

use super::AppState;

/// Replace the participant snapshot shown on session listings. Host only;
/// the live membership stays with each observer in the room.
pub async fn session_participants(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(req): Json<SyncParticipantsRequest>,
) -> Result<(StatusCode, Json<LiveSession>), (StatusCode, Json<ErrorResponse>)> {
    match state
        .lifecycle
        .sync_participants(&session_id, &req.user, req.participants)
        .await
    {
        Ok(session) => Ok((StatusCode::OK, Json(session))),
        Err(e) => {
            error!("Failed to sync participants on session '{}': {}", session_id, e);
            Err(e.into_rejection())
        }
    }
}
