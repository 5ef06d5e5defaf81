use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::error;

use crate::models::{ErrorResponse, LiveSession, LockSessionRequest};

use super::AppState;

/// Lock or unlock a session against new joins. Host only; existing
/// participants are unaffected.
pub async fn session_lock(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(req): Json<LockSessionRequest>,
) -> Result<(StatusCode, Json<LiveSession>), (StatusCode, Json<ErrorResponse>)> {
    match state
        .lifecycle
        .set_locked(&session_id, &req.user, req.locked)
        .await
    {
        Ok(session) => Ok((StatusCode::OK, Json(session))),
        Err(e) => {
            error!("Failed to update lock on session '{}': {}", session_id, e);
            Err(e.into_rejection())
        }
    }
}
