use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::error;

use crate::models::{ErrorResponse, LiveSession, SessionActionRequest};

use super::AppState;

/// End a live session for everyone. Host only; the controller broadcasts
/// the termination to the room after recording the transition.
pub async fn session_end(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(req): Json<SessionActionRequest>,
) -> Result<(StatusCode, Json<LiveSession>), (StatusCode, Json<ErrorResponse>)> {
    match state.lifecycle.end(&session_id, &req.user).await {
        Ok(session) => Ok((StatusCode::OK, Json(session))),
        Err(e) => {
            error!("Failed to end session '{}': {}", session_id, e);
            Err(e.into_rejection())
        }
    }
}
