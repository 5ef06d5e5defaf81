use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::error;

use crate::models::{ErrorResponse, LiveSession, SessionActionRequest};

use super::AppState;

/// Take a scheduled session live ahead of (or at) its slot.
pub async fn session_start(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(req): Json<SessionActionRequest>,
) -> Result<(StatusCode, Json<LiveSession>), (StatusCode, Json<ErrorResponse>)> {
    match state.lifecycle.start(&session_id, &req.user).await {
        Ok(session) => Ok((StatusCode::OK, Json(session))),
        Err(e) => {
            error!("Failed to start session '{}': {}", session_id, e);
            Err(e.into_rejection())
        }
    }
}
