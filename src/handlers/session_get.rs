use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::error;

use crate::models::{ErrorResponse, LiveSession};

use super::AppState;

/// Fetch one session by id.
pub async fn session_get(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<(StatusCode, Json<LiveSession>), (StatusCode, Json<ErrorResponse>)> {
    match state.registry.get(&session_id).await {
        Ok(session) => Ok((StatusCode::OK, Json(session))),
        Err(e) => {
            error!("Failed to fetch session '{}': {}", session_id, e);
            Err(e.into_rejection())
        }
    }
}
