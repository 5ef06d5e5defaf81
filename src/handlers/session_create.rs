use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use tracing::error;

use crate::models::{CreateSessionRequest, ErrorResponse, LiveSession};

use super::AppState;

/// Create a broadcast session. With a future `scheduledFor` the session is
/// created SCHEDULED; otherwise it goes live on the spot.
pub async fn session_create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<LiveSession>), (StatusCode, Json<ErrorResponse>)> {
    if req.title.trim().is_empty() {
        let status = StatusCode::BAD_REQUEST;
        return Err((
            status,
            Json(ErrorResponse {
                code: status.as_u16(),
                status: status.to_string(),
                error: "Session title must not be empty".to_string(),
            }),
        ));
    }

    match state
        .lifecycle
        .create(&req.user, req.title, req.description, req.scheduled_for)
        .await
    {
        Ok(session) => Ok((StatusCode::CREATED, Json(session))),
        Err(e) => {
            error!("Failed to create session: {}", e);
            Err(e.into_rejection())
        }
    }
}
