use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::{
    diagnostics, health_check, ready_check, session_create, session_end, session_get,
    session_list, session_lock, session_participants, session_start, AppState,
};

/// Create API routes
pub fn create_api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/v1/diagnostics", get(diagnostics))
        .route("/v1/sessions", get(session_list).post(session_create))
        .route("/v1/sessions/:session_id", get(session_get))
        .route("/v1/sessions/:session_id/start", post(session_start))
        .route("/v1/sessions/:session_id/end", post(session_end))
        .route("/v1/sessions/:session_id/lock", post(session_lock))
        .route(
            "/v1/sessions/:session_id/participants",
            put(session_participants),
        )
        .with_state(state)
}
