use std::sync::Arc;

use axum::{extract::State, Json};
use tracing::debug;

use crate::models::LiveSession;

use super::AppState;

/// List all known sessions, newest first. The dashboard splits them into
/// live / scheduled / ended groups itself.
pub async fn session_list(State(state): State<Arc<AppState>>) -> Json<Vec<LiveSession>> {
    let sessions = state.registry.list().await;
    debug!("Listing {} sessions", sessions.len());
    Json(sessions)
}
