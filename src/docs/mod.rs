use utoipa::OpenApi;

use crate::models::*;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn health_check_doc() {}

/// List sessions
#[utoipa::path(
    get,
    path = "/api/v1/sessions",
    responses(
        (status = 200, description = "All known sessions, newest first", body = Vec<LiveSession>)
    )
)]
#[allow(dead_code)]
pub async fn session_list_doc() {}

/// Create a session
#[utoipa::path(
    post,
    path = "/api/v1/sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Session created", body = LiveSession),
        (status = 403, description = "Caller may not create sessions", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn session_create_doc() {}

/// End a session
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{session_id}/end",
    request_body = SessionActionRequest,
    responses(
        (status = 200, description = "Session ended", body = LiveSession),
        (status = 403, description = "Caller is not the host", body = ErrorResponse),
        (status = 409, description = "Session is not live", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn session_end_doc() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check_doc,
        session_list_doc,
        session_create_doc,
        session_end_doc,
    ),
    components(
        schemas(
            HealthResponse,
            ReadyResponse,
            ErrorResponse,
            DiagnosticsResponse,
            LiveSession,
            SessionStatus,
            LiveParticipant,
            ConnectionQuality,
            StatusUpdate,
            LiveMessage,
            User,
            UserRole,
            CreateSessionRequest,
            SessionActionRequest,
            SyncParticipantsRequest,
            LockSessionRequest,
        )
    ),
    tags(
        (name = "api", description = "Live session API endpoints")
    )
)]
pub struct ApiDoc;
