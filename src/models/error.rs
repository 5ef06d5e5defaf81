use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::session::SessionStatus;

/// Response for an error
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: u16,
    pub status: String,
    pub error: String,
}

/// Failure taxonomy for session and protocol operations. Protocol-level
/// noise (undecodable frames, merges against unknown ids) never surfaces
/// through this type; the reconciler silently ignores it.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveError {
    /// Local camera/microphone acquisition was refused. Recoverable; the
    /// session continues with muted/camera-off defaults.
    DeviceAccessDenied(String),
    /// Screen capture failed or was cancelled. Recoverable; the caller
    /// reverts to the prior camera stream.
    ScreenShareFailed(String),
    /// A non-host attempted a host-only action.
    Unauthorized(String),
    /// A lifecycle transition was attempted from a disallowed status.
    InvalidTransition {
        from: SessionStatus,
        attempted: &'static str,
    },
    /// The signal bus could not be opened. Fatal to joining that session.
    TransportUnavailable(String),
    /// No session with the requested id.
    SessionNotFound(String),
    /// The session store could not be read or written.
    StoreFailure(String),
}

impl std::fmt::Display for LiveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LiveError::DeviceAccessDenied(detail) => {
                write!(f, "Camera/microphone access denied: {}", detail)
            }
            LiveError::ScreenShareFailed(detail) => {
                write!(f, "Screen share failed: {}", detail)
            }
            LiveError::Unauthorized(detail) => write!(f, "Unauthorized: {}", detail),
            LiveError::InvalidTransition { from, attempted } => {
                write!(f, "Invalid transition: cannot {} a {} session", attempted, from)
            }
            LiveError::TransportUnavailable(detail) => {
                write!(f, "Signal bus unavailable: {}", detail)
            }
            LiveError::SessionNotFound(id) => write!(f, "Session '{}' not found", id),
            LiveError::StoreFailure(detail) => write!(f, "Session store failure: {}", detail),
        }
    }
}

impl std::error::Error for LiveError {}

impl LiveError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            LiveError::DeviceAccessDenied(_) | LiveError::ScreenShareFailed(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            LiveError::Unauthorized(_) => StatusCode::FORBIDDEN,
            LiveError::InvalidTransition { .. } => StatusCode::CONFLICT,
            LiveError::TransportUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            LiveError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            LiveError::StoreFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Shape this error the way the HTTP handlers answer failures.
    pub fn into_rejection(self) -> (StatusCode, Json<ErrorResponse>) {
        let status = self.status_code();
        (
            status,
            Json(ErrorResponse {
                code: status.as_u16(),
                status: status.to_string(),
                error: self.to_string(),
            }),
        )
    }
}
