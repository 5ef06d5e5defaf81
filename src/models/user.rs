use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Role of a caller as supplied by the embedding application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Host,
    Member,
}

/// Identity handed to us by the collaborator layer. We never authenticate it;
/// the only privilege decision in scope is the host/admin check.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub full_name: String,
    pub avatar: String,
    pub role: UserRole,
}

impl User {
    /// Whether this user may create sessions and start scheduled ones.
    pub fn can_broadcast(&self) -> bool {
        matches!(self.role, UserRole::Admin | UserRole::Host)
    }
}
