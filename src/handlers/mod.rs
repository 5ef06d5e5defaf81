use std::sync::Arc;

use crate::bus::relay::RelayState;
use crate::lifecycle::SessionLifecycleController;
use crate::registry::SessionRegistry;

pub mod diagnostics;
pub mod health;
pub mod session_create;
pub mod session_end;
pub mod session_get;
pub mod session_list;
pub mod session_lock;
pub mod session_participants;
pub mod session_start;

pub use diagnostics::*;
pub use health::*;
pub use session_create::*;
pub use session_end::*;
pub use session_get::*;
pub use session_list::*;
pub use session_lock::*;
pub use session_participants::*;
pub use session_start::*;

/// Shared state behind the API routes.
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub lifecycle: Arc<SessionLifecycleController>,
    pub relay: Arc<RelayState>,
}
