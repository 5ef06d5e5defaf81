pub mod api;
pub mod diagnostics;
pub mod error;
pub mod health;
pub mod message;
pub mod participant;
pub mod ready;
pub mod session;
pub mod signal;
pub mod user;

pub use api::*;
pub use diagnostics::*;
pub use error::*;
pub use health::*;
pub use message::*;
pub use participant::*;
pub use ready::*;
pub use session::*;
pub use signal::*;
pub use user::*;
