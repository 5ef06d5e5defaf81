pub mod chat;
pub mod media;
pub mod reconciler;
pub mod status_store;
