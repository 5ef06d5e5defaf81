pub mod bus;
pub mod config;
pub mod docs;
pub mod handlers;
pub mod lifecycle;
pub mod models;
pub mod presence;
pub mod registry;
pub mod routes;
pub mod store;
pub mod utils;
