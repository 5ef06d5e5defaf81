use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Aggregated runtime counters for the diagnostics endpoint.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct DiagnosticsResponse {
    pub n_sessions: u32,
    pub n_live: u32,
    pub n_scheduled: u32,
    pub n_ended: u32,
    pub n_topics: u32,
    pub n_subscribers: u32,
    pub cpu_usage: f32,
    pub memory_alloc: u64,
    pub memory_total: u64,
    pub memory_free: u64,
}
