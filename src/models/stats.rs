use serde::Serialize;

/// Snapshot of a target's current outcome log.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Stats {
    pub rps: f64,
    pub avg_latency_ms: f64,
    pub p95_latency_ms: f64,
    pub success_rate: f64,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub threads: u64,
}
