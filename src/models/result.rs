use serde::{Deserialize, Serialize};

use crate::models::config::Endpoint;

/// Outcome of one completed (target, endpoint) test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetResult {
    pub target: String,
    pub endpoint: Endpoint,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub avg_latency_ms: f64,
    pub p95_latency_ms: f64,
    pub achieved_rps: f64,
    pub threads: u64,
    pub avg_cpu_percent: f64,
    pub avg_memory_mb: f64,
    pub duration_ms: u64,
}

impl TargetResult {
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        self.successful_requests as f64 / self.total_requests as f64 * 100.0
    }
}
