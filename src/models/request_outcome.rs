use std::time::Duration;

use tokio::time::Instant;

/// Result of one dispatched request, as seen by the load generator.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOutcome {
    /// Path from `Endpoint::path`.
    pub endpoint: &'static str,
    pub latency: Duration,
    pub success: bool,
    pub timestamp: Instant,
}
