use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::core::latency::{average_ms, p95_ms};
use crate::models::request_outcome::RequestOutcome;
use crate::models::stats::Stats;

/// Per-target, append-only log of request outcomes.
///
/// Stats are derived on demand from whatever is in the log. The driver clears
/// a target's log before each timed run, so a snapshot only ever reflects the
/// most recent test against that target.
pub struct MetricsCollector {
    // {target: outcomes}
    logs: Mutex<HashMap<String, Vec<RequestOutcome>>>,
    // {target: threads reported by the server}
    threads: Mutex<HashMap<String, u64>>,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        MetricsCollector {
            logs: Mutex::new(HashMap::new()),
            threads: Mutex::new(HashMap::new()),
        }
    }

    pub fn record(&self, target: &str, endpoint: &'static str, latency: Duration, success: bool) {
        self.push(
            target,
            RequestOutcome {
                endpoint,
                latency,
                success,
                timestamp: Instant::now(),
            },
        );
    }

    pub fn push(&self, target: &str, outcome: RequestOutcome) {
        self.logs
            .lock()
            .entry(target.to_string())
            .or_default()
            .push(outcome);
    }

    pub fn clear(&self, target: &str) {
        if let Some(log) = self.logs.lock().get_mut(target) {
            log.clear();
        }
    }

    pub fn set_threads(&self, target: &str, threads: u64) {
        self.threads.lock().insert(target.to_string(), threads);
    }

    pub fn threads(&self, target: &str) -> u64 {
        self.threads.lock().get(target).copied().unwrap_or(0)
    }

    pub fn outcomes(&self, target: &str) -> Vec<RequestOutcome> {
        self.logs.lock().get(target).cloned().unwrap_or_default()
    }

    /// RPS comes from the time span covered by the log itself, not the
    /// configured duration, so it is skewed for very small logs. Latencies
    /// only cover successful requests.
    pub fn snapshot(&self, target: &str) -> Stats {
        let threads = self.threads(target);
        let logs = self.logs.lock();
        let log = match logs.get(target) {
            Some(log) if !log.is_empty() => log,
            _ => {
                return Stats {
                    threads,
                    ..Stats::default()
                }
            }
        };

        let total = log.len() as u64;
        let successful: Vec<Duration> = log
            .iter()
            .filter(|o| o.success)
            .map(|o| o.latency)
            .collect();
        let successful_count = successful.len() as u64;

        // both exist, the log is non-empty
        let first = log.iter().map(|o| o.timestamp).min().unwrap_or_else(Instant::now);
        let last = log.iter().map(|o| o.timestamp).max().unwrap_or(first);
        let span = last.duration_since(first).as_secs_f64();
        let rps = if span > 0.0 { total as f64 / span } else { 0.0 };

        Stats {
            rps,
            avg_latency_ms: average_ms(&successful),
            p95_latency_ms: p95_ms(&successful),
            success_rate: successful_count as f64 / total as f64 * 100.0,
            total_requests: total,
            successful_requests: successful_count,
            failed_requests: total - successful_count,
            threads,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::Endpoint;

    fn outcome(ms: u64, success: bool, at: Instant) -> RequestOutcome {
        RequestOutcome {
            endpoint: Endpoint::Planets.path(),
            latency: Duration::from_millis(ms),
            success,
            timestamp: at,
        }
    }

    #[test]
    fn test_empty_log_is_all_zero() {
        let collector = MetricsCollector::new();
        assert_eq!(collector.snapshot("undertow"), Stats::default());
    }

    #[test]
    fn test_clear_then_snapshot() {
        let collector = MetricsCollector::new();
        collector.record("undertow", "/api/planets", Duration::from_millis(3), true);
        collector.record("undertow", "/api/planets", Duration::from_millis(4), false);
        assert_eq!(collector.snapshot("undertow").total_requests, 2);

        collector.clear("undertow");
        collector.clear("undertow");
        collector.clear("never-seen");
        assert_eq!(collector.snapshot("undertow"), Stats::default());
    }

    #[test]
    fn test_single_entry_does_not_overflow() {
        let collector = MetricsCollector::new();
        collector.record("netty", "/api/film", Duration::from_millis(12), true);
        let stats = collector.snapshot("netty");
        assert_eq!(stats.p95_latency_ms, 12.0);
        assert_eq!(stats.avg_latency_ms, 12.0);
        assert_eq!(stats.total_requests, 1);
        // one sample spans no time
        assert_eq!(stats.rps, 0.0);
    }

    #[test]
    fn test_counts_add_up_and_success_rate_exact() {
        let collector = MetricsCollector::new();
        for i in 0..7u64 {
            collector.record("netty", "/api/planets", Duration::from_millis(i), i % 2 == 0);
        }
        let stats = collector.snapshot("netty");
        assert_eq!(stats.total_requests, 7);
        assert_eq!(stats.successful_requests, 4);
        assert_eq!(stats.failed_requests, 3);
        assert_eq!(
            stats.successful_requests + stats.failed_requests,
            stats.total_requests
        );
        assert_eq!(stats.success_rate, 4.0 / 7.0 * 100.0);
    }

    #[test]
    fn test_latency_ignores_failures() {
        let collector = MetricsCollector::new();
        collector.record("netty", "/api/planets", Duration::from_millis(10), true);
        collector.record("netty", "/api/planets", Duration::from_millis(1000), false);
        let stats = collector.snapshot("netty");
        assert_eq!(stats.avg_latency_ms, 10.0);
        assert_eq!(stats.p95_latency_ms, 10.0);
    }

    #[test]
    fn test_rps_from_log_span() {
        let collector = MetricsCollector::new();
        let start = Instant::now();
        for i in 0..=10u64 {
            collector.push("netty", outcome(1, true, start + Duration::from_millis(i * 200)));
        }
        // 11 outcomes over 2 seconds
        assert_eq!(collector.snapshot("netty").rps, 5.5);
    }

    #[test]
    fn test_snapshot_is_idempotent() {
        let collector = MetricsCollector::new();
        let start = Instant::now();
        collector.push("a", outcome(5, true, start));
        collector.push("a", outcome(9, false, start + Duration::from_millis(500)));
        collector.set_threads("a", 42);
        let first = collector.snapshot("a");
        let second = collector.snapshot("a");
        assert_eq!(first, second);
        assert_eq!(first.threads, 42);
    }

    #[test]
    fn test_outcome_keeps_endpoint_path() {
        let collector = MetricsCollector::new();
        collector.record("a", Endpoint::Film.path(), Duration::from_millis(5), true);
        let outcomes = collector.outcomes("a");
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].endpoint, "/api/film");
    }

    #[test]
    fn test_targets_are_isolated() {
        let collector = MetricsCollector::new();
        collector.record("a", "/api/film", Duration::from_millis(5), true);
        collector.clear("b");
        assert_eq!(collector.snapshot("a").total_requests, 1);
        assert_eq!(collector.snapshot("b").total_requests, 0);
    }
}
