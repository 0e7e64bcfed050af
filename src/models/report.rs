use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::models::config::Endpoint;
use crate::models::result::TargetResult;
use crate::models::stats::Stats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    ContenderBetter,
    BaselineBetter,
    Comparable,
}

/// Baseline vs contender on a single endpoint. Percent deltas are
/// `(contender - baseline) / baseline * 100`; absolute deltas are
/// `contender - baseline`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointComparison {
    pub endpoint: Endpoint,
    pub baseline: String,
    pub contender: String,
    pub rps_delta_pct: f64,
    pub latency_delta_pct: f64,
    pub thread_delta: i64,
    pub cpu_delta: f64,
    pub memory_delta_mb: f64,
    pub rps_verdict: Verdict,
    pub latency_verdict: Verdict,
}

/// Baseline vs contender on the collector's own view of each target's
/// last test (log-span RPS, successful-request latency).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsComparison {
    pub rps_delta_pct: f64,
    pub latency_delta_pct: f64,
    pub rps_verdict: Verdict,
    pub latency_verdict: Verdict,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetAverages {
    pub target: String,
    pub avg_threads: f64,
    pub avg_cpu_percent: f64,
    pub avg_memory_mb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EfficiencySummary {
    /// Share of the baseline's threads the contender does without.
    pub thread_savings_pct: f64,
    pub cpu_delta: f64,
    pub memory_delta_mb: f64,
    pub narrative: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub baseline: String,
    pub contender: String,
    pub results: Vec<TargetResult>,
    pub comparisons: Vec<EndpointComparison>,
    pub baseline_averages: TargetAverages,
    pub contender_averages: TargetAverages,
    pub efficiency: EfficiencySummary,
    /// Final `/api/metrics` payload per target, where it could be fetched.
    pub server_metrics: BTreeMap<String, Value>,
    pub collector_stats: BTreeMap<String, Stats>,
    /// Absent unless both sides have collector stats.
    pub collector_comparison: Option<StatsComparison>,
}
