use std::collections::BTreeMap;

use anyhow::{bail, Context};
use serde_json::Value;

use crate::models::report::{
    ComparisonReport, EfficiencySummary, EndpointComparison, StatsComparison, TargetAverages,
    Verdict,
};
use crate::models::result::TargetResult;
use crate::models::stats::Stats;

/// Percent deltas beyond this are called a material difference.
pub const VERDICT_THRESHOLD_PCT: f64 = 10.0;

/// `(b - a) / a * 100`, or 0 when `a` is 0.
pub fn percent_delta(a: f64, b: f64) -> f64 {
    if a == 0.0 {
        return 0.0;
    }
    (b - a) / a * 100.0
}

fn rps_verdict(delta: f64) -> Verdict {
    if delta > VERDICT_THRESHOLD_PCT {
        Verdict::ContenderBetter
    } else if delta < -VERDICT_THRESHOLD_PCT {
        Verdict::BaselineBetter
    } else {
        Verdict::Comparable
    }
}

// higher latency is worse
fn latency_verdict(delta: f64) -> Verdict {
    if delta > VERDICT_THRESHOLD_PCT {
        Verdict::BaselineBetter
    } else if delta < -VERDICT_THRESHOLD_PCT {
        Verdict::ContenderBetter
    } else {
        Verdict::Comparable
    }
}

/// Compares two results for the same endpoint.
pub fn compare(baseline: &TargetResult, contender: &TargetResult) -> EndpointComparison {
    let rps_delta_pct = percent_delta(baseline.achieved_rps, contender.achieved_rps);
    let latency_delta_pct = percent_delta(baseline.avg_latency_ms, contender.avg_latency_ms);
    EndpointComparison {
        endpoint: baseline.endpoint,
        baseline: baseline.target.clone(),
        contender: contender.target.clone(),
        rps_delta_pct,
        latency_delta_pct,
        thread_delta: contender.threads as i64 - baseline.threads as i64,
        cpu_delta: contender.avg_cpu_percent - baseline.avg_cpu_percent,
        memory_delta_mb: contender.avg_memory_mb - baseline.avg_memory_mb,
        rps_verdict: rps_verdict(rps_delta_pct),
        latency_verdict: latency_verdict(latency_delta_pct),
    }
}

/// Same thresholds as `compare`, over collector snapshots.
pub fn compare_stats(baseline: &Stats, contender: &Stats) -> StatsComparison {
    let rps_delta_pct = percent_delta(baseline.rps, contender.rps);
    let latency_delta_pct = percent_delta(baseline.avg_latency_ms, contender.avg_latency_ms);
    StatsComparison {
        rps_delta_pct,
        latency_delta_pct,
        rps_verdict: rps_verdict(rps_delta_pct),
        latency_verdict: latency_verdict(latency_delta_pct),
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Mean threads, CPU and memory of one target across all of its endpoints.
pub fn averages(target: &str, results: &[TargetResult]) -> TargetAverages {
    let mine = || results.iter().filter(|r| r.target == target);
    TargetAverages {
        target: target.to_string(),
        avg_threads: mean(mine().map(|r| r.threads as f64)),
        avg_cpu_percent: mean(mine().map(|r| r.avg_cpu_percent)),
        avg_memory_mb: mean(mine().map(|r| r.avg_memory_mb)),
    }
}

pub fn efficiency(baseline: &TargetAverages, contender: &TargetAverages) -> EfficiencySummary {
    let thread_savings_pct = if baseline.avg_threads == 0.0 {
        0.0
    } else {
        (baseline.avg_threads - contender.avg_threads) / baseline.avg_threads * 100.0
    };
    let cpu_delta = contender.avg_cpu_percent - baseline.avg_cpu_percent;
    let memory_delta_mb = contender.avg_memory_mb - baseline.avg_memory_mb;

    let more_or_less = |delta: f64| if delta > 0.0 { "more" } else { "less" };
    let narrative = vec![
        format!(
            "{} uses {:.1}% {} threads than {} ({:.1} vs {:.1})",
            contender.target,
            thread_savings_pct.abs(),
            if thread_savings_pct >= 0.0 { "fewer" } else { "more" },
            baseline.target,
            contender.avg_threads,
            baseline.avg_threads
        ),
        format!(
            "{} uses {:.1} points {} CPU than {}",
            contender.target,
            cpu_delta.abs(),
            more_or_less(cpu_delta),
            baseline.target
        ),
        format!(
            "{} uses {:.0}MB {} memory than {}",
            contender.target,
            memory_delta_mb.abs(),
            more_or_less(memory_delta_mb),
            baseline.target
        ),
    ];

    EfficiencySummary {
        thread_savings_pct,
        cpu_delta,
        memory_delta_mb,
        narrative,
    }
}

/// Builds the full baseline-vs-contender report. Endpoints missing a result
/// for either side are left out of the per-endpoint comparisons.
pub fn build_report(
    results: &[TargetResult],
    baseline: &str,
    contender: &str,
    server_metrics: BTreeMap<String, Value>,
    collector_stats: BTreeMap<String, Stats>,
) -> anyhow::Result<ComparisonReport> {
    if baseline == contender {
        bail!("baseline and contender must differ, both are {:?}", baseline);
    }

    let mut comparisons = Vec::new();
    for a in results.iter().filter(|r| r.target == baseline) {
        let b = results
            .iter()
            .find(|r| r.target == contender && r.endpoint == a.endpoint);
        if let Some(b) = b {
            comparisons.push(compare(a, b));
        }
    }

    let baseline_averages = averages(baseline, results);
    let contender_averages = averages(contender, results);
    let efficiency = efficiency(&baseline_averages, &contender_averages);
    let collector_comparison = match (collector_stats.get(baseline), collector_stats.get(contender)) {
        (Some(a), Some(b)) => Some(compare_stats(a, b)),
        _ => None,
    };

    Ok(ComparisonReport {
        baseline: baseline.to_string(),
        contender: contender.to_string(),
        results: results.to_vec(),
        comparisons,
        baseline_averages,
        contender_averages,
        efficiency,
        server_metrics,
        collector_stats,
        collector_comparison,
    })
}

pub fn to_json(report: &ComparisonReport) -> anyhow::Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize report")
}
