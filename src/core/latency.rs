use std::time::Duration;

pub(crate) fn as_ms(d: Duration) -> f64 {
    d.as_nanos() as f64 / 1_000_000.0
}

pub fn average_ms(latencies: &[Duration]) -> f64 {
    if latencies.is_empty() {
        return 0.0;
    }
    let total: Duration = latencies.iter().sum();
    as_ms(total) / latencies.len() as f64
}

/// Sorted-index p95: `sorted[floor(len * 0.95)]`, with the index clamped to
/// the last element. No interpolation.
pub fn p95_ms(latencies: &[Duration]) -> f64 {
    if latencies.is_empty() {
        return 0.0;
    }
    let mut sorted = latencies.to_vec();
    sorted.sort_unstable();
    let index = p95_index(sorted.len());
    as_ms(sorted[index])
}

pub(crate) fn p95_index(len: usize) -> usize {
    let index = (len as f64 * 0.95) as usize;
    index.min(len.saturating_sub(1))
}
