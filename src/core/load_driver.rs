use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{info, warn};

use crate::core::http_client::LoadClient;
use crate::core::latency::{average_ms, p95_ms};
use crate::core::metrics_collector::MetricsCollector;
use crate::core::resource_sampler::ResourceSampler;
use crate::error::ClientResult;
use crate::models::config::{Endpoint, LoadTestConfig, Target};
use crate::models::film_request::FilmRequest;
use crate::models::result::TargetResult;
use crate::models::stats::Stats;

/// Closed-loop, rate-paced load driver.
///
/// Runs one test per (target, endpoint) pair, strictly one after another and
/// with at most one request in flight, so resource readings of one test are
/// never mixed with load from another.
pub struct LoadDriver<C: LoadClient> {
    client: C,
    collector: MetricsCollector,
    sampler: ResourceSampler,
    config: LoadTestConfig,
}

impl<C: LoadClient> LoadDriver<C> {
    pub fn new(client: C, config: LoadTestConfig) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(LoadDriver {
            client,
            collector: MetricsCollector::new(),
            sampler: ResourceSampler::new(),
            config,
        })
    }

    pub fn config(&self) -> &LoadTestConfig {
        &self.config
    }

    pub fn collector(&self) -> &MetricsCollector {
        &self.collector
    }

    /// Hands the client back so the caller can close it.
    pub fn into_client(self) -> C {
        self.client
    }

    async fn dispatch(&self, target: &str, endpoint: Endpoint) -> ClientResult<Value> {
        match endpoint {
            Endpoint::Planets => self.client.fetch_resource(target).await,
            Endpoint::Film => {
                let film = FilmRequest::random();
                self.client.create_resource(target, &film).await
            }
        }
    }

    /// Waits out the warm-up, then tests every target against every endpoint.
    pub async fn run_all(&mut self) -> Vec<TargetResult> {
        if !self.config.warmup.is_zero() {
            info!(warmup_secs = self.config.warmup.as_secs_f64(), "waiting for servers to be ready");
            sleep(self.config.warmup).await;
        }
        info!(
            duration_secs = self.config.duration.as_secs_f64(),
            target_rps = self.config.target_rps,
            interval_ms = self.config.interval_ms(),
            "starting load tests"
        );

        let targets = self.config.targets.clone();
        let endpoints = self.config.endpoints.clone();
        let mut results = Vec::with_capacity(targets.len() * endpoints.len());
        for target in &targets {
            for &endpoint in &endpoints {
                results.push(self.run_single_test(target, endpoint).await);
            }
        }
        results
    }

    pub async fn run_single_test(&mut self, target: &Target, endpoint: Endpoint) -> TargetResult {
        let name = target.name.as_str();
        let path = endpoint.path();
        let interval_ms = self.config.interval_ms();
        info!(server = name, endpoint = path, target_rps = self.config.target_rps, "test started");

        self.collector.clear(name);
        self.sampler.reset();

        let start = Instant::now();
        let end = start + self.config.duration;
        let mut last_log = start;
        let mut request_count: u64 = 0;
        let mut successful_requests: u64 = 0;
        let mut failed_requests: u64 = 0;

        while Instant::now() < end {
            let request_start = Instant::now();
            let result = self.dispatch(name, endpoint).await;
            let latency = request_start.elapsed();

            self.collector.record(name, path, latency, result.is_ok());
            match result {
                Ok(_) => successful_requests += 1,
                Err(e) => {
                    failed_requests += 1;
                    if failed_requests <= self.config.error_log_limit as u64 {
                        warn!(server = name, endpoint = path, error = %e, "request failed");
                    }
                }
            }
            request_count += 1;

            if request_count % self.config.sample_every == 0 {
                self.sampler.sample();
            }

            let now = Instant::now();
            if let Some(every) = self.config.progress_interval {
                if now.duration_since(last_log) >= every {
                    let elapsed = now.duration_since(start).as_secs_f64();
                    let rps = if elapsed > 0.0 { request_count as f64 / elapsed } else { 0.0 };
                    let success_rate = successful_requests as f64 / request_count as f64 * 100.0;
                    let reading = self.sampler.latest();
                    info!(
                        server = name,
                        endpoint = path,
                        requests = request_count,
                        successful = successful_requests,
                        failed = failed_requests,
                        rps = rps,
                        success_rate = success_rate,
                        cpu_percent = reading.cpu_percent,
                        memory_mb = reading.memory_mb,
                        "progress"
                    );
                    last_log = now;
                }
            }

            // no catch-up burst when behind schedule
            let next_request = start + Duration::from_millis(request_count * interval_ms);
            if now < next_request {
                sleep_until(next_request).await;
            }
        }

        let elapsed = start.elapsed();
        let duration_ms = elapsed.as_millis() as u64;
        let achieved_rps = if duration_ms > 0 {
            request_count as f64 * 1000.0 / duration_ms as f64
        } else {
            0.0
        };

        // failed requests count toward latency too
        let latencies: Vec<Duration> = self
            .collector
            .outcomes(name)
            .iter()
            .map(|o| o.latency)
            .collect();

        let threads = self.remote_threads(target).await;
        self.collector.set_threads(name, threads);

        let result = TargetResult {
            target: target.name.clone(),
            endpoint,
            total_requests: request_count,
            successful_requests,
            failed_requests,
            avg_latency_ms: average_ms(&latencies),
            p95_latency_ms: p95_ms(&latencies),
            achieved_rps,
            threads,
            avg_cpu_percent: self.sampler.avg_cpu_percent(),
            avg_memory_mb: self.sampler.avg_memory_mb(),
            duration_ms,
        };
        info!(
            server = name,
            endpoint = path,
            requests = result.total_requests,
            successful = result.successful_requests,
            failed = result.failed_requests,
            rps = result.achieved_rps,
            avg_latency_ms = result.avg_latency_ms,
            p95_latency_ms = result.p95_latency_ms,
            threads = result.threads,
            cpu_percent = result.avg_cpu_percent,
            memory_mb = result.avg_memory_mb,
            success_rate = result.success_rate(),
            "test finished"
        );
        result
    }

    /// Thread count the server reports about itself; 0 when it can't be had.
    pub async fn remote_threads(&self, target: &Target) -> u64 {
        match self.client.fetch_runtime_metrics(&target.host, target.port).await {
            Ok(metrics) => metrics.get("threads").and_then(Value::as_u64).unwrap_or(0),
            Err(e) => {
                warn!(server = %target.name, error = %e, "could not fetch server metrics");
                0
            }
        }
    }

    /// Final `/api/metrics` payload of every target that answers.
    pub async fn collect_final_metrics(&self) -> BTreeMap<String, Value> {
        let mut server_metrics = BTreeMap::new();
        for target in &self.config.targets {
            match self.client.fetch_runtime_metrics(&target.host, target.port).await {
                Ok(metrics) => {
                    let threads = metrics.get("threads").and_then(Value::as_u64).unwrap_or(0);
                    self.collector.set_threads(&target.name, threads);
                    let metrics = Value::Object(metrics);
                    info!(server = %target.name, metrics = %metrics, "final server metrics");
                    server_metrics.insert(target.name.clone(), metrics);
                }
                Err(e) => {
                    warn!(server = %target.name, error = %e, "could not fetch final server metrics");
                }
            }
        }
        server_metrics
    }

    /// Collector view of every target: log-span RPS, successful-request
    /// latency and the last reported thread count.
    pub fn collector_stats(&self) -> BTreeMap<String, Stats> {
        self.config
            .targets
            .iter()
            .map(|t| (t.name.clone(), self.collector.snapshot(&t.name)))
            .collect()
    }
}
