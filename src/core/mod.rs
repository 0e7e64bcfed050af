pub mod http_client;
pub mod latency;
pub mod load_driver;
pub mod metrics_collector;
pub mod report;
pub mod resource_sampler;
pub mod sleep_guard;
