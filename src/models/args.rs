use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::models::config::{Endpoint, LoadTestConfig, Target};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Test duration per (target, endpoint) pair, in seconds
    #[arg(short, long, default_value_t = 60)]
    pub duration_secs: u64,

    /// Requests per second to aim for
    #[arg(short = 'r', long, default_value_t = 1400)]
    pub target_rps: u32,

    /// Server under test, as name=host:port. Repeat for each target; the first
    /// one is the baseline of the comparison
    #[arg(short, long = "target", value_name = "NAME=HOST:PORT")]
    pub targets: Vec<Target>,

    /// Endpoint to load. Repeat for each endpoint
    #[arg(short, long = "endpoint", value_enum, default_values = ["planets", "film"])]
    pub endpoints: Vec<Endpoint>,

    /// Wait before the first test so the servers can come up
    #[arg(long, default_value_t = 5)]
    pub warmup_secs: u64,

    /// Seconds between progress lines, 0 disables them
    #[arg(long, default_value_t = 5)]
    pub progress_secs: u64,

    /// Sample local cpu/memory every N requests
    #[arg(long, default_value_t = 100)]
    pub sample_every: u64,

    /// How many request errors get logged per test
    #[arg(long, default_value_t = 5)]
    pub error_log_limit: usize,

    /// Per-request timeout, in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// Write the JSON report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Keep the machine awake while testing
    #[arg(long, default_value_t = false)]
    pub prevent_sleep: bool,
}

impl Args {
    pub fn into_config(self) -> LoadTestConfig {
        let defaults = LoadTestConfig::default();
        let targets = if self.targets.is_empty() {
            defaults.targets
        } else {
            self.targets
        };
        LoadTestConfig {
            targets,
            endpoints: self.endpoints,
            duration: Duration::from_secs(self.duration_secs),
            target_rps: self.target_rps,
            warmup: Duration::from_secs(self.warmup_secs),
            progress_interval: match self.progress_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            sample_every: self.sample_every,
            error_log_limit: self.error_log_limit,
            request_timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}
