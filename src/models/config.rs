use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// One server under test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    pub host: String,
    pub port: u16,
}

impl Target {
    pub fn new(name: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Target {
            name: name.into(),
            host: host.into(),
            port,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

// name=host:port
impl FromStr for Target {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, addr) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("target must look like name=host:port, got {:?}", s))?;
        let (host, port) = addr
            .rsplit_once(':')
            .ok_or_else(|| anyhow!("target address must look like host:port, got {:?}", addr))?;
        let name = name.trim();
        let host = host.trim();
        if name.is_empty() || host.is_empty() {
            bail!("target name and host cannot be empty: {:?}", s);
        }
        let port = port
            .trim()
            .parse::<u16>()
            .map_err(|e| anyhow!("invalid port in {:?}: {}", s, e))?;
        Ok(Target::new(name, host, port))
    }
}

/// Endpoint exercised by a test phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    /// GET /api/planets
    Planets,
    /// PUT /api/film
    Film,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Planets => "/api/planets",
            Endpoint::Film => "/api/film",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

pub const METRICS_PATH: &str = "/api/metrics";

/// Settings for one whole run. Built once and handed to the driver.
#[derive(Debug, Clone)]
pub struct LoadTestConfig {
    pub targets: Vec<Target>,
    pub endpoints: Vec<Endpoint>,
    pub duration: Duration,
    pub target_rps: u32,
    pub warmup: Duration,
    /// `None` turns progress lines off.
    pub progress_interval: Option<Duration>,
    pub sample_every: u64,
    pub error_log_limit: usize,
    pub request_timeout: Duration,
}

impl Default for LoadTestConfig {
    fn default() -> Self {
        LoadTestConfig {
            targets: vec![
                Target::new("undertow", "localhost", 8080),
                Target::new("netty", "localhost", 8081),
            ],
            endpoints: vec![Endpoint::Planets, Endpoint::Film],
            duration: Duration::from_secs(60),
            target_rps: 1400,
            warmup: Duration::from_secs(5),
            progress_interval: Some(Duration::from_secs(5)),
            sample_every: 100,
            error_log_limit: 5,
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl LoadTestConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.target_rps == 0 {
            bail!("target rps must be greater than 0");
        }
        if self.targets.is_empty() {
            bail!("at least one target is required");
        }
        if self.endpoints.is_empty() {
            bail!("at least one endpoint is required");
        }
        if self.sample_every == 0 {
            bail!("sample interval must be greater than 0");
        }
        let mut seen = std::collections::HashSet::new();
        for target in &self.targets {
            if !seen.insert(target.name.as_str()) {
                bail!("duplicate target name: {}", target.name);
            }
        }
        Ok(())
    }

    /// Pause between consecutive requests. Integer division, so high rates
    /// pace faster than asked (1400 rps gives 0 ms).
    pub fn interval_ms(&self) -> u64 {
        1000 / self.target_rps.max(1) as u64
    }

    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target() {
        let t: Target = "netty=127.0.0.1:8081".parse().unwrap();
        assert_eq!(t, Target::new("netty", "127.0.0.1", 8081));
        assert_eq!(t.base_url(), "http://127.0.0.1:8081");
    }

    #[test]
    fn test_parse_target_rejects_garbage() {
        assert!("netty".parse::<Target>().is_err());
        assert!("netty=localhost".parse::<Target>().is_err());
        assert!("netty=localhost:http".parse::<Target>().is_err());
        assert!("=localhost:80".parse::<Target>().is_err());
    }

    #[test]
    fn test_interval_truncates() {
        let mut config = LoadTestConfig::default();
        assert_eq!(config.interval_ms(), 0);
        config.target_rps = 100;
        assert_eq!(config.interval_ms(), 10);
        config.target_rps = 3;
        assert_eq!(config.interval_ms(), 333);
    }

    #[test]
    fn test_validate() {
        let mut config = LoadTestConfig::default();
        assert!(config.validate().is_ok());
        config.target_rps = 0;
        assert!(config.validate().is_err());

        let mut config = LoadTestConfig::default();
        config.targets.push(Target::new("netty", "localhost", 9000));
        assert!(config.validate().is_err());
    }
}
