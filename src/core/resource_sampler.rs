use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System};

/// One reading of this process's resource usage.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResourceReading {
    pub cpu_percent: f64,
    pub memory_mb: f64,
}

/// Samples CPU and resident memory of the load generator's own process from
/// the OS. CPU is measured between consecutive refreshes, so the first
/// reading after construction is 0.
pub struct ResourceSampler {
    pid: Pid,
    system: System,
    readings: Vec<ResourceReading>,
}

impl Default for ResourceSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceSampler {
    pub fn new() -> Self {
        let pid = Pid::from_u32(std::process::id());
        let system = System::new_with_specifics(
            RefreshKind::new().with_processes(ProcessRefreshKind::everything()),
        );
        ResourceSampler {
            pid,
            system,
            readings: Vec::new(),
        }
    }

    fn refresh(&mut self) -> ResourceReading {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[self.pid]),
            true,
            ProcessRefreshKind::everything(),
        );
        match self.system.process(self.pid) {
            Some(process) => ResourceReading {
                cpu_percent: process.cpu_usage() as f64,
                memory_mb: process.memory() as f64 / (1024.0 * 1024.0),
            },
            None => ResourceReading::default(),
        }
    }

    pub fn sample(&mut self) -> ResourceReading {
        let reading = self.refresh();
        self.readings.push(reading);
        reading
    }

    /// Last stored reading, without touching the OS. Refreshing here would
    /// shorten the window the next CPU sample covers.
    pub fn latest(&self) -> ResourceReading {
        self.readings.last().copied().unwrap_or_default()
    }

    pub fn reset(&mut self) {
        self.readings.clear();
    }

    pub fn readings(&self) -> &[ResourceReading] {
        &self.readings
    }

    pub fn avg_cpu_percent(&self) -> f64 {
        if self.readings.is_empty() {
            return 0.0;
        }
        self.readings.iter().map(|r| r.cpu_percent).sum::<f64>() / self.readings.len() as f64
    }

    pub fn avg_memory_mb(&self) -> f64 {
        if self.readings.is_empty() {
            return 0.0;
        }
        self.readings.iter().map(|r| r.memory_mb).sum::<f64>() / self.readings.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_readings_average_zero() {
        let sampler = ResourceSampler::new();
        assert_eq!(sampler.avg_cpu_percent(), 0.0);
        assert_eq!(sampler.avg_memory_mb(), 0.0);
    }

    #[test]
    fn test_sample_sees_own_process() {
        let mut sampler = ResourceSampler::new();
        let reading = sampler.sample();
        assert!(reading.memory_mb > 0.0);
        assert!(reading.cpu_percent >= 0.0);
        assert_eq!(sampler.readings().len(), 1);

        sampler.reset();
        assert!(sampler.readings().is_empty());
    }

    #[test]
    fn test_latest_reuses_stored_reading() {
        let mut sampler = ResourceSampler::new();
        assert_eq!(sampler.latest(), ResourceReading::default());

        sampler.sample();
        let second = sampler.sample();
        assert_eq!(sampler.latest(), second);
        assert_eq!(sampler.latest(), second);
        // reading it back does not add a sample
        assert_eq!(sampler.readings().len(), 2);
    }
}
