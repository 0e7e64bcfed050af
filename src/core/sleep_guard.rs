#[cfg(not(target_os = "windows"))]
use std::process::{Child, Command};

use tracing::{debug, warn};
#[cfg(target_os = "windows")]
use winapi::um::winbase::SetThreadExecutionState;
#[cfg(target_os = "windows")]
use winapi::um::winnt::{ES_CONTINUOUS, ES_SYSTEM_REQUIRED};

/// Keeps the host from going to sleep while a run is in progress; a full run
/// is several minutes of wall time with no user input. Released on drop.
pub struct SleepGuard {
    active: bool,
    #[cfg(not(target_os = "windows"))]
    inhibitor: Option<Child>,
}

impl SleepGuard {
    pub fn new(prevent: bool) -> Self {
        let mut guard = SleepGuard {
            active: prevent,
            #[cfg(not(target_os = "windows"))]
            inhibitor: None,
        };
        if prevent {
            guard.inhibit();
        }
        guard
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    #[cfg(target_os = "windows")]
    fn inhibit(&mut self) {
        unsafe {
            SetThreadExecutionState(ES_CONTINUOUS | ES_SYSTEM_REQUIRED);
        }
        debug!("system sleep inhibited");
    }

    #[cfg(not(target_os = "windows"))]
    fn inhibit(&mut self) {
        let spawned = Self::inhibitor_command().spawn();
        match spawned {
            Ok(child) => {
                debug!(pid = child.id(), "system sleep inhibited");
                self.inhibitor = Some(child);
            }
            Err(e) => {
                warn!(error = %e, "could not inhibit system sleep, continuing anyway");
                self.active = false;
            }
        }
    }

    #[cfg(target_os = "macos")]
    fn inhibitor_command() -> Command {
        let mut cmd = Command::new("caffeinate");
        cmd.arg("-i");
        cmd
    }

    #[cfg(all(not(target_os = "macos"), not(target_os = "windows")))]
    fn inhibitor_command() -> Command {
        let mut cmd = Command::new("systemd-inhibit");
        cmd.arg("--what=handle-lid-switch:sleep:idle")
            .arg(format!("--who={}", env!("CARGO_PKG_NAME")))
            .arg("--why=load test in progress")
            .arg("--mode=block")
            .arg("sleep")
            .arg("infinity");
        cmd
    }
}

impl Drop for SleepGuard {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        #[cfg(target_os = "windows")]
        unsafe {
            SetThreadExecutionState(ES_CONTINUOUS);
        }
        #[cfg(not(target_os = "windows"))]
        if let Some(mut child) = self.inhibitor.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        debug!("system sleep allowed again");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_guard_does_nothing() {
        let guard = SleepGuard::new(false);
        assert!(!guard.is_active());
        drop(guard);
    }
}
