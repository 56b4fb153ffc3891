use std::time::{Duration, Instant};

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// Receives one tick per poll-loop iteration.
pub trait CpuTracker: Send {
    /// Account for one iteration of the background loop.
    fn track(&mut self);
}

/// Tracker that ignores every tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopCpuTracker;

impl CpuTracker for NoopCpuTracker {
    fn track(&mut self) {}
}

/// Samples this process's CPU usage, at most once per `interval`, and logs it.
pub struct ProcessCpuTracker {
    system: System,
    pid: Option<Pid>,
    interval: Duration,
    last_sample: Option<Instant>,
    last_usage: Option<f32>,
    ticks: u64,
}

impl std::fmt::Debug for ProcessCpuTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessCpuTracker")
            .field("pid", &self.pid)
            .field("interval", &self.interval)
            .field("last_usage", &self.last_usage)
            .finish()
    }
}

impl Default for ProcessCpuTracker {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl ProcessCpuTracker {
    /// Tracker for the current process.
    pub fn new(interval: Duration) -> Self {
        let pid = sysinfo::get_current_pid()
            .inspect_err(|e| tracing::debug!(error = %e, "cpu tracking disabled"))
            .ok();
        Self {
            system: System::new(),
            pid,
            interval,
            last_sample: None,
            last_usage: None,
            ticks: 0,
        }
    }

    /// Most recent CPU usage sample, in percent of one core.
    pub fn last_usage(&self) -> Option<f32> {
        self.last_usage
    }

    /// Ticks received since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl CpuTracker for ProcessCpuTracker {
    fn track(&mut self) {
        self.ticks += 1;
        if self
            .last_sample
            .is_some_and(|t| t.elapsed() < self.interval)
        {
            return;
        }
        self.last_sample = Some(Instant::now());

        let Some(pid) = self.pid else {
            return;
        };
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_cpu(),
        );
        if let Some(p) = self.system.process(pid) {
            let usage = p.cpu_usage();
            self.last_usage = Some(usage);
            tracing::debug!(cpu_percent = usage, iterations = self.ticks, "ticker cpu usage");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/ticker/telemetry.rs"]
mod tests;
