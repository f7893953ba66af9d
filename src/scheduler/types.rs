/*!
 * Scheduler Types
 * Dispatch outcomes, per-core statistics, and utilization reports
 */

use crate::config::PolicyKind;
use crate::core::types::{CoreId, Cycle, Pid};
use crate::process::Process;
use parking_lot::Mutex;
use serde::Serialize;
use serde_with::{serde_as, DurationMilliSeconds};
use std::sync::Arc;
use std::time::Duration;

/// How a dispatch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// The process reached the end of its program
    Finished,
    /// The quantum expired; the process goes to the back of the ready queue
    Preempted,
    /// Shutdown was observed between steps; the process goes back to the front
    Interrupted,
}

/// Ready-queue entry: the handle plus the process it names
#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub pid: Pid,
    pub process: Arc<Mutex<Process>>,
}

/// Per-core statistics (advisory only)
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoreStats {
    pub core: CoreId,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub busy_time: Duration,
    /// Processes that finished on this core
    pub completed: u64,
    pub dispatches: u64,
    pub preemptions: u64,
    pub utilization_percent: f64,
    pub current: Option<Pid>,
}

/// Process counts taken under the dispatch lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Census {
    pub queued: usize,
    pub running: usize,
    pub finished: usize,
    pub admitted: usize,
}

impl Census {
    /// Every admitted process is accounted for exactly once
    pub const fn is_balanced(&self) -> bool {
        self.queued + self.running + self.finished == self.admitted
    }
}

/// Scheduler-wide utilization summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UtilizationReport {
    pub cycle: Cycle,
    pub policy: PolicyKind,
    pub cores_used: usize,
    pub cores_available: usize,
    /// Busy cores right now as a share of all cores
    pub cpu_utilization_percent: f64,
    /// Busy core-cycles over all sampled core-cycles
    pub sampled_utilization_percent: f64,
    pub census: Census,
    pub cores: Vec<CoreStats>,
}

impl UtilizationReport {
    pub(crate) fn idle(policy: PolicyKind, num_cpu: usize) -> Self {
        Self {
            cycle: 0,
            policy,
            cores_used: 0,
            cores_available: num_cpu,
            cpu_utilization_percent: 0.0,
            sampled_utilization_percent: 0.0,
            census: Census {
                queued: 0,
                running: 0,
                finished: 0,
                admitted: 0,
            },
            cores: (0..num_cpu)
                .map(|core| CoreStats {
                    core,
                    busy_time: Duration::ZERO,
                    completed: 0,
                    dispatches: 0,
                    preemptions: 0,
                    utilization_percent: 0.0,
                    current: None,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_census_balance() {
        let census = Census {
            queued: 2,
            running: 1,
            finished: 4,
            admitted: 7,
        };
        assert!(census.is_balanced());
        assert!(!Census { admitted: 8, ..census }.is_balanced());
    }

    #[test]
    fn test_idle_report() {
        let report = UtilizationReport::idle(PolicyKind::Fcfs, 3);
        assert_eq!(report.cores.len(), 3);
        assert_eq!(report.cores_available, 3);
        assert!(report.census.is_balanced());
    }

    #[test]
    fn test_core_stats_serialize_busy_time_in_millis() {
        let stats = CoreStats {
            core: 0,
            busy_time: Duration::from_millis(1500),
            completed: 1,
            dispatches: 2,
            preemptions: 1,
            utilization_percent: 50.0,
            current: Some(Pid(4)),
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["busy_time"], 1500);
        assert_eq!(json["current"], 4);
    }
}
