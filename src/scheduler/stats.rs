/*!
 * Scheduler Statistics
 * Cycle handling, utilization reports, and per-core snapshots
 */

use super::traits::DispatchPolicy;
use super::types::{CoreStats, UtilizationReport};
use super::{Scheduler, Shared};
use crate::core::types::Cycle;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{trace, warn};

impl Shared {
    /// Handle one tick of the admission clock
    ///
    /// Samples core occupancy, admits one generated process when `cycle` is
    /// a multiple of the batch frequency (unless admission was stopped), and
    /// publishes a fresh report.
    pub(crate) fn on_cycle(&self, cycle: Cycle) {
        let busy = self.dispatch.lock().running();
        self.stats.sample(busy, self.config.num_cpu);

        if cycle % self.config.batch_process_freq == 0 && self.is_generating() {
            if let Err(e) = self.admit_generated(self.generator.bounds()) {
                warn!(cycle, error = %e, "Periodic admission failed");
            }
        }

        let report = self.report(cycle);
        trace!(
            cycle,
            used = report.cores_used,
            queued = report.census.queued,
            "Tick"
        );
        self.latest.store(Arc::new(report));
    }

    pub(crate) fn report(&self, cycle: Cycle) -> UtilizationReport {
        // Occupancy and counts come from one lock acquisition so they agree
        let (census, current) = {
            let state = self.dispatch.lock();
            (state.census(), state.cores.clone())
        };

        let uptime = self.uptime();
        let cores: Vec<CoreStats> = current
            .iter()
            .enumerate()
            .map(|(core, pid)| self.stats.snapshot(core, uptime, *pid))
            .collect();

        let cores_available = self.stats.num_cores();
        let cpu_utilization_percent = if cores_available == 0 {
            0.0
        } else {
            census.running as f64 / cores_available as f64 * 100.0
        };

        UtilizationReport {
            cycle,
            policy: self.policy.kind(),
            cores_used: census.running,
            cores_available,
            cpu_utilization_percent,
            sampled_utilization_percent: self.stats.sampled_utilization(),
            census,
            cores,
        }
    }
}

impl Scheduler {
    /// Current value of the global cycle counter
    pub fn cycle(&self) -> Cycle {
        self.shared.cycle.load(Ordering::Acquire)
    }

    /// Drive one cycle by hand
    ///
    /// The tick clock calls this on its own; tests and embedders without a
    /// clock can call it directly.
    pub fn on_cycle(&self, cycle: Cycle) {
        self.shared.on_cycle(cycle)
    }

    /// Per-core statistics
    pub fn stats(&self) -> Vec<CoreStats> {
        self.report().cores
    }

    /// Fresh utilization report, computed now
    pub fn report(&self) -> UtilizationReport {
        self.shared.report(self.cycle())
    }

    /// Report published by the most recent cycle
    ///
    /// Lock-free; may lag the live state by one tick.
    pub fn latest_report(&self) -> Arc<UtilizationReport> {
        self.shared.latest.load_full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerConfig;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_on_cycle_admits_on_batch_frequency() {
        let config = SchedulerConfig::default()
            .with_batch_frequency(3)
            .with_instruction_bounds(1, 2)
            .with_seed(1);
        let scheduler = Scheduler::new(config).unwrap();

        for cycle in 1..=9 {
            scheduler.on_cycle(cycle);
        }

        assert_eq!(scheduler.admitted(), 3);
        assert_eq!(scheduler.latest_report().cycle, 9);
        assert_eq!(scheduler.latest_report().census.queued, 3);
        assert!(scheduler.find("p01").is_ok());
        assert!(scheduler.find("p03").is_ok());
    }

    #[test]
    fn test_idle_report() {
        let scheduler = Scheduler::new(SchedulerConfig::default().with_cores(3)).unwrap();
        let report = scheduler.report();

        assert_eq!(report.cores_used, 0);
        assert_eq!(report.cores_available, 3);
        assert_eq!(report.cpu_utilization_percent, 0.0);
        assert_eq!(report.cores.len(), 3);
        assert_eq!(scheduler.stats().len(), 3);
        assert!(report.census.is_balanced());
    }

    #[test]
    fn test_on_cycle_after_shutdown_does_not_admit() {
        let scheduler = Scheduler::new(SchedulerConfig::default()).unwrap();
        scheduler.shutdown();
        scheduler.on_cycle(1);
        assert_eq!(scheduler.admitted(), 0);
    }

    #[test]
    fn test_on_cycle_after_stop_does_not_admit() {
        let config = SchedulerConfig::default()
            .with_batch_frequency(2)
            .with_instruction_bounds(1, 2)
            .with_seed(3);
        let scheduler = Scheduler::new(config).unwrap();

        scheduler.on_cycle(2);
        assert_eq!(scheduler.admitted(), 1);

        scheduler.stop();
        for cycle in 3..=10 {
            scheduler.on_cycle(cycle);
        }
        assert_eq!(scheduler.admitted(), 1);
        assert_eq!(scheduler.latest_report().cycle, 10);
    }
}
