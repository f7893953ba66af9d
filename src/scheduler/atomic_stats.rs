/*!
 * Lock-Free Core Statistics
 * Atomic per-core counters updated by core workers without touching the dispatch lock
 */

use super::types::{CoreStats, DispatchOutcome};
use crate::core::types::{CoreId, Pid};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counters for one core
///
/// # Performance
/// - Cache-line aligned so neighbouring cores never share a line
#[repr(C, align(64))]
#[derive(Default)]
struct CoreCounters {
    busy_micros: AtomicU64,
    completed: AtomicU64,
    dispatches: AtomicU64,
    preemptions: AtomicU64,
}

/// Atomic statistics for every core plus cycle-sampled occupancy
pub(crate) struct AtomicCoreStats {
    cores: Vec<CoreCounters>,
    busy_core_cycles: AtomicU64,
    sampled_core_cycles: AtomicU64,
}

impl AtomicCoreStats {
    pub fn new(num_cpu: usize) -> Self {
        Self {
            cores: (0..num_cpu).map(|_| CoreCounters::default()).collect(),
            busy_core_cycles: AtomicU64::new(0),
            sampled_core_cycles: AtomicU64::new(0),
        }
    }

    /// Account one finished dispatch
    ///
    /// # Performance
    /// Hot path - called once per dispatch by every core worker
    #[inline]
    pub fn record(&self, core: CoreId, busy: Duration, outcome: DispatchOutcome) {
        let Some(counters) = self.cores.get(core) else {
            return;
        };
        let micros = u64::try_from(busy.as_micros()).unwrap_or(u64::MAX);
        counters.busy_micros.fetch_add(micros, Ordering::Relaxed);
        counters.dispatches.fetch_add(1, Ordering::Relaxed);
        match outcome {
            DispatchOutcome::Finished => {
                counters.completed.fetch_add(1, Ordering::Relaxed);
            }
            DispatchOutcome::Preempted => {
                counters.preemptions.fetch_add(1, Ordering::Relaxed);
            }
            DispatchOutcome::Interrupted => {}
        }
    }

    /// Sample core occupancy for one cycle
    #[inline]
    pub fn sample(&self, busy_cores: usize, total_cores: usize) {
        self.busy_core_cycles
            .fetch_add(busy_cores as u64, Ordering::Relaxed);
        self.sampled_core_cycles
            .fetch_add(total_cores as u64, Ordering::Relaxed);
    }

    /// Busy share of all sampled core-cycles, in percent
    pub fn sampled_utilization(&self) -> f64 {
        let total = self.sampled_core_cycles.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        self.busy_core_cycles.load(Ordering::Relaxed) as f64 / total as f64 * 100.0
    }

    /// Snapshot one core
    ///
    /// # Note
    /// Counters are read individually, so a snapshot taken mid-dispatch may
    /// mix values from before and after that dispatch. Fine for reporting.
    pub fn snapshot(&self, core: CoreId, uptime: Duration, current: Option<Pid>) -> CoreStats {
        let (busy_time, completed, dispatches, preemptions) = match self.cores.get(core) {
            Some(c) => (
                Duration::from_micros(c.busy_micros.load(Ordering::Relaxed)),
                c.completed.load(Ordering::Relaxed),
                c.dispatches.load(Ordering::Relaxed),
                c.preemptions.load(Ordering::Relaxed),
            ),
            None => (Duration::ZERO, 0, 0, 0),
        };

        let utilization_percent = if uptime.is_zero() {
            0.0
        } else {
            (busy_time.as_secs_f64() / uptime.as_secs_f64() * 100.0).min(100.0)
        };

        CoreStats {
            core,
            busy_time,
            completed,
            dispatches,
            preemptions,
            utilization_percent,
            current,
        }
    }

    pub fn num_cores(&self) -> usize {
        self.cores.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_snapshot() {
        let stats = AtomicCoreStats::new(2);
        stats.record(1, Duration::from_millis(30), DispatchOutcome::Preempted);
        stats.record(1, Duration::from_millis(20), DispatchOutcome::Finished);

        let snap = stats.snapshot(1, Duration::from_millis(100), None);
        assert_eq!(snap.busy_time, Duration::from_millis(50));
        assert_eq!(snap.dispatches, 2);
        assert_eq!(snap.completed, 1);
        assert_eq!(snap.preemptions, 1);
        assert!((snap.utilization_percent - 50.0).abs() < 1e-9);

        let idle = stats.snapshot(0, Duration::from_millis(100), None);
        assert_eq!(idle.dispatches, 0);
        assert_eq!(idle.utilization_percent, 0.0);
    }

    #[test]
    fn test_utilization_is_capped() {
        let stats = AtomicCoreStats::new(1);
        stats.record(0, Duration::from_secs(2), DispatchOutcome::Finished);
        let snap = stats.snapshot(0, Duration::from_secs(1), None);
        assert_eq!(snap.utilization_percent, 100.0);
    }

    #[test]
    fn test_sampled_utilization() {
        let stats = AtomicCoreStats::new(4);
        assert_eq!(stats.sampled_utilization(), 0.0);

        stats.sample(1, 4);
        stats.sample(3, 4);
        assert!((stats.sampled_utilization() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_range_core_is_ignored() {
        let stats = AtomicCoreStats::new(1);
        stats.record(5, Duration::from_millis(1), DispatchOutcome::Finished);
        assert_eq!(stats.snapshot(5, Duration::from_secs(1), None).completed, 0);
    }
}
