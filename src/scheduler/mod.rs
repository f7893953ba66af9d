/*!
 * CPU Scheduler
 * Multi-core dispatch over a single FIFO ready queue with pluggable policies
 */

mod atomic_stats;
mod clock;
mod operations;
pub mod policy;
mod stats;
mod table;
pub mod traits;
pub mod types;
mod worker;

// Re-export public API
pub use clock::CycleClock;
pub use policy::{Dispatch, Fcfs, Policy, RoundRobin};
pub use traits::DispatchPolicy;
pub use types::{Census, CoreStats, DispatchOutcome, UtilizationReport};

use crate::config::SchedulerConfig;
use crate::core::errors::{SchedulerError, SchedulerResult};
use crate::core::types::{CoreId, Pid};
use crate::process::ProcessGenerator;
use arc_swap::ArcSwap;
use atomic_stats::AtomicCoreStats;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use table::ProcessTable;
use tracing::{info, warn};
use types::Entry;

/// Queue and core occupancy, always mutated together under one lock
pub(crate) struct DispatchState {
    pub ready: VecDeque<Entry>,
    pub cores: Vec<Option<Pid>>,
    pub finished: Vec<Pid>,
    pub admitted: usize,
}

impl DispatchState {
    fn new(num_cpu: usize) -> Self {
        Self {
            ready: VecDeque::new(),
            cores: vec![None; num_cpu],
            finished: Vec::new(),
            admitted: 0,
        }
    }

    pub fn running(&self) -> usize {
        self.cores.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn census(&self) -> Census {
        Census {
            queued: self.ready.len(),
            running: self.running(),
            finished: self.finished.len(),
            admitted: self.admitted,
        }
    }
}

/// State shared by the handle, the core workers, and the tick clock
pub(crate) struct Shared {
    pub config: SchedulerConfig,
    pub policy: Policy,
    pub table: ProcessTable,
    pub dispatch: Mutex<DispatchState>,
    pub work_ready: Condvar,
    pub shutdown: AtomicBool,
    /// Cleared by `stop`; gates periodic admission
    pub generating: AtomicBool,
    pub cycle: AtomicU64,
    pub stats: AtomicCoreStats,
    pub generator: ProcessGenerator,
    pub next_generated: AtomicU32,
    pub latest: ArcSwap<UtilizationReport>,
    pub started_at: OnceLock<Instant>,
}

impl Shared {
    #[inline]
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_generating(&self) -> bool {
        self.generating.load(Ordering::Acquire) && !self.is_shut_down()
    }

    /// Time since the cores were started; zero before that
    pub fn uptime(&self) -> Duration {
        self.started_at
            .get()
            .map(Instant::elapsed)
            .unwrap_or(Duration::ZERO)
    }
}

#[derive(Default)]
struct Runtime {
    workers: Vec<JoinHandle<()>>,
    clock: Option<CycleClock>,
    shut_down: bool,
}

/// Multi-core CPU scheduler
///
/// Owns every admitted process. Callers hold [`Pid`] handles and query the
/// scheduler for current state.
///
/// # Lifecycle
/// `new` spawns nothing. `start_cores` spawns one worker per core, `start`
/// additionally runs the tick clock, and `shutdown` (also run on drop) stops
/// everything and joins.
pub struct Scheduler {
    shared: Arc<Shared>,
    runtime: Mutex<Runtime>,
}

impl Scheduler {
    /// Validate `config` and build an idle scheduler
    pub fn new(config: SchedulerConfig) -> SchedulerResult<Self> {
        config.validate()?;

        let bounds = config.bounds()?;
        let generator = match config.seed {
            Some(seed) => ProcessGenerator::with_seed(bounds, seed),
            None => ProcessGenerator::new(bounds),
        };
        let policy = Policy::from_config(&config);

        info!(
            cores = config.num_cpu,
            policy = %config.scheduler,
            quantum = config.quantum_cycles,
            batch_freq = config.batch_process_freq,
            "Scheduler initialized"
        );

        let shared = Shared {
            policy,
            table: ProcessTable::new(),
            dispatch: Mutex::new(DispatchState::new(config.num_cpu)),
            work_ready: Condvar::new(),
            shutdown: AtomicBool::new(false),
            generating: AtomicBool::new(true),
            cycle: AtomicU64::new(0),
            stats: AtomicCoreStats::new(config.num_cpu),
            generator,
            next_generated: AtomicU32::new(1),
            latest: ArcSwap::from_pointee(UtilizationReport::idle(config.scheduler, config.num_cpu)),
            started_at: OnceLock::new(),
            config,
        };

        Ok(Self {
            shared: Arc::new(shared),
            runtime: Mutex::new(Runtime::default()),
        })
    }

    /// Spawn the core workers; later calls are no-ops
    pub fn start_cores(&self) -> SchedulerResult<()> {
        let mut runtime = self.runtime.lock();
        self.ensure_cores(&mut runtime)
    }

    fn ensure_cores(&self, runtime: &mut Runtime) -> SchedulerResult<()> {
        if runtime.shut_down {
            return Err(SchedulerError::ShutDown);
        }
        if !runtime.workers.is_empty() {
            return Ok(());
        }

        self.shared.started_at.get_or_init(Instant::now);
        for core in 0..self.shared.config.num_cpu {
            let shared = Arc::clone(&self.shared);
            let spawned = thread::Builder::new()
                .name(format!("core-{}", core))
                .spawn(move || worker::run_core_worker(shared, core));

            match spawned {
                Ok(handle) => runtime.workers.push(handle),
                Err(e) => {
                    // Leave no half-started pool behind
                    self.shared.shutdown.store(true, Ordering::Release);
                    self.wake_all();
                    for handle in runtime.workers.drain(..) {
                        let _ = handle.join();
                    }
                    runtime.shut_down = true;
                    return Err(e.into());
                }
            }
        }

        info!(cores = runtime.workers.len(), "Core workers started");
        Ok(())
    }

    /// Start the core workers and the tick clock
    pub fn start(&self) -> SchedulerResult<()> {
        let mut runtime = self.runtime.lock();
        self.ensure_cores(&mut runtime)?;
        self.shared.generating.store(true, Ordering::Release);

        if runtime.clock.is_none() {
            runtime.clock = Some(CycleClock::spawn(
                Arc::clone(&self.shared),
                self.shared.config.tick_interval(),
            )?);
            info!(
                interval_ms = self.shared.config.tick_interval_ms,
                "Tick clock started"
            );
        }
        Ok(())
    }

    /// Stop automatic admission; workers keep draining the ready queue
    ///
    /// Cycles driven by hand afterwards no longer admit either, until the
    /// next `start`.
    pub fn stop(&self) {
        self.shared.generating.store(false, Ordering::Release);
        let clock = self.runtime.lock().clock.take();
        if let Some(clock) = clock {
            clock.stop();
            info!(cycle = self.cycle(), "Tick clock stopped");
        }
    }

    /// Whether the tick clock is running
    pub fn is_running(&self) -> bool {
        self.runtime.lock().clock.is_some()
    }

    /// Stop admission and every worker, then join them
    ///
    /// In-flight instructions run to completion first. Safe to call any
    /// number of times.
    pub fn shutdown(&self) {
        let (clock, workers) = {
            let mut runtime = self.runtime.lock();
            if runtime.shut_down {
                return;
            }
            runtime.shut_down = true;
            (runtime.clock.take(), std::mem::take(&mut runtime.workers))
        };

        if let Some(clock) = clock {
            clock.stop();
        }

        self.shared.shutdown.store(true, Ordering::Release);
        self.wake_all();

        let count = workers.len();
        for handle in workers {
            if handle.join().is_err() {
                warn!("Core worker panicked before shutdown");
            }
        }

        info!(workers = count, "Scheduler shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.is_shut_down()
    }

    /// Notify under the lock so a worker between its flag check and its
    /// wait cannot miss the wakeup
    fn wake_all(&self) {
        let _guard = self.shared.dispatch.lock();
        self.shared.work_ready.notify_all();
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.shared.config
    }

    pub fn policy(&self) -> &Policy {
        &self.shared.policy
    }

    pub fn num_cores(&self) -> CoreId {
        self.shared.config.num_cpu
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PolicyKind;
    use crate::core::errors::ConfigError;

    #[test]
    fn test_new_rejects_invalid_config() {
        let err = Scheduler::new(SchedulerConfig::default().with_cores(0)).err();
        assert_eq!(
            err,
            Some(SchedulerError::Config(ConfigError::InvalidCoreCount(0)))
        );
    }

    #[test]
    fn test_new_spawns_nothing() {
        let scheduler = Scheduler::new(SchedulerConfig::default()).unwrap();
        assert!(!scheduler.is_running());
        assert!(scheduler.runtime.lock().workers.is_empty());
        assert_eq!(scheduler.policy().kind(), PolicyKind::Fcfs);
    }

    #[test]
    fn test_start_cores_is_idempotent() {
        let scheduler = Scheduler::new(SchedulerConfig::default().with_cores(2)).unwrap();
        scheduler.start_cores().unwrap();
        scheduler.start_cores().unwrap();
        assert_eq!(scheduler.runtime.lock().workers.len(), 2);
        scheduler.shutdown();
    }

    #[test]
    fn test_shutdown_twice_without_start() {
        let scheduler = Scheduler::new(SchedulerConfig::default()).unwrap();
        scheduler.shutdown();
        scheduler.shutdown();
        assert!(scheduler.is_shut_down());
        assert_eq!(scheduler.start_cores(), Err(SchedulerError::ShutDown));
    }
}
