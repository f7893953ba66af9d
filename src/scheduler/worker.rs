/*!
 * Core Worker
 * Per-core loop: wait for work, dispatch under the policy, release the core
 */

use super::policy::Dispatch;
use super::traits::DispatchPolicy;
use super::types::{DispatchOutcome, Entry};
use super::Shared;
use crate::core::types::CoreId;
use crate::monitoring::DispatchSpan;
use std::sync::Arc;
use tracing::{debug, debug_span};

/// Run one simulated core until shutdown
pub(crate) fn run_core_worker(shared: Arc<Shared>, core: CoreId) {
    let span = debug_span!("core", core);
    let _enter = span.enter();
    debug!("Core worker online");

    while let Some(entry) = shared.acquire(core) {
        let timer = DispatchSpan::new(entry.pid, core);
        let outcome = {
            let _entered = timer.enter();
            let mut dispatch = Dispatch::begin(&entry.process, core, &shared.shutdown);
            shared.policy.dispatch(&mut dispatch)
        };
        let busy = timer.finish(outcome);
        shared.stats.record(core, busy, outcome);
        shared.release(core, entry, outcome);
    }

    debug!("Core worker offline");
}

impl Shared {
    /// Block until the ready queue has work or shutdown is requested
    ///
    /// The head of the queue is popped and the core slot claimed under the
    /// same lock, so no process is ever visible to two cores.
    pub(crate) fn acquire(&self, core: CoreId) -> Option<Entry> {
        let mut state = self.dispatch.lock();
        loop {
            if self.is_shut_down() {
                return None;
            }
            if let Some(entry) = state.ready.pop_front() {
                debug_assert!(
                    state.cores[core].is_none(),
                    "core {} claimed while occupied",
                    core
                );
                state.cores[core] = Some(entry.pid);
                debug!(pid = %entry.pid, "Dispatching");
                return Some(entry);
            }
            self.work_ready.wait(&mut state);
        }
    }

    /// Free the core slot and route the process by outcome
    pub(crate) fn release(&self, core: CoreId, entry: Entry, outcome: DispatchOutcome) {
        let mut state = self.dispatch.lock();
        state.cores[core] = None;

        match outcome {
            DispatchOutcome::Finished => state.finished.push(entry.pid),
            DispatchOutcome::Preempted => {
                debug!(pid = %entry.pid, "Quantum expired, requeued");
                state.ready.push_back(entry);
                self.work_ready.notify_one();
            }
            DispatchOutcome::Interrupted => {
                debug!(pid = %entry.pid, "Dispatch interrupted by shutdown");
                state.ready.push_front(entry);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerConfig;
    use crate::instruction::Instruction;
    use crate::process::{Process, ProcessState};
    use crate::scheduler::Scheduler;
    use std::sync::atomic::Ordering;

    fn prints(name: &str, count: usize) -> Process {
        let program = (0..count).map(|_| Instruction::print("tick")).collect();
        Process::with_program(name, program)
    }

    #[test]
    fn test_acquire_claims_core() {
        let scheduler = Scheduler::new(SchedulerConfig::default().with_cores(2)).unwrap();
        let pid = scheduler.admit(prints("p01", 2)).unwrap();

        let entry = scheduler.shared.acquire(1).unwrap();
        assert_eq!(entry.pid, pid);
        assert_eq!(scheduler.shared.dispatch.lock().cores[1], Some(pid));

        scheduler.shared.release(1, entry, DispatchOutcome::Preempted);
        let state = scheduler.shared.dispatch.lock();
        assert_eq!(state.cores[1], None);
        assert_eq!(state.ready.front().map(|e| e.pid), Some(pid));
    }

    #[test]
    fn test_interrupted_goes_to_front() {
        let scheduler = Scheduler::new(SchedulerConfig::default().with_cores(1)).unwrap();
        let first = scheduler.admit(prints("p01", 2)).unwrap();
        let second = scheduler.admit(prints("p02", 2)).unwrap();

        let entry = scheduler.shared.acquire(0).unwrap();
        assert_eq!(entry.pid, first);
        scheduler
            .shared
            .release(0, entry, DispatchOutcome::Interrupted);

        let order: Vec<_> = scheduler
            .shared
            .dispatch
            .lock()
            .ready
            .iter()
            .map(|e| e.pid)
            .collect();
        assert_eq!(order, vec![first, second]);
    }

    #[test]
    fn test_view_stays_running_until_release() {
        let scheduler = Scheduler::new(SchedulerConfig::default().with_cores(1)).unwrap();
        let pid = scheduler.admit(prints("p01", 1)).unwrap();

        let entry = scheduler.shared.acquire(0).unwrap();
        assert!(entry.process.lock().step(0).is_finished());

        let view = scheduler.view(pid).unwrap();
        assert!(view.finished);
        assert_eq!(view.state, ProcessState::Running { core: 0 });
        assert_eq!(scheduler.list_running(), vec![(0, pid)]);

        scheduler.shared.release(0, entry, DispatchOutcome::Finished);
        assert_eq!(scheduler.view(pid).unwrap().state, ProcessState::Finished);
        assert_eq!(scheduler.views()[0].state, ProcessState::Finished);
        assert_eq!(scheduler.list_finished(), vec![pid]);
    }

    #[test]
    fn test_acquire_returns_none_after_shutdown() {
        let scheduler = Scheduler::new(SchedulerConfig::default()).unwrap();
        scheduler.shared.shutdown.store(true, Ordering::Release);
        assert!(scheduler.shared.acquire(0).is_none());
    }
}
