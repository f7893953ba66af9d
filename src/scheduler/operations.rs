/*!
 * Scheduler Operations
 * Admission, lookup, and queue listings
 */

use super::types::{Census, Entry};
use super::{Scheduler, Shared};
use crate::config::InstructionBounds;
use crate::core::errors::{ProcessError, SchedulerError, SchedulerResult};
use crate::core::types::{CoreId, Pid};
use crate::process::{Process, ProcessState, ProcessView};
use std::sync::atomic::Ordering;
use tracing::{debug, instrument};

impl Shared {
    /// Store `process` and append it to the ready queue
    pub(crate) fn admit(&self, mut process: Process) -> SchedulerResult<Pid> {
        if self.is_shut_down() {
            return Err(SchedulerError::ShutDown);
        }
        if process.is_started() {
            return Err(ProcessError::AlreadyStarted(process.name().to_string()).into());
        }

        process.set_delay_per_exec(self.config.delay_per_exec);
        let instructions = process.instruction_count();
        let (pid, process) = self.table.insert(process)?;

        let mut state = self.dispatch.lock();
        state.ready.push_back(Entry { pid, process });
        state.admitted += 1;
        self.work_ready.notify_one();
        drop(state);

        debug!(%pid, instructions, "Process admitted");
        Ok(pid)
    }

    /// Generate and admit a process under the next free `pNN` name
    pub(crate) fn admit_generated(&self, bounds: InstructionBounds) -> SchedulerResult<Pid> {
        loop {
            let n = self.next_generated.fetch_add(1, Ordering::Relaxed);
            let name = format!("p{:02}", n);
            if self.table.contains(&name) {
                continue;
            }
            match self.admit(self.generator.generate_with(&name, bounds)) {
                // Taken by a concurrent explicit admission; try the next name
                Err(SchedulerError::DuplicateName(_)) => continue,
                result => return result,
            }
        }
    }

    pub(crate) fn census(&self) -> Census {
        self.dispatch.lock().census()
    }
}

/// Take the state from the core slots rather than the process
///
/// A process holds its core until `release`, even after its last step, so
/// views agree with `list_running` and `list_finished`.
fn place(view: &mut ProcessView, cores: &[Option<Pid>]) {
    view.state = match cores.iter().position(|slot| *slot == Some(view.pid)) {
        Some(core) => ProcessState::Running { core },
        None if view.finished => ProcessState::Finished,
        None => ProcessState::Queued,
    };
}

impl Scheduler {
    /// Admit a prebuilt process
    ///
    /// The process must not have been stepped yet. The configured
    /// `delay-per-exec` is applied to it.
    pub fn admit(&self, process: Process) -> SchedulerResult<Pid> {
        self.shared.admit(process)
    }

    /// Generate and admit an auto-named process with a program length in `bounds`
    #[instrument(skip(self), level = "debug")]
    pub fn admit_process(&self, bounds: InstructionBounds) -> SchedulerResult<Pid> {
        self.shared.admit_generated(bounds)
    }

    /// Generate and admit a process under a caller-chosen name
    #[instrument(skip(self), level = "debug")]
    pub fn admit_named(&self, name: &str, bounds: InstructionBounds) -> SchedulerResult<Pid> {
        if self.shared.is_shut_down() {
            return Err(SchedulerError::ShutDown);
        }
        if self.shared.table.contains(name) {
            return Err(SchedulerError::DuplicateName(name.to_string()));
        }
        self.shared
            .admit(self.shared.generator.generate_with(name, bounds))
    }

    /// Handle for `name`
    pub fn find(&self, name: &str) -> SchedulerResult<Pid> {
        self.shared
            .table
            .find(name)
            .ok_or_else(|| SchedulerError::NotFound(name.to_string()))
    }

    /// Read-only snapshot of one process
    pub fn view(&self, pid: Pid) -> SchedulerResult<ProcessView> {
        let process = self
            .shared
            .table
            .get(pid)
            .ok_or(SchedulerError::UnknownPid(pid))?;
        let mut view = process.lock().view(pid);
        place(&mut view, &self.shared.dispatch.lock().cores);
        Ok(view)
    }

    pub fn view_by_name(&self, name: &str) -> SchedulerResult<ProcessView> {
        self.view(self.find(name)?)
    }

    /// Ready queue in dispatch order
    pub fn list_queued(&self) -> Vec<Pid> {
        self.shared
            .dispatch
            .lock()
            .ready
            .iter()
            .map(|entry| entry.pid)
            .collect()
    }

    /// Occupied cores and their processes
    pub fn list_running(&self) -> Vec<(CoreId, Pid)> {
        self.shared
            .dispatch
            .lock()
            .cores
            .iter()
            .enumerate()
            .filter_map(|(core, slot)| slot.map(|pid| (core, pid)))
            .collect()
    }

    /// Finished processes in finish order
    pub fn list_finished(&self) -> Vec<Pid> {
        self.shared.dispatch.lock().finished.clone()
    }

    /// Queue, core, and finished counts read under one lock
    pub fn census(&self) -> Census {
        self.shared.census()
    }

    /// Views of every admitted process, in admission order
    pub fn views(&self) -> Vec<ProcessView> {
        let mut views: Vec<_> = self
            .shared
            .table
            .all()
            .into_iter()
            .map(|(pid, process)| process.lock().view(pid))
            .collect();
        let state = self.shared.dispatch.lock();
        for view in &mut views {
            place(view, &state.cores);
        }
        views
    }

    /// Number of processes ever admitted
    pub fn admitted(&self) -> usize {
        self.shared.table.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerConfig;
    use crate::instruction::Instruction;
    use crate::process::StepOutcome;
    use pretty_assertions::assert_eq;

    fn scheduler() -> Scheduler {
        let config = SchedulerConfig::default()
            .with_cores(2)
            .with_instruction_bounds(2, 4)
            .with_seed(11);
        Scheduler::new(config).unwrap()
    }

    #[test]
    fn test_admit_queues_in_arrival_order() {
        let scheduler = scheduler();
        let a = scheduler.admit(Process::new("a")).unwrap();
        let b = scheduler.admit(Process::new("b")).unwrap();

        assert_eq!(scheduler.list_queued(), vec![a, b]);
        assert!(scheduler.list_running().is_empty());
        assert_eq!(
            scheduler.census(),
            Census {
                queued: 2,
                running: 0,
                finished: 0,
                admitted: 2
            }
        );
    }

    #[test]
    fn test_admit_rejects_started_process() {
        let scheduler = scheduler();
        let mut process = Process::with_program("old", vec![Instruction::print("x")]);
        process.step(0);

        assert_eq!(
            scheduler.admit(process),
            Err(SchedulerError::Process(ProcessError::AlreadyStarted(
                "old".into()
            )))
        );
    }

    #[test]
    fn test_generated_names_skip_taken() {
        let scheduler = scheduler();
        scheduler.admit(Process::new("p01")).unwrap();

        let pid = scheduler.admit_process(scheduler.config().bounds().unwrap()).unwrap();
        let view = scheduler.view(pid).unwrap();
        assert_eq!(view.name, "p02");
        assert!((2..=4).contains(&view.instruction_count));
    }

    #[test]
    fn test_admit_named_duplicate() {
        let scheduler = scheduler();
        let bounds = InstructionBounds::exactly(3).unwrap();
        scheduler.admit_named("worker", bounds).unwrap();

        assert_eq!(
            scheduler.admit_named("worker", bounds),
            Err(SchedulerError::DuplicateName("worker".into()))
        );
    }

    #[test]
    fn test_lookup_errors() {
        let scheduler = scheduler();
        assert_eq!(
            scheduler.find("ghost"),
            Err(SchedulerError::NotFound("ghost".into()))
        );
        assert_eq!(
            scheduler.view(Pid(7)).map(|v| v.pid),
            Err(SchedulerError::UnknownPid(Pid(7)))
        );
        assert_eq!(
            scheduler.view_by_name("ghost").map(|v| v.pid),
            Err(SchedulerError::NotFound("ghost".into()))
        );
    }

    #[test]
    fn test_delay_per_exec_applied_on_admission() {
        let config = SchedulerConfig::default().with_delay_per_exec(1);
        let scheduler = Scheduler::new(config).unwrap();
        let program = vec![Instruction::print("a"), Instruction::print("b")];
        scheduler.admit(Process::with_program("p", program)).unwrap();

        let entry = scheduler.shared.acquire(0).unwrap();
        let mut process = entry.process.lock();
        assert_eq!(process.step(0), StepOutcome::Executed);
        assert_eq!(process.step(0), StepOutcome::Delayed);
        assert_eq!(process.step(0), StepOutcome::Finished);
    }

    #[test]
    fn test_admit_after_shutdown() {
        let scheduler = scheduler();
        scheduler.shutdown();
        assert_eq!(
            scheduler.admit(Process::new("late")),
            Err(SchedulerError::ShutDown)
        );
        assert_eq!(
            scheduler.admit_process(InstructionBounds::exactly(1).unwrap()),
            Err(SchedulerError::ShutDown)
        );
    }
}
