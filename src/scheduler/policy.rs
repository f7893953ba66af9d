/*!
 * Scheduling Policies
 * First-come-first-served and instruction-quantum round robin
 */

use super::traits::DispatchPolicy;
use super::types::DispatchOutcome;
use crate::config::{PolicyKind, SchedulerConfig};
use crate::core::types::CoreId;
use crate::process::{Process, StepOutcome};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

/// One core's exclusive hold on a process for the length of a dispatch
///
/// Creating it marks the process as assigned to the core; dropping it
/// clears the assignment.
pub struct Dispatch<'a> {
    process: &'a Mutex<Process>,
    core: CoreId,
    stop: &'a AtomicBool,
    steps: u32,
}

impl<'a> Dispatch<'a> {
    pub(crate) fn begin(process: &'a Mutex<Process>, core: CoreId, stop: &'a AtomicBool) -> Self {
        process.lock().begin_dispatch(core);
        Self {
            process,
            core,
            stop,
            steps: 0,
        }
    }

    /// Step the process once
    ///
    /// Any `Sleep` is served after the process lock is released.
    #[inline]
    pub fn step(&mut self) -> StepOutcome {
        self.steps += 1;
        let (outcome, pause) = self.process.lock().step_deferred(self.core);
        if !pause.is_zero() {
            thread::sleep(pause);
        }
        outcome
    }

    /// Shutdown has been requested
    #[inline]
    pub fn should_stop(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    pub fn core(&self) -> CoreId {
        self.core
    }

    /// Steps taken so far in this dispatch
    pub fn steps(&self) -> u32 {
        self.steps
    }
}

impl Drop for Dispatch<'_> {
    fn drop(&mut self) {
        self.process.lock().end_dispatch();
    }
}

/// Non-preemptive: run the process to completion
#[derive(Debug, Clone, Copy, Default)]
pub struct Fcfs;

impl DispatchPolicy for Fcfs {
    fn dispatch(&self, dispatch: &mut Dispatch<'_>) -> DispatchOutcome {
        loop {
            if dispatch.should_stop() {
                return DispatchOutcome::Interrupted;
            }
            if dispatch.step().is_finished() {
                return DispatchOutcome::Finished;
            }
        }
    }

    fn kind(&self) -> PolicyKind {
        PolicyKind::Fcfs
    }
}

/// Preemptive: at most `quantum` executed instructions per dispatch
///
/// Steps spent inside a delay window do not count against the quantum.
#[derive(Debug, Clone, Copy)]
pub struct RoundRobin {
    quantum: u32,
}

impl RoundRobin {
    /// A zero quantum is raised to 1 so every dispatch makes progress
    pub fn new(quantum: u32) -> Self {
        Self {
            quantum: quantum.max(1),
        }
    }

    pub fn quantum(&self) -> u32 {
        self.quantum
    }
}

impl DispatchPolicy for RoundRobin {
    fn dispatch(&self, dispatch: &mut Dispatch<'_>) -> DispatchOutcome {
        let mut executed = 0;
        while executed < self.quantum {
            if dispatch.should_stop() {
                return DispatchOutcome::Interrupted;
            }
            match dispatch.step() {
                StepOutcome::Finished => return DispatchOutcome::Finished,
                StepOutcome::Executed => executed += 1,
                StepOutcome::Delayed => {}
            }
        }
        DispatchOutcome::Preempted
    }

    fn kind(&self) -> PolicyKind {
        PolicyKind::RoundRobin
    }
}

/// The configured policy
#[derive(Debug, Clone, Copy)]
pub enum Policy {
    Fcfs(Fcfs),
    RoundRobin(RoundRobin),
}

impl Policy {
    pub fn from_config(config: &SchedulerConfig) -> Self {
        match config.scheduler {
            PolicyKind::Fcfs => Self::Fcfs(Fcfs),
            PolicyKind::RoundRobin => Self::RoundRobin(RoundRobin::new(config.quantum_cycles)),
        }
    }
}

impl DispatchPolicy for Policy {
    fn dispatch(&self, dispatch: &mut Dispatch<'_>) -> DispatchOutcome {
        match self {
            Self::Fcfs(policy) => policy.dispatch(dispatch),
            Self::RoundRobin(policy) => policy.dispatch(dispatch),
        }
    }

    fn kind(&self) -> PolicyKind {
        match self {
            Self::Fcfs(policy) => policy.kind(),
            Self::RoundRobin(policy) => policy.kind(),
        }
    }
}
