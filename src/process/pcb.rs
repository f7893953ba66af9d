/*!
 * Process Control Block
 * Program, cursor, variable store, lifecycle timestamps, and execution log
 */

use super::types::{LogEntry, ProcessState, ProcessView, StepOutcome};
use crate::core::errors::{ProcessError, ProcessResult};
use crate::core::types::{CoreId, Pid};
use crate::instruction::{Instruction, VarName};
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{info, trace};

/// A simulated process
///
/// Owned by the scheduler's process table. While assigned to a core only that
/// core's worker touches it.
#[derive(Debug, Clone)]
pub struct Process {
    name: String,
    program: Arc<Vec<Instruction>>,
    next_index: usize,
    variables: HashMap<VarName, u16, ahash::RandomState>,
    started: bool,
    finished: bool,
    start_time: Option<OffsetDateTime>,
    finish_time: Option<OffsetDateTime>,
    current_core: Option<CoreId>,
    logs: Vec<LogEntry>,
    delay_per_exec: u32,
    delay_remaining: u32,
    dispatches: u32,
}

impl Process {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_program(name, Vec::new())
    }

    pub fn with_program(name: impl Into<String>, program: Vec<Instruction>) -> Self {
        Self {
            name: name.into(),
            program: Arc::new(program),
            next_index: 0,
            variables: HashMap::default(),
            started: false,
            finished: false,
            start_time: None,
            finish_time: None,
            current_core: None,
            logs: Vec::new(),
            delay_per_exec: 0,
            delay_remaining: 0,
            dispatches: 0,
        }
    }

    /// Append to the program
    ///
    /// The program is frozen at first dispatch; later calls fail with
    /// [`ProcessError::AlreadyStarted`].
    pub fn add_instruction(&mut self, instruction: Instruction) -> ProcessResult<()> {
        if self.started {
            return Err(ProcessError::AlreadyStarted(self.name.clone()));
        }
        Arc::make_mut(&mut self.program).push(instruction);
        Ok(())
    }

    /// Steps to skip after every executed instruction
    pub fn set_delay_per_exec(&mut self, delay: u32) {
        self.delay_per_exec = delay;
    }

    /// Execute the pending instruction
    ///
    /// A no-op on a finished process. Inside a delay window the step is
    /// consumed without executing anything.
    pub fn step(&mut self, core: CoreId) -> StepOutcome {
        let (outcome, pause) = self.step_deferred(core);
        if !pause.is_zero() {
            thread::sleep(pause);
        }
        outcome
    }

    /// [`step`](Self::step) without serving the instruction's sleep
    ///
    /// Returns the wall-clock pause still owed. Core workers sleep it off
    /// after unlocking the process so observers are never held up by it.
    pub(crate) fn step_deferred(&mut self, core: CoreId) -> (StepOutcome, Duration) {
        if self.finished {
            return (StepOutcome::Finished, Duration::ZERO);
        }

        if !self.started {
            self.started = true;
            self.start_time = Some(OffsetDateTime::now_utc());
        }

        if self.delay_remaining > 0 {
            self.delay_remaining -= 1;
            return (StepOutcome::Delayed, Duration::ZERO);
        }

        let mut pause = Duration::ZERO;
        let program = Arc::clone(&self.program);
        if let Some(instruction) = program.get(self.next_index) {
            trace!(
                process = %self.name,
                core,
                index = self.next_index,
                instruction = %instruction,
                "executing"
            );
            pause = instruction.execute(self, core);
            self.next_index += 1;
            self.delay_remaining = self.delay_per_exec;
        }

        if self.next_index >= program.len() {
            self.finish(core);
            return (StepOutcome::Finished, pause);
        }

        (StepOutcome::Executed, pause)
    }

    fn finish(&mut self, core: CoreId) {
        self.finished = true;
        self.finish_time = Some(OffsetDateTime::now_utc());
        self.delay_remaining = 0;
        let message = format!("Process {} has completed all its commands.", self.name);
        self.log(core, message);
        info!(process = %self.name, core, "Process finished");
    }

    /// Variable value; absent variables read as 0
    #[inline]
    pub fn read_var(&self, name: &str) -> u16 {
        self.variables.get(name).copied().unwrap_or(0)
    }

    #[inline]
    pub fn write_var(&mut self, name: &str, value: u16) {
        match self.variables.get_mut(name) {
            Some(slot) => *slot = value,
            None => {
                self.variables.insert(name.into(), value);
            }
        }
    }

    /// Append an execution record
    pub fn log(&mut self, core: CoreId, message: String) {
        self.logs.push(LogEntry::now(core, message));
    }

    /// Record assignment to `core`
    pub(crate) fn begin_dispatch(&mut self, core: CoreId) {
        debug_assert!(
            !self.finished,
            "finished process {} was dispatched",
            self.name
        );
        debug_assert!(
            self.current_core.is_none(),
            "process {} assigned to two cores",
            self.name
        );
        self.current_core = Some(core);
        self.dispatches += 1;
    }

    pub(crate) fn end_dispatch(&mut self) {
        self.current_core = None;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn program(&self) -> &[Instruction] {
        &self.program
    }

    pub fn instruction_count(&self) -> usize {
        self.program.len()
    }

    pub fn next_index(&self) -> usize {
        self.next_index
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn start_time(&self) -> Option<OffsetDateTime> {
        self.start_time
    }

    pub fn finish_time(&self) -> Option<OffsetDateTime> {
        self.finish_time
    }

    pub fn current_core(&self) -> Option<CoreId> {
        self.current_core
    }

    pub fn dispatches(&self) -> u32 {
        self.dispatches
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    pub fn state(&self) -> ProcessState {
        match (self.finished, self.current_core) {
            (true, _) => ProcessState::Finished,
            (false, Some(core)) => ProcessState::Running { core },
            (false, None) => ProcessState::Queued,
        }
    }

    pub fn view(&self, pid: Pid) -> ProcessView {
        ProcessView {
            pid,
            name: self.name.clone(),
            state: self.state(),
            started: self.started,
            finished: self.finished,
            start_time: self.start_time,
            finish_time: self.finish_time,
            next_index: self.next_index,
            instruction_count: self.program.len(),
            dispatches: self.dispatches,
            logs: self.logs.clone(),
        }
    }
}
