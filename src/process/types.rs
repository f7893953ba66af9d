/*!
 * Process Types
 * Execution records, step outcomes, and serializable process views
 */

use crate::core::types::{CoreId, Pid};
use serde::{Deserialize, Serialize};
use std::fmt;
use time::macros::format_description;
use time::OffsetDateTime;

/// Result of a single [`Process::step`](super::Process::step)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    /// One instruction ran and more remain
    Executed,
    /// The step was consumed by a `delay-per-exec` window
    Delayed,
    /// The process is finished (now, or already was)
    Finished,
}

impl StepOutcome {
    #[inline(always)]
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

/// Where a process is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProcessState {
    Queued,
    Running { core: CoreId },
    Finished,
}

/// One human-readable execution record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: OffsetDateTime,
    pub core: CoreId,
    pub message: String,
}

impl LogEntry {
    pub fn now(core: CoreId, message: String) -> Self {
        Self {
            timestamp: OffsetDateTime::now_utc(),
            core,
            message,
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stamp = self
            .timestamp
            .format(format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second]"
            ))
            .map_err(|_| fmt::Error)?;
        write!(f, "({}) Core:{} - {}", stamp, self.core, self.message)
    }
}

/// Read-only snapshot of a process for the presentation layer
#[derive(Debug, Clone, Serialize)]
pub struct ProcessView {
    pub pid: Pid,
    pub name: String,
    pub state: ProcessState,
    pub started: bool,
    pub finished: bool,
    pub start_time: Option<OffsetDateTime>,
    pub finish_time: Option<OffsetDateTime>,
    pub next_index: usize,
    pub instruction_count: usize,
    pub dispatches: u32,
    pub logs: Vec<LogEntry>,
}

impl ProcessView {
    /// Fraction of the program already executed (0.0 ..= 1.0)
    pub fn progress(&self) -> f64 {
        if self.instruction_count == 0 {
            return if self.finished { 1.0 } else { 0.0 };
        }
        self.next_index as f64 / self.instruction_count as f64
    }
}
