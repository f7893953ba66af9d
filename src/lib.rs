/*!
 * CPU Emulator Library
 * Multi-core scheduler emulation over a small virtual instruction set
 */

pub mod config;
pub mod core;
pub mod instruction;
pub mod monitoring;
pub mod process;
pub mod scheduler;

// Re-exports
pub use config::{InstructionBounds, PolicyKind, SchedulerConfig};
pub use crate::core::errors::*;
pub use crate::core::types::{CoreId, Cycle, Pid};
pub use instruction::{Instruction, InstructionKind, Operand, Template};
pub use monitoring::init_tracing;
pub use process::{LogEntry, Process, ProcessGenerator, ProcessState, ProcessView, StepOutcome};
pub use scheduler::{
    Census, CoreStats, DispatchOutcome, DispatchPolicy, Policy, Scheduler, UtilizationReport,
};
