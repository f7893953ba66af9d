/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use super::types::Pid;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration result
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Process operation result
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Scheduler operation result
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Configuration errors, reported when a scheduler is constructed
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ConfigError {
    #[error("Invalid core count: {0}")]
    #[diagnostic(
        code(config::invalid_core_count),
        help("`num-cpu` must be between 1 and 128.")
    )]
    InvalidCoreCount(usize),

    #[error("Invalid quantum: {0} instructions")]
    #[diagnostic(
        code(config::invalid_quantum),
        help("`quantum-cycles` must be at least 1 when the round-robin scheduler is selected.")
    )]
    InvalidQuantum(u32),

    #[error("Invalid batch process frequency: {0}")]
    #[diagnostic(
        code(config::invalid_batch_frequency),
        help("`batch-process-freq` must be at least 1 cycle.")
    )]
    InvalidBatchFrequency(u64),

    #[error("Invalid instruction bounds: min {min}, max {max}")]
    #[diagnostic(
        code(config::invalid_instruction_bounds),
        help("`min-ins` must be at least 1 and no greater than `max-ins`.")
    )]
    InvalidInstructionBounds { min: u32, max: u32 },

    #[error("Invalid tick interval: {0}ms")]
    #[diagnostic(
        code(config::invalid_tick_interval),
        help("`tick-interval-ms` must be at least 1.")
    )]
    InvalidTickInterval(u64),

    #[error("Unknown scheduling policy '{0}'")]
    #[diagnostic(code(config::unknown_policy), help("Valid policies: fcfs, rr."))]
    UnknownPolicy(String),

    #[error("Could not read config file {path}: {message}")]
    #[diagnostic(
        code(config::io),
        help("Check that the file exists and is readable.")
    )]
    Io { path: String, message: String },

    #[error("Malformed configuration: {0}")]
    #[diagnostic(
        code(config::parse),
        help("Config files hold whitespace-separated `key value` pairs, or JSON with a .json extension.")
    )]
    Parse(String),
}

/// Process-related errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ProcessError {
    #[error("Process {0} has already been dispatched; its program is frozen")]
    #[diagnostic(
        code(process::already_started),
        help("Build the full program before admitting the process.")
    )]
    AlreadyStarted(String),
}

/// Scheduler-related errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum SchedulerError {
    #[error("Process '{0}' not found")]
    #[diagnostic(
        code(scheduler::process_not_found),
        help("The process may never have been admitted. Check the name.")
    )]
    NotFound(String),

    #[error("Process {0} not found")]
    #[diagnostic(
        code(scheduler::unknown_pid),
        help("Handles are only valid for the scheduler that issued them.")
    )]
    UnknownPid(Pid),

    #[error("A process named '{0}' already exists")]
    #[diagnostic(
        code(scheduler::duplicate_name),
        help("Process names are unique. Pick another name.")
    )]
    DuplicateName(String),

    #[error("Scheduler has been shut down")]
    #[diagnostic(
        code(scheduler::shut_down),
        help("Construct a new scheduler to admit more processes.")
    )]
    ShutDown,

    #[error("Failed to spawn thread: {0}")]
    #[diagnostic(
        code(scheduler::spawn_failed),
        help("The operating system refused to create a thread. Check resource limits.")
    )]
    Spawn(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Process(#[from] ProcessError),
}

impl From<std::io::Error> for SchedulerError {
    fn from(err: std::io::Error) -> Self {
        SchedulerError::Spawn(err.to_string())
    }
}
