/*!
 * Process Module
 * Simulated processes, their read-only views, and the synthetic generator
 */

pub mod generator;
pub mod pcb;
pub mod types;

// Re-export for convenience
pub use generator::ProcessGenerator;
pub use pcb::Process;
pub use types::{LogEntry, ProcessState, ProcessView, StepOutcome};
