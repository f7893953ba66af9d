/*!
 * Configuration Module
 * Scheduler settings and the config file loader
 */

pub mod loader;
pub mod types;

pub use types::{InstructionBounds, PolicyKind, SchedulerConfig};
