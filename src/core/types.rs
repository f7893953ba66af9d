/*!
 * Core Types
 * Identifiers shared by the process, scheduler, and instruction layers
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a simulated core (0-based)
pub type CoreId = usize;

/// Tick of the global admission clock
pub type Cycle = u64;

/// Opaque process handle handed out by the scheduler
///
/// Handles are assigned monotonically at admission and never reused, so a
/// `Pid` stays valid for the lifetime of the scheduler that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pid(pub u32);

impl Pid {
    #[inline(always)]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Pid {
    fn from(value: u32) -> Self {
        Self(value)
    }
}
