/*!
 * Configuration Types
 * Scheduler settings with validation
 */

use crate::core::errors::{ConfigError, ConfigResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Upper bound on simulated cores
pub const MAX_CORES: usize = 128;

/// Scheduling policy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    /// First-come-first-served, non-preemptive
    Fcfs,
    /// Round-robin with a fixed instruction quantum
    RoundRobin,
}

impl PolicyKind {
    #[inline(always)]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fcfs => "fcfs",
            Self::RoundRobin => "rr",
        }
    }
}

impl FromStr for PolicyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fcfs" | "first_come_first_served" => Ok(Self::Fcfs),
            "rr" | "round_robin" | "roundrobin" => Ok(Self::RoundRobin),
            other => Err(ConfigError::UnknownPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PolicyKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PolicyKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Inclusive range of generated program lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionBounds {
    min: u32,
    max: u32,
}

impl InstructionBounds {
    /// Create validated bounds (`1 <= min <= max`)
    pub fn new(min: u32, max: u32) -> ConfigResult<Self> {
        if min == 0 || min > max {
            return Err(ConfigError::InvalidInstructionBounds { min, max });
        }
        Ok(Self { min, max })
    }

    /// Bounds that always produce exactly `count` instructions
    pub fn exactly(count: u32) -> ConfigResult<Self> {
        Self::new(count, count)
    }

    #[inline]
    pub const fn min(&self) -> u32 {
        self.min
    }

    #[inline]
    pub const fn max(&self) -> u32 {
        self.max
    }
}

/// Scheduler configuration
///
/// Keys use the config file spelling (`num-cpu`, `quantum-cycles`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SchedulerConfig {
    pub num_cpu: usize,
    pub scheduler: PolicyKind,
    #[serde(default = "default_quantum")]
    pub quantum_cycles: u32,
    pub batch_process_freq: u64,
    pub min_ins: u32,
    pub max_ins: u32,
    #[serde(default)]
    pub delay_per_exec: u32,
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_quantum() -> u32 {
    5
}

fn default_tick_interval() -> u64 {
    10
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            num_cpu: 4,
            scheduler: PolicyKind::Fcfs,
            quantum_cycles: default_quantum(),
            batch_process_freq: 1,
            min_ins: 1000,
            max_ins: 2000,
            delay_per_exec: 0,
            tick_interval_ms: default_tick_interval(),
            seed: None,
        }
    }
}

impl SchedulerConfig {
    /// Check every setting; the first violation is reported
    pub fn validate(&self) -> ConfigResult<()> {
        if self.num_cpu == 0 || self.num_cpu > MAX_CORES {
            return Err(ConfigError::InvalidCoreCount(self.num_cpu));
        }
        if self.scheduler == PolicyKind::RoundRobin && self.quantum_cycles == 0 {
            return Err(ConfigError::InvalidQuantum(self.quantum_cycles));
        }
        if self.batch_process_freq == 0 {
            return Err(ConfigError::InvalidBatchFrequency(self.batch_process_freq));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidTickInterval(self.tick_interval_ms));
        }
        self.bounds().map(|_| ())
    }

    /// Generated program length bounds
    pub fn bounds(&self) -> ConfigResult<InstructionBounds> {
        InstructionBounds::new(self.min_ins, self.max_ins)
    }

    /// Wall-clock length of one cycle
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn with_cores(mut self, num_cpu: usize) -> Self {
        self.num_cpu = num_cpu;
        self
    }

    pub fn with_policy(mut self, scheduler: PolicyKind) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn with_quantum(mut self, quantum_cycles: u32) -> Self {
        self.quantum_cycles = quantum_cycles;
        self
    }

    pub fn with_batch_frequency(mut self, batch_process_freq: u64) -> Self {
        self.batch_process_freq = batch_process_freq;
        self
    }

    pub fn with_instruction_bounds(mut self, min_ins: u32, max_ins: u32) -> Self {
        self.min_ins = min_ins;
        self.max_ins = max_ins;
        self
    }

    pub fn with_delay_per_exec(mut self, delay_per_exec: u32) -> Self {
        self.delay_per_exec = delay_per_exec;
        self
    }

    pub fn with_tick_interval_ms(mut self, tick_interval_ms: u64) -> Self {
        self.tick_interval_ms = tick_interval_ms;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
