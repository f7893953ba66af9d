/*!
 * Config Loading Tests
 * Text and JSON config files on disk
 */

use cpu_emulator::{ConfigError, PolicyKind, Scheduler, SchedulerConfig, SchedulerError};
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::{Builder, NamedTempFile};

fn write_file(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_text_config() {
    let file = write_file(
        ".txt",
        "num-cpu 2\nscheduler \"rr\"\nquantum-cycles 3\nbatch-process-freq 4\n\
         min-ins 10\nmax-ins 20\ndelay-per-exec 1\nmax-overall-mem 16384\n",
    );

    let config = SchedulerConfig::from_file(file.path()).unwrap();
    assert_eq!(
        config,
        SchedulerConfig::default()
            .with_cores(2)
            .with_policy(PolicyKind::RoundRobin)
            .with_quantum(3)
            .with_batch_frequency(4)
            .with_instruction_bounds(10, 20)
            .with_delay_per_exec(1)
    );
}

#[test]
fn test_load_json_config() {
    let file = write_file(
        ".json",
        r#"{"num-cpu": 8, "scheduler": "fcfs", "batch-process-freq": 1,
            "min-ins": 1, "max-ins": 5, "tick-interval-ms": 2, "seed": 7}"#,
    );

    let config = SchedulerConfig::from_file(file.path()).unwrap();
    assert_eq!(config.num_cpu, 8);
    assert_eq!(config.scheduler, PolicyKind::Fcfs);
    assert_eq!(config.quantum_cycles, 5);
    assert_eq!(config.tick_interval_ms, 2);
    assert_eq!(config.seed, Some(7));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.txt");

    let err = SchedulerConfig::from_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn test_unknown_policy() {
    let file = write_file(
        ".txt",
        "num-cpu 2 scheduler lottery batch-process-freq 1 min-ins 1 max-ins 2",
    );
    let err = SchedulerConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(ref msg) if msg.contains("lottery")));
}

#[test]
fn test_invalid_config_rejected_by_scheduler() {
    let zero_quantum = SchedulerConfig::default()
        .with_policy(PolicyKind::RoundRobin)
        .with_quantum(0);
    assert_eq!(
        Scheduler::new(zero_quantum).err(),
        Some(SchedulerError::Config(ConfigError::InvalidQuantum(0)))
    );

    let inverted = SchedulerConfig::default().with_instruction_bounds(9, 3);
    assert_eq!(
        Scheduler::new(inverted).err(),
        Some(SchedulerError::Config(ConfigError::InvalidInstructionBounds {
            min: 9,
            max: 3
        }))
    );
}
