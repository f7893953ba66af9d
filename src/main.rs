/*!
 * CPU Emulator - Main Entry Point
 *
 * Loads a scheduler configuration, runs the emulator until Ctrl+C or the
 * configured run time elapses, then prints the final utilization report.
 *
 * Usage: emulator [config-path]   (default: config.txt)
 */

use cpu_emulator::{init_tracing, Scheduler, SchedulerConfig};
use miette::{IntoDiagnostic, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_CONFIG: &str = "config.txt";
const DEFAULT_RUN_SECS: u64 = 10;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let config = SchedulerConfig::from_file(&path)?;

    let run_for = match std::env::var("EMULATOR_RUN_SECS") {
        Ok(raw) => raw.parse::<u64>().into_diagnostic()?,
        Err(_) => DEFAULT_RUN_SECS,
    };

    info!(config = %path, run_secs = run_for, "CPU emulator starting");
    let scheduler = Arc::new(Scheduler::new(config)?);
    scheduler.start()?;

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "Could not listen for Ctrl+C");
            }
            info!("Interrupted, shutting down");
        }
        _ = tokio::time::sleep(Duration::from_secs(run_for)) => {
            info!("Run time elapsed, shutting down");
        }
    }

    // Joining worker threads blocks, so keep it off the async runtime
    let finished = Arc::clone(&scheduler);
    tokio::task::spawn_blocking(move || finished.shutdown())
        .await
        .into_diagnostic()?;

    let report = scheduler.report();
    println!(
        "{}",
        serde_json::to_string_pretty(&report).into_diagnostic()?
    );

    info!(
        admitted = report.census.admitted,
        finished = report.census.finished,
        "CPU emulator stopped"
    );
    Ok(())
}
