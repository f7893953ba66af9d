/*!
 * Cycle Clock
 * Tick driver and admission threads connected by a flume channel
 */

use super::Shared;
use crate::core::errors::SchedulerResult;
use crate::core::types::Cycle;
use flume::RecvTimeoutError;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// Running tick clock
///
/// The driver thread advances the global cycle counter once per interval
/// and forwards each cycle to the admission thread, which runs
/// `on_cycle`. Ticks queue up rather than being dropped while admission is
/// busy.
pub struct CycleClock {
    stop_tx: Option<flume::Sender<()>>,
    driver: Option<JoinHandle<()>>,
    admission: Option<JoinHandle<()>>,
}

impl CycleClock {
    pub(crate) fn spawn(shared: Arc<Shared>, interval: Duration) -> SchedulerResult<Self> {
        let (stop_tx, stop_rx) = flume::bounded::<()>(1);
        let (cycle_tx, cycle_rx) = flume::unbounded::<Cycle>();

        let driver_shared = Arc::clone(&shared);
        let driver = thread::Builder::new()
            .name("tick-driver".into())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        let cycle = driver_shared.cycle.fetch_add(1, Ordering::AcqRel) + 1;
                        if cycle_tx.send(cycle).is_err() {
                            break;
                        }
                    }
                    // Stop requested or the clock handle is gone
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;

        let admission = thread::Builder::new()
            .name("admission".into())
            .spawn(move || {
                for cycle in cycle_rx.iter() {
                    shared.on_cycle(cycle);
                }
                debug!("Admission thread drained");
            });

        let admission = match admission {
            Ok(handle) => handle,
            Err(e) => {
                let _ = stop_tx.send(());
                let _ = driver.join();
                return Err(e.into());
            }
        };

        Ok(Self {
            stop_tx: Some(stop_tx),
            driver: Some(driver),
            admission: Some(admission),
        })
    }

    /// Stop ticking and join both threads
    ///
    /// Cycles already forwarded are still handled before this returns.
    pub fn stop(mut self) {
        self.halt();
    }

    fn halt(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.try_send(());
        }
        // The driver owns the only cycle sender, so admission ends after it
        for handle in [self.driver.take(), self.admission.take()].into_iter().flatten() {
            if handle.join().is_err() {
                warn!("Clock thread panicked");
            }
        }
    }
}

impl Drop for CycleClock {
    fn drop(&mut self) {
        if self.stop_tx.is_some() {
            warn!("Cycle clock dropped without stop(); stopping now");
            self.halt();
        }
    }
}
