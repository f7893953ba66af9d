/*!
 * Tracing
 * Subscriber setup and timed dispatch spans
 *
 * Features:
 * - JSON-formatted logs for structured parsing
 * - Thread names on every event, so core workers show up as `core-<id>`
 * - Per-dispatch spans with outcome and duration
 */

use crate::core::types::{CoreId, Pid};
use crate::scheduler::DispatchOutcome;
use std::time::{Duration, Instant};
use tracing::{debug, info, span, Level, Span};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Dispatches slower than this are reported at debug level with `slow = true`
const SLOW_DISPATCH: Duration = Duration::from_millis(100);

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - EMULATOR_TRACE_JSON: Enable JSON output (default: false)
///
/// A second call is a no-op.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("EMULATOR_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_names(true)
                    .with_span_events(FmtSpan::NONE)
                    .compact(),
            )
            .try_init()
    };

    if installed.is_ok() {
        info!(json = use_json, "Tracing initialized");
    }
}

/// Span covering one dispatch of one process on one core
pub struct DispatchSpan {
    span: Span,
    start: Instant,
}

impl DispatchSpan {
    pub fn new(pid: Pid, core: CoreId) -> Self {
        let span = span!(
            Level::DEBUG,
            "dispatch",
            pid = pid.0,
            core,
            outcome = tracing::field::Empty,
            duration_us = tracing::field::Empty,
        );
        Self {
            span,
            start: Instant::now(),
        }
    }

    /// Enter the span context
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }

    /// Time since the dispatch began
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Close the span with its outcome and return the dispatch duration
    pub fn finish(self, outcome: DispatchOutcome) -> Duration {
        let duration = self.start.elapsed();
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        self.span.record("outcome", tracing::field::debug(outcome));
        self.span.record("duration_us", micros);

        let _entered = self.span.enter();
        if duration > SLOW_DISPATCH {
            debug!(?outcome, duration_ms = duration.as_millis() as u64, slow = true, "dispatch ended");
        } else {
            debug!(?outcome, duration_us = micros, "dispatch ended");
        }
        duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice() {
        init_tracing();
        init_tracing();
    }

    #[test]
    fn test_dispatch_span_measures_duration() {
        let span = DispatchSpan::new(Pid(1), 0);
        std::thread::sleep(Duration::from_millis(2));
        assert!(span.elapsed() >= Duration::from_millis(2));
        assert!(span.finish(DispatchOutcome::Finished) >= Duration::from_millis(2));
    }
}
