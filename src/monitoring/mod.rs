/*!
 * Monitoring
 * Tracing subscriber setup and dispatch spans
 */

mod tracer;

pub use tracer::{init_tracing, DispatchSpan};
