/*!
 * Monitoring
 * Structured tracing and the append-only event log
 */

pub mod event_log;
mod tracer;

pub use event_log::{EventSink, FileEventLog, MemoryEventLog, TracingEventLog};
pub use tracer::{init_tracing, span_iteration, ENV_TRACE_JSON};
