//! Telemetry exception reporting.
//!
//! Turns a classified [`crate::ErrorRecord`] and its captured trace into a
//! [`TelemetryEvent`] that is safe to hand to an external transport.
//!
//! # Security Guarantees
//! - The trace is sanitized before anything else is built
//! - `reason` is scrubbed in full and only then truncated
//! - The assembled event is re-scanned; failure withholds its details
//!
//! # Module Structure
//! - `event`: the [`TelemetryEvent`] payload
//! - `reporter`: [`ExceptionReporter`] and [`build_event`]
//! - `failure`: [`Failure`], a record paired with its raise-time trace
//! - `sink`: caller-owned [`TelemetrySink`] implementations

mod event;
mod failure;
mod reporter;
mod sink;

pub use event::TelemetryEvent;
pub use failure::Failure;
pub use reporter::{ExceptionReporter, build_event};
pub use sink::{JsonLinesSink, MemorySink, TelemetrySink};
