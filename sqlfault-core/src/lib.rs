//! Error classification and telemetry sanitization for database clients.
//!
//! This crate sits on the error path of a database client library. It maps
//! low-level faults into a closed taxonomy of typed errors with stable codes,
//! and turns those errors plus their stack traces into telemetry events that
//! are guaranteed free of the query text that caused them.
//!
//! # Security Guarantees
//! - Supplied secret literals never appear in any telemetry field
//! - Source lines are never exported, not even partially
//! - Telemetry construction fails closed: it drops data rather than leak it
//! - No global state; every operation is a pure transformation
//!
//! # Architecture
//! A straight pipeline from a raised failure to a sanitized report:
//! - [`taxonomy`]: raw condition → [`ErrorRecord`]
//! - [`sanitizer`]: [`CapturedTrace`] + secrets → [`SanitizedTrace`]
//! - [`telemetry`]: record + trace + secrets → [`TelemetryEvent`]
//!
//! # Example
//! ```rust
//! use sqlfault_core::{
//!     CapturedFrame, CapturedTrace, ErrorKind, RawCondition, SensitiveLiteralSet, build_event,
//!     classify,
//! };
//!
//! let query = "SELECT * FROOOM TEST";
//! let error = classify(&RawCondition::new(
//!     1003,
//!     format!("SQL compilation error: syntax error in {}", query),
//! ));
//! assert_eq!(error.kind(), ErrorKind::Programming);
//!
//! let trace = CapturedTrace::new(vec![
//!     CapturedFrame::new("execute", "cursor.rs", 42).with_source_text(query),
//! ]);
//! let event = build_event(&error, &trace, &SensitiveLiteralSet::from_query(query));
//! assert!(!event.to_json().unwrap().contains(query));
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod sanitizer;
pub mod taxonomy;
pub mod telemetry;
pub mod trace;

// Re-export commonly used types
pub use config::{DriverInfo, ReporterConfig};
pub use error::{Result, SqlFaultError};
pub use logging::init_logging;
pub use sanitizer::{
    LiteralSanitizer, SanitizeError, SanitizedFrame, SanitizedTrace, SensitiveLiteralSet,
    TraceSanitizer, sanitize, scrub_text,
};
pub use taxonomy::{ErrorKind, ErrorRecord, RawCondition, classify, classify_json};
pub use telemetry::{
    ExceptionReporter, Failure, JsonLinesSink, MemorySink, TelemetryEvent, TelemetrySink,
    build_event,
};
pub use trace::{CapturedFrame, CapturedTrace};
