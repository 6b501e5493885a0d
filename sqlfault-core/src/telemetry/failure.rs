//! A classified error paired with the trace captured when it was raised.

use super::{ExceptionReporter, TelemetryEvent};
use crate::sanitizer::{SensitiveLiteralSet, TraceSanitizer, sanitize};
use crate::taxonomy::{ErrorRecord, RawCondition, classify};
use crate::trace::CapturedTrace;

/// An [`ErrorRecord`] together with the stack it was raised from.
///
/// This is the value a client library propagates to its callers: `record`
/// is the user-facing failure, `trace` is diagnostic material that only ever
/// leaves the process through [`Failure::telemetry_event`] or
/// [`Failure::telemetry_traceback`].
///
/// # Example
/// ```rust
/// use sqlfault_core::{ErrorKind, Failure, RawCondition, SensitiveLiteralSet};
///
/// let query = "SELECT * FROOOM TEST";
/// let failure = Failure::raise(&RawCondition::new(1003, "SQL compilation error"));
///
/// assert_eq!(failure.record().kind(), ErrorKind::Programming);
/// assert!(!failure
///     .telemetry_traceback(&SensitiveLiteralSet::from_query(query))
///     .contains(query));
/// ```
#[derive(Debug, Clone)]
pub struct Failure {
    record: ErrorRecord,
    trace: CapturedTrace,
}

impl Failure {
    /// Pairs a record with an already captured trace.
    pub const fn new(record: ErrorRecord, trace: CapturedTrace) -> Self {
        Self { record, trace }
    }

    /// Wraps a record and captures the current stack.
    pub fn capture(record: ErrorRecord) -> Self {
        Self::new(record, CapturedTrace::capture())
    }

    /// Classifies a raw condition and captures the current stack.
    pub fn raise(condition: &RawCondition) -> Self {
        Self::capture(classify(condition))
    }

    /// The classified error.
    pub const fn record(&self) -> &ErrorRecord {
        &self.record
    }

    /// The unsanitized trace.
    pub const fn trace(&self) -> &CapturedTrace {
        &self.trace
    }

    /// Consumes the failure, keeping only the record.
    pub fn into_record(self) -> ErrorRecord {
        self.record
    }

    /// Rendered sanitized trace, or an empty string if sanitization fails.
    pub fn telemetry_traceback(&self, secrets: &SensitiveLiteralSet) -> String {
        sanitize(&self.trace, secrets)
            .map(|trace| trace.to_string())
            .unwrap_or_default()
    }

    /// Builds the telemetry event for this failure.
    pub fn telemetry_event<S: TraceSanitizer>(
        &self,
        reporter: &ExceptionReporter<S>,
        secrets: &SensitiveLiteralSet,
    ) -> TelemetryEvent {
        reporter.build_event(&self.record, &self.trace, secrets)
    }
}

impl From<ErrorRecord> for Failure {
    fn from(record: ErrorRecord) -> Self {
        Self::new(record, CapturedTrace::empty())
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.record, f)
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.record)
    }
}
