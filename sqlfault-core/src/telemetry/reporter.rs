//! Telemetry exception reporter.

use super::event::{EventParts, TelemetryEvent};
use super::sink::TelemetrySink;
use crate::config::ReporterConfig;
use crate::sanitizer::{
    LiteralSanitizer, SanitizeError, SensitiveLiteralSet, TraceSanitizer, scrub_text,
};
use crate::taxonomy::ErrorRecord;
use crate::trace::CapturedTrace;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Builds sanitized [`TelemetryEvent`]s from classified errors.
///
/// The reporter holds only its configuration and sanitizer; it keeps nothing
/// between calls and can be shared across threads.
///
/// # Security
/// Building an event never fails. If any part of the event cannot be proven
/// free of every secret literal, the reporter emits a withheld event instead:
/// fixed reason, empty trace, no optional fields.
#[derive(Debug, Clone)]
pub struct ExceptionReporter<S = LiteralSanitizer> {
    config: ReporterConfig,
    sanitizer: S,
}

impl Default for ExceptionReporter<LiteralSanitizer> {
    fn default() -> Self {
        let config = ReporterConfig::default();
        let sanitizer = LiteralSanitizer::new(config.redaction_placeholder.clone());
        Self { config, sanitizer }
    }
}

impl ExceptionReporter<LiteralSanitizer> {
    /// Creates a reporter using the literal sanitizer.
    ///
    /// # Errors
    /// Returns a configuration error if `config` does not validate.
    pub fn new(config: ReporterConfig) -> crate::Result<Self> {
        let sanitizer = LiteralSanitizer::new(config.redaction_placeholder.clone());
        Self::with_sanitizer(config, sanitizer)
    }
}

impl<S: TraceSanitizer> ExceptionReporter<S> {
    /// Creates a reporter with a custom trace sanitizer.
    ///
    /// # Errors
    /// Returns a configuration error if `config` does not validate.
    pub fn with_sanitizer(config: ReporterConfig, sanitizer: S) -> crate::Result<Self> {
        config.validate()?;
        Ok(Self { config, sanitizer })
    }

    /// Reporter configuration.
    pub const fn config(&self) -> &ReporterConfig {
        &self.config
    }

    /// Builds an event stamped with the current time.
    pub fn build_event(
        &self,
        error: &ErrorRecord,
        trace: &CapturedTrace,
        secrets: &SensitiveLiteralSet,
    ) -> TelemetryEvent {
        self.build_event_at(error, trace, secrets, Utc::now())
    }

    /// Builds an event stamped with `occurred_at`.
    pub fn build_event_at(
        &self,
        error: &ErrorRecord,
        trace: &CapturedTrace,
        secrets: &SensitiveLiteralSet,
        occurred_at: DateTime<Utc>,
    ) -> TelemetryEvent {
        match self.try_build(error, trace, secrets, occurred_at) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(
                    code = error.code(),
                    kind = %error.kind(),
                    error = %e,
                    "telemetry event failed sanitization; withholding details"
                );
                let reason = truncate_to_boundary(
                    self.config.withheld_reason.clone(),
                    self.config.reason_max_bytes,
                );
                TelemetryEvent::withheld(
                    &reason,
                    error.code(),
                    error.kind(),
                    occurred_at,
                    self.config.driver.as_ref(),
                    secrets,
                )
            }
        }
    }

    /// Builds an event and hands it to `sink`.
    ///
    /// # Errors
    /// Returns whatever error the sink reports; building itself cannot fail.
    pub fn report<K: TelemetrySink + ?Sized>(
        &self,
        error: &ErrorRecord,
        trace: &CapturedTrace,
        secrets: &SensitiveLiteralSet,
        sink: &mut K,
    ) -> crate::Result<()> {
        sink.submit(self.build_event(error, trace, secrets))
    }

    fn try_build(
        &self,
        error: &ErrorRecord,
        trace: &CapturedTrace,
        secrets: &SensitiveLiteralSet,
        occurred_at: DateTime<Utc>,
    ) -> Result<TelemetryEvent, SanitizeError> {
        let placeholder = self.config.redaction_placeholder.as_str();
        let scrub = |text: &str| scrub_text(text, secrets, placeholder);

        let trace = self
            .sanitizer
            .sanitize(trace, secrets)?
            .keep_innermost(self.config.max_frames);

        // Truncation strictly follows scrubbing.
        let reason = truncate_to_boundary(scrub(error.message())?, self.config.reason_max_bytes);

        let sql_state = error.sql_state().map(scrub).transpose()?;
        let query_id = error.query_id().map(scrub).transpose()?;

        let mut context = BTreeMap::new();
        for (key, value) in error.context() {
            context.insert(scrub(key)?, scrub(value)?);
        }

        TelemetryEvent::assemble(
            EventParts {
                reason,
                code: error.code(),
                kind: error.kind(),
                trace,
                occurred_at,
                sql_state,
                query_id,
                context,
                driver: self.config.driver.clone(),
            },
            secrets,
        )
    }
}

/// Builds an event with the default reporter.
///
/// # Example
/// ```rust
/// use sqlfault_core::{CapturedTrace, RawCondition, SensitiveLiteralSet, build_event, classify};
///
/// let query = "SELECT * FROOOM TEST";
/// let error = classify(&RawCondition::new(1003, format!("syntax error in '{}'", query)));
/// let event = build_event(&error, &CapturedTrace::empty(), &SensitiveLiteralSet::from_query(query));
///
/// assert_eq!(event.code(), 1003);
/// assert_eq!(event.reason(), "syntax error in '<redacted>'");
/// ```
pub fn build_event(
    error: &ErrorRecord,
    trace: &CapturedTrace,
    secrets: &SensitiveLiteralSet,
) -> TelemetryEvent {
    ExceptionReporter::default().build_event(error, trace, secrets)
}

/// Cuts `text` to at most `max_bytes`, backing off to a UTF-8 boundary.
fn truncate_to_boundary(mut text: String, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text;
    }
    let mut cut = max_bytes;
    while !text.is_char_boundary(cut) {
        cut = cut.saturating_sub(1);
    }
    text.truncate(cut);
    text
}
