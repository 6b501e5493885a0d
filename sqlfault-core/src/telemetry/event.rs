//! The sanitized telemetry payload.

use crate::config::DriverInfo;
use crate::error::SqlFaultError;
use crate::sanitizer::{SanitizeError, SanitizedTrace, SensitiveLiteralSet};
use crate::taxonomy::ErrorKind;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// A sanitized description of one failure, ready for a telemetry transport.
///
/// Events are only built by [`super::ExceptionReporter`], which guarantees
/// that no secret literal occurs in any string field. They are never shown
/// to end users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryEvent {
    reason: String,
    code: u32,
    kind: ErrorKind,
    trace: SanitizedTrace,
    occurred_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sql_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    query_id: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    context: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    driver: Option<DriverInfo>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    withheld: bool,
}

/// Field values of an event before the final leak scan.
pub(crate) struct EventParts {
    pub(crate) reason: String,
    pub(crate) code: u32,
    pub(crate) kind: ErrorKind,
    pub(crate) trace: SanitizedTrace,
    pub(crate) occurred_at: DateTime<Utc>,
    pub(crate) sql_state: Option<String>,
    pub(crate) query_id: Option<String>,
    pub(crate) context: BTreeMap<String, String>,
    pub(crate) driver: Option<DriverInfo>,
}

impl TelemetryEvent {
    /// Assembles an event and scans every string field for secrets.
    pub(crate) fn assemble(
        parts: EventParts,
        secrets: &SensitiveLiteralSet,
    ) -> Result<Self, SanitizeError> {
        let event = Self {
            reason: parts.reason,
            code: parts.code,
            kind: parts.kind,
            trace: parts.trace,
            occurred_at: parts.occurred_at,
            sql_state: parts.sql_state,
            query_id: parts.query_id,
            context: parts.context,
            driver: parts.driver,
            withheld: false,
        };
        event.verify(secrets)?;
        Ok(event)
    }

    /// Builds the fail-closed event: fixed reason, no trace, no optional
    /// fields except a driver identity that passes the scan.
    pub(crate) fn withheld(
        reason: &str,
        code: u32,
        kind: ErrorKind,
        occurred_at: DateTime<Utc>,
        driver: Option<&DriverInfo>,
        secrets: &SensitiveLiteralSet,
    ) -> Self {
        let driver = driver
            .filter(|driver| !secrets.leaks_into(&driver.name) && !secrets.leaks_into(&driver.version))
            .cloned();
        Self {
            reason: secrets.safe_placeholder(reason).to_string(),
            code,
            kind,
            trace: SanitizedTrace::empty(),
            occurred_at,
            sql_state: None,
            query_id: None,
            context: BTreeMap::new(),
            driver,
            withheld: true,
        }
    }

    /// Checks that no string field contains a secret.
    ///
    /// # Errors
    /// Returns [`SanitizeError::LeakDetected`] naming the first offending field.
    pub fn verify(&self, secrets: &SensitiveLiteralSet) -> Result<(), SanitizeError> {
        let leak = |field: &str| SanitizeError::LeakDetected {
            field: field.to_string(),
        };

        if secrets.leaks_into(&self.reason) {
            return Err(leak("reason"));
        }
        if self.sql_state.as_deref().is_some_and(|s| secrets.leaks_into(s)) {
            return Err(leak("sqlState"));
        }
        if self.query_id.as_deref().is_some_and(|s| secrets.leaks_into(s)) {
            return Err(leak("queryId"));
        }
        if self
            .context
            .iter()
            .any(|(key, value)| secrets.leaks_into(key) || secrets.leaks_into(value))
        {
            return Err(leak("context"));
        }
        if let Some(driver) = &self.driver {
            if secrets.leaks_into(&driver.name) || secrets.leaks_into(&driver.version) {
                return Err(leak("driver"));
            }
        }
        self.trace.verify(secrets)
    }

    /// Scrubbed, length-bounded failure reason.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Stable error code.
    pub const fn code(&self) -> u32 {
        self.code
    }

    /// Error kind.
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Sanitized trace, innermost frames last.
    pub const fn trace(&self) -> &SanitizedTrace {
        &self.trace
    }

    /// When the event was built.
    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    /// Scrubbed SQL state.
    pub fn sql_state(&self) -> Option<&str> {
        self.sql_state.as_deref()
    }

    /// Scrubbed query id.
    pub fn query_id(&self) -> Option<&str> {
        self.query_id.as_deref()
    }

    /// Scrubbed context entries.
    pub const fn context(&self) -> &BTreeMap<String, String> {
        &self.context
    }

    /// Driver identity.
    pub const fn driver(&self) -> Option<&DriverInfo> {
        self.driver.as_ref()
    }

    /// Returns true if the event's details were withheld because
    /// sanitization could not be proven.
    pub const fn is_withheld(&self) -> bool {
        self.withheld
    }

    /// Serializes the event as a single-line JSON object.
    ///
    /// # Errors
    /// Returns [`SqlFaultError::Serialization`] if serialization fails.
    pub fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string(self)
            .map_err(|e| SqlFaultError::serialization("Failed to serialize telemetry event", e))
    }
}
