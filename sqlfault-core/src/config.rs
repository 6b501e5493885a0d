//! Telemetry reporter configuration.
//!
//! This module provides the `ReporterConfig` struct that bounds telemetry
//! payload size and chooses the placeholders written in place of redacted
//! data.

use crate::error::SqlFaultError;
use crate::sanitizer::REDACTED_PLACEHOLDER;
use serde::{Deserialize, Serialize};

/// Default upper bound on the `reason` field, in bytes.
pub const DEFAULT_REASON_MAX_BYTES: usize = 512;
/// Largest accepted `reason_max_bytes`.
pub const REASON_MAX_BYTES_LIMIT: usize = 65_536;
/// Default number of innermost frames kept in a telemetry event.
pub const DEFAULT_MAX_FRAMES: usize = 64;
/// Largest accepted `max_frames`.
pub const MAX_FRAMES_LIMIT: usize = 1_024;
/// Default reason used when an event's details have to be withheld.
pub const DEFAULT_WITHHELD_REASON: &str = "<error details withheld>";

/// Identity of the client library emitting telemetry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverInfo {
    /// Driver name
    pub name: String,
    /// Driver version
    pub version: String,
}

impl DriverInfo {
    /// Creates driver information.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Configuration for the telemetry exception reporter.
///
/// # Example
/// ```rust
/// use sqlfault_core::{DriverInfo, ReporterConfig};
///
/// let config = ReporterConfig::default()
///     .with_reason_max_bytes(256)
///     .with_driver(DriverInfo::new("example-driver", "2.1.0"));
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReporterConfig {
    /// Maximum size of `reason` in bytes, applied after scrubbing
    pub reason_max_bytes: usize,
    /// Maximum number of innermost frames kept
    pub max_frames: usize,
    /// Replacement for redacted fields and text
    pub redaction_placeholder: String,
    /// Reason used when the whole event has to be withheld
    pub withheld_reason: String,
    /// Driver identity attached to every event
    pub driver: Option<DriverInfo>,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            reason_max_bytes: DEFAULT_REASON_MAX_BYTES,
            max_frames: DEFAULT_MAX_FRAMES,
            redaction_placeholder: REDACTED_PLACEHOLDER.to_string(),
            withheld_reason: DEFAULT_WITHHELD_REASON.to_string(),
            driver: None,
        }
    }
}

impl ReporterConfig {
    /// Validates configuration parameters.
    ///
    /// # Errors
    /// Returns error if a bound is zero or too large, or a placeholder is empty
    pub fn validate(&self) -> crate::Result<()> {
        if self.reason_max_bytes == 0 {
            return Err(SqlFaultError::configuration(
                "reason_max_bytes must be greater than 0",
            ));
        }

        if self.reason_max_bytes > REASON_MAX_BYTES_LIMIT {
            return Err(SqlFaultError::configuration(format!(
                "reason_max_bytes should not exceed {}",
                REASON_MAX_BYTES_LIMIT
            )));
        }

        if self.max_frames == 0 {
            return Err(SqlFaultError::configuration(
                "max_frames must be greater than 0",
            ));
        }

        if self.max_frames > MAX_FRAMES_LIMIT {
            return Err(SqlFaultError::configuration(format!(
                "max_frames should not exceed {}",
                MAX_FRAMES_LIMIT
            )));
        }

        if self.redaction_placeholder.is_empty() {
            return Err(SqlFaultError::configuration(
                "redaction_placeholder cannot be empty",
            ));
        }

        if self.withheld_reason.is_empty() {
            return Err(SqlFaultError::configuration(
                "withheld_reason cannot be empty",
            ));
        }

        Ok(())
    }

    /// Builder method to set the reason bound.
    pub const fn with_reason_max_bytes(mut self, reason_max_bytes: usize) -> Self {
        self.reason_max_bytes = reason_max_bytes;
        self
    }

    /// Builder method to set the frame bound.
    pub const fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = max_frames;
        self
    }

    /// Builder method to set the redaction placeholder.
    pub fn with_redaction_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.redaction_placeholder = placeholder.into();
        self
    }

    /// Builder method to set the withheld reason.
    pub fn with_withheld_reason(mut self, reason: impl Into<String>) -> Self {
        self.withheld_reason = reason.into();
        self
    }

    /// Builder method to set the driver identity.
    pub fn with_driver(mut self, driver: DriverInfo) -> Self {
        self.driver = Some(driver);
        self
    }
}
