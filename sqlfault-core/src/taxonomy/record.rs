//! Classified error records.

use super::ErrorKind;
use serde::Serialize;
use std::collections::BTreeMap;

/// Maximum number of causes that may sit below any single record.
pub const MAX_CAUSE_DEPTH: usize = 8;

/// A classified failure.
///
/// Records are created once where a failure is detected and then only moved
/// up the call chain. Wrapping a lower-level fault produces a new record that
/// owns the old one as its cause; nothing is mutated in place.
///
/// # Example
/// ```rust
/// use sqlfault_core::{ErrorKind, ErrorRecord};
///
/// let timeout = ErrorRecord::new(ErrorKind::Operational, 250_003, "Request timed out");
/// let error = ErrorRecord::new(ErrorKind::Operational, 250_001, "Failed to connect")
///     .with_sql_state("08001")
///     .caused_by(timeout);
///
/// assert_eq!(error.to_string(), "250001 (08001): Failed to connect");
/// assert_eq!(error.cause().map(|c| c.code()), Some(250_003));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    code: u32,
    kind: ErrorKind,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sql_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    query_id: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    context: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cause: Option<Box<ErrorRecord>>,
}

impl ErrorRecord {
    /// Creates a record with no SQL state, query id, context or cause.
    pub fn new(kind: ErrorKind, code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            kind,
            message: message.into(),
            sql_state: None,
            query_id: None,
            context: BTreeMap::new(),
            cause: None,
        }
    }

    /// Builder method to set the SQL state.
    pub fn with_sql_state(mut self, sql_state: impl Into<String>) -> Self {
        self.sql_state = Some(sql_state.into());
        self
    }

    /// Builder method to set the server-assigned query id.
    pub fn with_query_id(mut self, query_id: impl Into<String>) -> Self {
        self.query_id = Some(query_id.into());
        self
    }

    /// Builder method to add one context entry.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Builder method to wrap a lower-level fault.
    ///
    /// The cause's own chain is cut so that this record never has more than
    /// [`MAX_CAUSE_DEPTH`] causes below it; the deepest links are dropped.
    pub fn caused_by(mut self, cause: ErrorRecord) -> Self {
        let cause = cause.truncate_causes(MAX_CAUSE_DEPTH.saturating_sub(1));
        self.cause = Some(Box::new(cause));
        self
    }

    fn truncate_causes(mut self, max_links: usize) -> Self {
        self.cause = match (max_links, self.cause.take()) {
            (0, _) | (_, None) => None,
            (n, Some(cause)) => Some(Box::new(cause.truncate_causes(n.saturating_sub(1)))),
        };
        self
    }

    /// Stable numeric error code.
    pub const fn code(&self) -> u32 {
        self.code
    }

    /// Error kind.
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Human-readable message. May contain query text; never export it unscrubbed.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Five-character SQL state, if the server supplied one.
    pub fn sql_state(&self) -> Option<&str> {
        self.sql_state.as_deref()
    }

    /// Server-assigned query id, if known.
    pub fn query_id(&self) -> Option<&str> {
        self.query_id.as_deref()
    }

    /// Additional context entries supplied by the raising layer.
    pub const fn context(&self) -> &BTreeMap<String, String> {
        &self.context
    }

    /// The wrapped lower-level fault.
    pub fn cause(&self) -> Option<&ErrorRecord> {
        self.cause.as_deref()
    }

    /// Number of causes below this record.
    pub fn depth(&self) -> usize {
        self.chain().count().saturating_sub(1)
    }

    /// Iterates over this record followed by each cause, outermost first.
    pub fn chain(&self) -> impl Iterator<Item = &ErrorRecord> {
        std::iter::successors(Some(self), |record| record.cause())
    }

    /// Innermost fault in the chain.
    pub fn root_cause(&self) -> &ErrorRecord {
        self.chain().last().unwrap_or(self)
    }
}

impl std::fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:06}", self.code)?;
        if let Some(sql_state) = &self.sql_state {
            write!(f, " ({})", sql_state)?;
        }
        f.write_str(": ")?;
        if let Some(query_id) = &self.query_id {
            write!(f, "{}: ", query_id)?;
        }
        f.write_str(&self.message)
    }
}

impl std::error::Error for ErrorRecord {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    fn chain_of(len: usize) -> ErrorRecord {
        let mut record = ErrorRecord::new(ErrorKind::Operational, 250_000, "root");
        for i in 1..len {
            record = ErrorRecord::new(ErrorKind::Operational, 250_000 + i as u32, "wrap")
                .caused_by(record);
        }
        record
    }

    #[test]
    fn test_display_format() {
        let record = ErrorRecord::new(ErrorKind::Programming, 1003, "SQL compilation error")
            .with_sql_state("42000")
            .with_query_id("01a2-b3c4");
        assert_eq!(
            record.to_string(),
            "001003 (42000): 01a2-b3c4: SQL compilation error"
        );

        let bare = ErrorRecord::new(ErrorKind::InternalError, 7, "boom");
        assert_eq!(bare.to_string(), "000007: boom");
    }

    #[test]
    fn test_source_follows_cause() {
        let inner = ErrorRecord::new(ErrorKind::Operational, 250_003, "timeout");
        let outer = ErrorRecord::new(ErrorKind::Operational, 250_001, "connect").caused_by(inner);

        let source = outer.source().unwrap();
        assert!(source.to_string().contains("timeout"));
        assert!(source.source().is_none());
        assert_eq!(outer.root_cause().code(), 250_003);
    }

    #[test]
    fn test_cause_depth_is_bounded() {
        let record = chain_of(MAX_CAUSE_DEPTH + 5);
        assert_eq!(record.depth(), MAX_CAUSE_DEPTH);
        assert_eq!(record.chain().count(), MAX_CAUSE_DEPTH + 1);
        // The outermost links survive, the deepest are dropped.
        assert_eq!(record.code(), 250_000 + (MAX_CAUSE_DEPTH + 4) as u32);
    }

    #[test]
    fn test_short_chain_untouched() {
        let record = chain_of(3);
        assert_eq!(record.depth(), 2);
        assert_eq!(record.root_cause().message(), "root");
    }

    #[test]
    fn test_serialization_omits_absent_fields() {
        let record = ErrorRecord::new(ErrorKind::Integrity, 3002, "duplicate key");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"code": 3002, "kind": "Integrity", "message": "duplicate key"})
        );
    }
}
