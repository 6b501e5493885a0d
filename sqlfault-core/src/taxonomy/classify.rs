//! Classification of raw fault conditions.

use super::codes::{ER_MALFORMED_CONDITION, kind_for_code};
use super::{ErrorKind, ErrorRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Context key lifted into [`ErrorRecord::sql_state`].
pub const CONTEXT_SQL_STATE: &str = "sqlState";
/// Context key lifted into [`ErrorRecord::query_id`].
pub const CONTEXT_QUERY_ID: &str = "queryId";

/// Failure description handed over by the execution or transport layer.
///
/// Every field is optional so that incomplete descriptors can still be
/// represented and classified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCondition {
    /// Numeric fault code from the lower layer
    #[serde(default)]
    pub fault_code: Option<i64>,
    /// Message supplied with the fault
    #[serde(default)]
    pub message: Option<String>,
    /// Additional string context (`sqlState`, `queryId`, ...)
    #[serde(default)]
    pub context: BTreeMap<String, String>,
}

impl RawCondition {
    /// Creates a well-formed condition.
    pub fn new(fault_code: i64, message: impl Into<String>) -> Self {
        Self {
            fault_code: Some(fault_code),
            message: Some(message.into()),
            context: BTreeMap::new(),
        }
    }

    /// Builder method to add one context entry.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Classifies a raw condition into an [`ErrorRecord`].
///
/// Total over every input: a code inside a known range gets that range's
/// kind and keeps its value, an unknown code becomes
/// [`ErrorKind::InternalError`] with the code echoed, and a malformed
/// condition becomes [`ErrorKind::InternalError`] with code
/// [`ER_MALFORMED_CONDITION`].
///
/// # Example
/// ```rust
/// use sqlfault_core::{ErrorKind, RawCondition, classify};
///
/// let record = classify(&RawCondition::new(1003, "SQL compilation error: syntax error"));
/// assert_eq!(record.code(), 1003);
/// assert_eq!(record.kind(), ErrorKind::Programming);
/// ```
pub fn classify(condition: &RawCondition) -> ErrorRecord {
    let Some(message) = condition.message.as_deref() else {
        return malformed("fault condition is missing a message");
    };
    let Some(fault_code) = condition.fault_code else {
        return malformed("fault condition is missing a fault code");
    };
    let Ok(code) = u32::try_from(fault_code) else {
        return malformed("fault condition carries an out-of-range fault code")
            .with_context("faultCode", fault_code.to_string());
    };

    let mut record = ErrorRecord::new(kind_for_code(code), code, message);
    for (key, value) in &condition.context {
        record = match key.as_str() {
            CONTEXT_SQL_STATE => record.with_sql_state(value.as_str()),
            CONTEXT_QUERY_ID => record.with_query_id(value.as_str()),
            _ => record.with_context(key.as_str(), value.as_str()),
        };
    }
    record
}

/// Parses a JSON fault condition and classifies it.
///
/// Input that does not parse as a [`RawCondition`] is classified as a
/// malformed condition rather than reported as an error.
pub fn classify_json(input: &str) -> ErrorRecord {
    match serde_json::from_str::<RawCondition>(input) {
        Ok(condition) => classify(&condition),
        Err(e) => {
            tracing::debug!(line = e.line(), column = e.column(), "unparseable fault condition");
            malformed("fault condition is not valid JSON")
        }
    }
}

fn malformed(message: &str) -> ErrorRecord {
    ErrorRecord::new(ErrorKind::InternalError, ER_MALFORMED_CONDITION, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::codes::{ER_FAILED_TO_CONNECT, ER_SQL_SYNTAX};

    #[test]
    fn test_classify_syntax_error() {
        let condition = RawCondition::new(
            i64::from(ER_SQL_SYNTAX),
            "SQL compilation error: syntax error line 1 at position 9 unexpected 'FROOOM'.",
        )
        .with_context("sqlState", "42000")
        .with_context("queryId", "01b0c1d2-0000-1111")
        .with_context("statementType", "SELECT");

        let record = classify(&condition);
        assert_eq!(record.code(), 1003);
        assert_eq!(record.kind(), ErrorKind::Programming);
        assert_eq!(record.sql_state(), Some("42000"));
        assert_eq!(record.query_id(), Some("01b0c1d2-0000-1111"));
        assert_eq!(
            record.context().get("statementType").map(String::as_str),
            Some("SELECT")
        );
        assert!(!record.context().contains_key("sqlState"));
    }

    #[test]
    fn test_classify_unknown_code_echoes() {
        let record = classify(&RawCondition::new(987_654, "mystery"));
        assert_eq!(record.kind(), ErrorKind::InternalError);
        assert_eq!(record.code(), 987_654);
        assert_eq!(record.message(), "mystery");
    }

    #[test]
    fn test_classify_missing_fields() {
        let no_code = RawCondition {
            fault_code: None,
            message: Some("x".to_string()),
            context: BTreeMap::new(),
        };
        let no_message = RawCondition {
            fault_code: Some(i64::from(ER_FAILED_TO_CONNECT)),
            message: None,
            context: BTreeMap::new(),
        };

        for condition in [no_code, no_message, RawCondition::default()] {
            let record = classify(&condition);
            assert_eq!(record.kind(), ErrorKind::InternalError);
            assert_eq!(record.code(), ER_MALFORMED_CONDITION);
        }
    }

    #[test]
    fn test_classify_out_of_range_codes() {
        for fault_code in [-1, i64::MIN, i64::from(u32::MAX) + 1, i64::MAX] {
            let record = classify(&RawCondition::new(fault_code, "bad"));
            assert_eq!(record.kind(), ErrorKind::InternalError);
            assert_eq!(record.code(), ER_MALFORMED_CONDITION);
            assert_eq!(
                record.context().get("faultCode"),
                Some(&fault_code.to_string())
            );
        }
    }

    #[test]
    fn test_classify_json() {
        let record = classify_json(
            r#"{"faultCode": 250001, "message": "Failed to connect", "context": {"sqlState": "08001"}}"#,
        );
        assert_eq!(record.kind(), ErrorKind::Operational);
        assert_eq!(record.sql_state(), Some("08001"));

        let garbage = classify_json("{not json");
        assert_eq!(garbage.code(), ER_MALFORMED_CONDITION);

        let wrong_shape = classify_json(r#"{"faultCode": "1003"}"#);
        assert_eq!(wrong_shape.code(), ER_MALFORMED_CONDITION);
    }
}
