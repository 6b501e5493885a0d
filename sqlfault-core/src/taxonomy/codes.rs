//! Fault-code table.
//!
//! Lower layers report failures with a numeric fault code. The table below
//! partitions the code space into fixed, disjoint ranges, one kind per range.
//! Codes are part of the public contract: monitoring and alerting match on
//! them, so a code never moves between ranges once published.

use super::ErrorKind;

/// An inclusive range of fault codes that share a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultRange {
    /// First code in the range
    pub start: u32,
    /// Last code in the range (inclusive)
    pub end: u32,
    /// Kind assigned to every code in the range
    pub kind: ErrorKind,
    /// Human-readable description of the range
    pub description: &'static str,
}

impl FaultRange {
    const fn new(start: u32, end: u32, kind: ErrorKind, description: &'static str) -> Self {
        Self {
            start,
            end,
            kind,
            description,
        }
    }

    /// Returns true if `code` falls inside this range.
    pub const fn contains(&self, code: u32) -> bool {
        code >= self.start && code <= self.end
    }
}

/// The fault-code table, sorted by `start` and non-overlapping.
pub const FAULT_RANGES: &[FaultRange] = &[
    FaultRange::new(
        1_000,
        2_999,
        ErrorKind::Programming,
        "SQL compilation and semantic errors",
    ),
    FaultRange::new(3_000, 3_999, ErrorKind::Integrity, "Constraint violations"),
    FaultRange::new(
        4_000,
        4_999,
        ErrorKind::NotSupported,
        "Features not supported by the server",
    ),
    FaultRange::new(
        100_000,
        199_999,
        ErrorKind::Database,
        "Server-side execution failures",
    ),
    FaultRange::new(
        250_000,
        250_999,
        ErrorKind::Operational,
        "Connectivity, timeouts and closed sessions",
    ),
    FaultRange::new(
        251_000,
        251_999,
        ErrorKind::Interface,
        "Misuse of the client API",
    ),
    FaultRange::new(
        252_000,
        252_999,
        ErrorKind::NotSupported,
        "Features not supported by the client",
    ),
    FaultRange::new(
        253_000,
        253_999,
        ErrorKind::InternalError,
        "Client library defects",
    ),
];

/// SQL compilation error: syntax error
pub const ER_SQL_SYNTAX: u32 = 1_003;
/// SQL compilation error: object does not exist or is not authorized
pub const ER_OBJECT_NOT_FOUND: u32 = 2_003;
/// NULL value in a NOT NULL column
pub const ER_NOT_NULL_VIOLATION: u32 = 3_001;
/// Duplicate key for a unique constraint
pub const ER_UNIQUE_VIOLATION: u32 = 3_002;
/// Numeric value out of range during execution
pub const ER_NUMERIC_OUT_OF_RANGE: u32 = 100_038;
/// Failed to connect to the database
pub const ER_FAILED_TO_CONNECT: u32 = 250_001;
/// Connection was closed
pub const ER_CONNECTION_CLOSED: u32 = 250_002;
/// Request timed out
pub const ER_REQUEST_TIMEOUT: u32 = 250_003;
/// Operation attempted on a closed cursor
pub const ER_CURSOR_CLOSED: u32 = 251_005;
/// Fault condition was missing required fields or carried an invalid code
pub const ER_MALFORMED_CONDITION: u32 = 253_001;

/// Finds the range containing `code`.
pub fn lookup_range(code: u32) -> Option<&'static FaultRange> {
    let index = FAULT_RANGES.partition_point(|range| range.end < code);
    FAULT_RANGES.get(index).filter(|range| range.contains(code))
}

/// Maps a fault code to its kind, falling back to [`ErrorKind::InternalError`]
/// for codes outside every range.
pub fn kind_for_code(code: u32) -> ErrorKind {
    lookup_range(code).map_or(ErrorKind::InternalError, |range| range.kind)
}
