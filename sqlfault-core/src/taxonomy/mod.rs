//! Error taxonomy: a closed set of error kinds with stable numeric codes.
//!
//! Lower layers describe a failure with a [`RawCondition`]. [`classify`]
//! turns it into an immutable [`ErrorRecord`] whose `code` and `kind` callers
//! can match on without ever touching telemetry.
//!
//! # Module Structure
//! - `kind`: the [`ErrorKind`] enum
//! - `codes`: the fault-code range table and well-known codes
//! - `record`: the [`ErrorRecord`] value and its bounded cause chain
//! - `classify`: [`classify`] and [`classify_json`]

mod classify;
pub mod codes;
mod kind;
mod record;

pub use classify::{CONTEXT_QUERY_ID, CONTEXT_SQL_STATE, RawCondition, classify, classify_json};
pub use codes::{FAULT_RANGES, FaultRange, kind_for_code, lookup_range};
pub use kind::ErrorKind;
pub use record::{ErrorRecord, MAX_CAUSE_DEPTH};
