//! Coarse error categories used for programmatic handling.

use serde::{Deserialize, Serialize};

/// Closed set of error kinds.
///
/// The names follow the DB-API exception hierarchy that database drivers
/// commonly expose. Behavior that differs per kind must match exhaustively
/// on this enum so that adding a kind is a compile error everywhere it matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Bad SQL or incorrect use of SQL features
    Programming,
    /// Environment or connectivity failure
    Operational,
    /// Server-side failure during execution
    Database,
    /// Constraint violation
    Integrity,
    /// Unexpected failure or library defect
    InternalError,
    /// Feature not implemented by the server or client
    NotSupported,
    /// Misuse of the client API surface
    Interface,
}

impl ErrorKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Programming,
        Self::Operational,
        Self::Database,
        Self::Integrity,
        Self::InternalError,
        Self::NotSupported,
        Self::Interface,
    ];

    /// Stable wire name of the kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Programming => "Programming",
            Self::Operational => "Operational",
            Self::Database => "Database",
            Self::Integrity => "Integrity",
            Self::InternalError => "InternalError",
            Self::NotSupported => "NotSupported",
            Self::Interface => "Interface",
        }
    }

    /// Whether the kind sits under `DatabaseError` in the DB-API hierarchy.
    ///
    /// Only interface misuse is raised outside of it.
    pub const fn is_database_error(self) -> bool {
        match self {
            Self::Programming
            | Self::Operational
            | Self::Database
            | Self::Integrity
            | Self::InternalError
            | Self::NotSupported => true,
            Self::Interface => false,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}
