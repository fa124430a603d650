//! Error types for parsing and running assertions.
//!
//! Only conditions that make a run meaningless are errors. A widget that does
//! not resolve or a predicate that evaluates to false is the ordinary "bug not
//! reproduced" outcome and is reported through [`crate::Diagnostic`] instead.

use std::fmt;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Which snapshot stream a request was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    Layout,
    DeviceInfo,
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotKind::Layout => f.write_str("layout"),
            SnapshotKind::DeviceInfo => f.write_str("device info"),
        }
    }
}

/// A clause that could not be parsed.
///
/// `offset` is a byte offset into the full assertion text, so callers can
/// point at the exact character that was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot parse `{clause}` (at byte {offset}): {reason}")]
pub struct ParseError {
    pub clause: String,
    pub offset: usize,
    pub reason: String,
}

impl ParseError {
    pub fn new(clause: impl Into<String>, offset: usize, reason: impl Into<String>) -> Self {
        Self { clause: clause.into(), offset, reason: reason.into() }
    }
}

/// Errors that abort a verification run
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed clause text
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Constructor names a type outside the registered entity kinds
    #[error("unknown entity type `{name}` in `{clause}`")]
    UnknownEntityKind { name: String, clause: String },

    /// Predicate names an operator outside the registry
    #[error("unknown operator `{name}` in `{clause}`")]
    UnknownOperator { name: String, clause: String },

    /// Predicate references a variable that is never defined
    #[error("variable `{name}` used in `{clause}` is never defined")]
    UndeclaredVariable { name: String, clause: String },

    /// The snapshot source holds fewer snapshots than requested
    #[error("not enough {kind} snapshots: {requested} requested, {available} available")]
    InsufficientHistory { kind: SnapshotKind, requested: usize, available: usize },

    /// A bounds string is not of the form `[x1,y1][x2,y2]`
    #[error("malformed bounds `{input}`, expected `[x1,y1][x2,y2]`")]
    AmbiguousGeometry { input: String },

    /// Operand values cannot be combined by the operator
    #[error("`{operator}` cannot compare {detail}")]
    TypeMismatch { operator: String, detail: String },

    /// The snapshot source returned unusable data
    #[error("snapshot error: {0}")]
    Snapshot(String),

    /// A failure the snapshot source may succeed on when asked again
    #[error("transient snapshot failure: {0}")]
    Transient(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a snapshot error
    pub fn snapshot(msg: impl Into<String>) -> Self {
        Self::Snapshot(msg.into())
    }

    /// Create a transient snapshot error
    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    /// Whether retrying the same snapshot request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Transient(_) => true,
            Error::Io(err) => matches!(
                err.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionRefused
            ),
            _ => false,
        }
    }
}
