//! Error types for IntervalJoin
//!
//! Defines all error types used throughout the library.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which input file a line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRole {
    /// The file whose every record is reported
    Primary,
    /// The file searched for overlapping records
    Secondary,
}

impl fmt::Display for InputRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputRole::Primary => write!(f, "primary"),
            InputRole::Secondary => write!(f, "secondary"),
        }
    }
}

/// Main error type for a join run
///
/// Every variant is fatal: the run stops at the first one.
#[derive(Debug, Error)]
pub enum JoinError {
    /// Input file could not be opened or read
    #[error("Unable to open {role} file {path:?}: {source}")]
    FileAccess {
        role: InputRole,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Output file could not be created
    #[error("Unable to create output file {path:?}: {source}")]
    OutputCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line lacks required fields or carries a bad coordinate
    #[error("Malformed {role} record at line {line}: {error}")]
    MalformedRecord {
        role: InputRole,
        line: usize,
        error: RecordError,
    },

    /// Secondary file has no header line
    #[error("Secondary file is empty; a header line is required")]
    MissingHeader,

    /// Worker pool could not be started
    #[error("Failed to create thread pool: {0}")]
    ThreadPool(String),

    /// I/O errors while reading or writing rows
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while extracting an interval from one line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// The line ended before all three required columns were seen
    #[error("expected {expected} required fields, found {found}")]
    IncompleteFields { expected: usize, found: usize },

    /// The chromosome column is not valid UTF-8
    #[error("{field} field is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },

    /// Start or end column is not an integer
    #[error("invalid {field} coordinate '{value}'")]
    InvalidCoordinate { field: &'static str, value: String },
}

/// Errors raised while parsing a `chrom,start,end` column descriptor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColumnSpecError {
    #[error("expected three comma-separated column indices, got {0}")]
    WrongArity(usize),

    #[error("invalid column index '{0}'")]
    InvalidIndex(String),

    #[error("column {0} is used more than once")]
    DuplicateColumn(usize),
}

/// Result type alias for join operations
pub type Result<T> = std::result::Result<T, JoinError>;

/// Result type alias for single-line record parsing
pub type RecordResult<T> = std::result::Result<T, RecordError>;
