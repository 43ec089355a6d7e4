//! Error types for clause mate extraction.
//!
//! Only file-level failures are errors. Schema problems, malformed rows and
//! annotation conflicts are recovered locally and reported as
//! [`Diagnostic`](crate::Diagnostic)s instead.

use thiserror::Error;

/// Errors that exclude a whole file from processing.
#[derive(Debug, Error)]
pub enum ClauseMateError {
    /// The input file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The file contained no usable token lines.
    #[error("{path}: no token lines found")]
    EmptyDocument { path: String },

    /// A configuration file could not be loaded.
    #[error("invalid configuration {path}: {message}")]
    Config { path: String, message: String },
}

/// Result type for clause mate operations.
pub type ClauseMateResult<T> = Result<T, ClauseMateError>;
