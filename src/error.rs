//! Error types for compilation database operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for cdbx library operations.
pub type Result<T> = std::result::Result<T, CdbError>;

/// Errors that can occur while loading, transforming or executing a CDB.
#[derive(Debug, Error)]
pub enum CdbError {
    /// Malformed JSON document or entry.
    #[error("format error in {origin}: {message}")]
    Format { origin: String, message: String },

    /// A regular expression failed to compile.
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Merging found no source that could be loaded.
    #[error("no valid compilation database among {attempted} source(s)")]
    NoValidSources { attempted: usize },

    /// One or more commands exited non-zero or failed to spawn.
    #[error("{failed} of {total} command(s) failed")]
    ExecutionFailure { failed: usize, total: usize },

    /// Refusing to write a database without entries to a file.
    #[error("the output compilation database has no commands: {}", path.display())]
    EmptyOutput { path: PathBuf },

    /// Worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// IO error.
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CdbError {
    pub(crate) fn format(origin: impl Into<String>, message: impl Into<String>) -> Self {
        CdbError::Format {
            origin: origin.into(),
            message: message.into(),
        }
    }

    pub(crate) fn pattern(pattern: &str, err: regex::Error) -> Self {
        CdbError::InvalidPattern {
            pattern: pattern.to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CdbError::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the error means an input file does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CdbError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}
