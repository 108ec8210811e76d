//! Error types for redelim

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for redelim operations
pub type Result<T> = std::result::Result<T, RedelimError>;

/// Main error type for redelim
#[derive(Error, Debug)]
pub enum RedelimError {
    #[error("IO error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in '{}': {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("'{}' is not valid UTF-8 text (record {record})", path.display())]
    Encoding { path: PathBuf, record: u64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to archive '{}' to '{}': {source}", from.display(), to.display())]
    Archive {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RedelimError {
    /// Create an IO error bound to a path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Wrap a CSV error, splitting out UTF-8 failures so they report as
    /// decode problems rather than parse problems.
    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        let path = path.into();
        let bad_record = match source.kind() {
            csv::ErrorKind::Utf8 { pos, .. } => Some(pos.as_ref().map_or(0, |p| p.record())),
            _ => None,
        };

        match bad_record {
            Some(record) => Self::Encoding { path, record },
            None => Self::Csv { path, source },
        }
    }

    /// Short label used when the error is logged
    pub fn category(&self) -> &'static str {
        match self {
            Self::Io { .. } => "io",
            Self::Csv { source, .. } if source.is_io_error() => "io",
            Self::Csv { .. } => "csv",
            Self::Encoding { .. } => "encoding",
            Self::Config(_) => "config",
            Self::Archive { .. } => "archive",
        }
    }
}
