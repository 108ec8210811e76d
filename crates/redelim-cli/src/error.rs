//! Error types for the redelim CLI
//!
//! These are the errors that abort a whole run. Per-file failures are
//! [`RedelimError`]s that the driver logs and moves past.

use redelim_common::RedelimError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Run-level error type
#[derive(Error, Debug)]
pub enum CliError {
    /// The directory of the running executable could not be determined
    #[error("Could not locate the redelim executable: {0}. Run redelim from a regular file path.")]
    ExecutableLocation(String),

    /// redelim.toml could not be parsed
    #[error("Invalid configuration file '{}': {source}. Fix or remove the file to use the defaults.", path.display())]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check redelim.toml and the REDELIM_* environment variables.")]
    Config(String),

    /// Discovery or archive setup failed
    #[error(transparent)]
    Core(#[from] RedelimError),

    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions and disk space.")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Short label used when the error is logged
    pub fn category(&self) -> &'static str {
        match self {
            Self::ExecutableLocation(_) => "environment",
            Self::ConfigFile { .. } | Self::Config(_) => "config",
            Self::Core(e) => e.category(),
            Self::Io(_) => "io",
        }
    }
}
