//! redelim Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling and logging for the redelim workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`RedelimError`] and its [`Result`] alias, with a
//!   short category label for every variant
//! - **Logging**: the [`logging::LogSink`] collaborator and the dual
//!   console/file [`logging::RunLog`]
//!
//! # Example
//!
//! ```no_run
//! use redelim_common::{RedelimError, Result};
//!
//! fn read(path: &std::path::Path) -> Result<String> {
//!     std::fs::read_to_string(path).map_err(|e| RedelimError::io(path, e))
//! }
//! ```

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{RedelimError, Result};
pub use logging::{LogLevel, LogSink};
