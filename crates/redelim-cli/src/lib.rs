//! redelim CLI Library
//!
//! Batch conversion of `<`-delimited CSV exports into cleaned `;`-delimited
//! files.
//!
//! # Overview
//!
//! redelim works on the directory holding its own executable:
//!
//! - **Discovery**: every `*.csv` file there that is not already an output
//! - **Conversion**: `name.csv` is rewritten as `name_ok.csv` with the new
//!   delimiter and diacritics removed
//! - **Archiving**: converted originals move to `originals/`
//! - **Logging**: everything printed also lands in `redelim.log`
//!
//! Settings can be overridden with `redelim.toml` next to the executable and
//! `REDELIM_*` environment variables.

pub mod app;
pub mod config;
pub mod driver;
pub mod error;
pub mod pause;

// Re-export commonly used types
pub use driver::{run_batch, RunOutcome, RunSummary};
pub use error::{CliError, Result};

use clap::Parser;

/// redelim - convert `<`-delimited CSV exports next to the executable
#[derive(Parser, Debug)]
#[command(name = "redelim")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Exit as soon as the run is over
    #[arg(long, env = "REDELIM_NO_PAUSE")]
    pub no_pause: bool,

    /// Seconds to wait before exiting when no terminal is attached
    #[arg(long, env = "REDELIM_PAUSE_SECS", default_value_t = pause::DEFAULT_PAUSE_SECS)]
    pub pause_secs: u64,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
