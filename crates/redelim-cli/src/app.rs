//! Whole-run lifecycle
//!
//! Opens the run log in the base directory, drives one batch, then tears down:
//! end-of-run marker, log flush, pause. Teardown runs on every path, including
//! when the log itself cannot be opened.

use crate::driver::{run_batch, EXIT_ABORTED};
use crate::error::{CliError, Result};
use crate::pause::PauseMode;
use redelim_common::logging::{LogConfig, RunLog};
use redelim_common::{LogLevel, LogSink};
use std::path::{Path, PathBuf};

/// Last line of every run log
pub const END_OF_RUN_MARKER: &str = "----- end of run -----";

/// Process-level options, from the command line
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub log: LogConfig,
    pub pause: PauseMode,
}

/// Directory holding the running executable. This is the base directory; the
/// working directory is never consulted.
pub fn executable_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().map_err(|e| CliError::ExecutableLocation(e.to_string()))?;
    // Resolve symlinks so a linked binary works on the directory of the real file
    let exe = exe.canonicalize().unwrap_or(exe);
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| CliError::ExecutableLocation(format!("'{}' has no parent", exe.display())))
}

/// Logging settings from `REDELIM_LOG_*`, with `verbose` forcing debug.
///
/// Invalid values are reported on stderr and the defaults are used instead.
pub fn log_config(verbose: bool) -> LogConfig {
    let mut config = LogConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Warning: ignoring logging environment: {:#}", e);
        LogConfig::default()
    });
    if verbose {
        config.level = LogLevel::Debug;
    }
    config
}

/// Run one batch in `base_dir` and return the process exit code
pub fn run(base_dir: &Path, options: &RunOptions) -> i32 {
    let log = match RunLog::open(base_dir, &options.log) {
        Ok(log) => log,
        Err(err) => {
            eprintln!("Error: could not open the run log in {}: {:#}", base_dir.display(), err);
            options.pause.wait();
            return EXIT_ABORTED;
        },
    };

    log.record(
        LogLevel::Info,
        &format!(
            "redelim {} processing {}",
            env!("CARGO_PKG_VERSION"),
            base_dir.display()
        ),
    );

    let outcome = run_batch(base_dir, &log);
    log.record(LogLevel::Debug, &format!("Run finished: {:?}", outcome));

    log.record(LogLevel::Info, END_OF_RUN_MARKER);
    log.close();

    options.pause.wait();
    outcome.exit_code()
}
