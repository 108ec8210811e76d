//! Logging Configuration and the Run Log
//!
//! Every run of redelim reports through a single [`LogSink`]: each message is
//! printed on the console and appended to a log file next to the executable.
//! The file is truncated when the run starts and flushed when the sink is
//! closed.
//!
//! [`RunLog`] is the production sink. It owns a private tracing [`Dispatch`]
//! with two fmt layers (console and file) instead of installing a global
//! subscriber, so the sink can be passed around explicitly and several runs can
//! coexist in one process (tests do this).
//!
//! # Example
//!
//! ```no_run
//! use redelim_common::logging::{LogConfig, LogLevel, LogSink, RunLog};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     let log = RunLog::open(std::path::Path::new("."), &config)?;
//!
//!     log.record(LogLevel::Info, "Run started");
//!     log.close();
//!     Ok(())
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::Dispatch;
use tracing_appender::non_blocking::{NonBlockingBuilder, WorkerGuard};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

/// Name of the log file created in the base directory
pub const DEFAULT_LOG_FILE_NAME: &str = "redelim.log";

/// Log level for filtering messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Very detailed trace-level logging
    Trace,
    /// Debug-level logging for development
    Debug,
    /// Informational messages
    #[default]
    Info,
    /// Warning messages
    Warn,
    /// Error messages
    Error,
}

impl std::str::FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(anyhow::anyhow!("Invalid log level: {}", s)),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Log format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for structured logging
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(anyhow::anyhow!("Invalid log format: {}", s)),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Minimum log level to record
    pub level: LogLevel,

    /// Log format (text or JSON), applied to both console and file
    pub format: LogFormat,

    /// File name of the run log, created inside the directory given to [`RunLog::open`]
    pub log_file_name: String,

    /// Whether messages are echoed to stdout as well as written to the file
    pub echo_console: bool,

    /// Whether to include target module names in logs
    pub include_targets: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Text,
            log_file_name: DEFAULT_LOG_FILE_NAME.to_string(),
            echo_console: true,
            include_targets: false,
        }
    }
}

impl LogConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `REDELIM_LOG_LEVEL`: Log level (trace, debug, info, warn, error)
    /// - `REDELIM_LOG_FORMAT`: Log format (text, json)
    /// - `REDELIM_LOG_TARGETS`: Include module targets (true/false)
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(level) = std::env::var("REDELIM_LOG_LEVEL") {
            config.level = level.parse()?;
        }

        if let Ok(format) = std::env::var("REDELIM_LOG_FORMAT") {
            config.format = format.parse()?;
        }

        if let Ok(val) = std::env::var("REDELIM_LOG_TARGETS") {
            config.include_targets = val.parse().unwrap_or(false);
        }

        Ok(config)
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> LogConfigBuilder {
        LogConfigBuilder::default()
    }
}

/// Builder for LogConfig
#[derive(Default)]
pub struct LogConfigBuilder {
    config: LogConfig,
}

impl LogConfigBuilder {
    pub fn level(mut self, level: LogLevel) -> Self {
        self.config.level = level;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn log_file_name(mut self, name: impl Into<String>) -> Self {
        self.config.log_file_name = name.into();
        self
    }

    pub fn echo_console(mut self, echo: bool) -> Self {
        self.config.echo_console = echo;
        self
    }

    pub fn include_targets(mut self, include: bool) -> Self {
        self.config.include_targets = include;
        self
    }

    pub fn build(self) -> LogConfig {
        self.config
    }
}

/// Receives the messages a run reports.
///
/// Components that need to report take a `&dyn LogSink` instead of printing.
pub trait LogSink {
    /// Record one message at the given level
    fn record(&self, level: LogLevel, message: &str);
}

/// Console + file sink for one run.
///
/// Dropping the sink (or calling [`RunLog::close`]) flushes the file.
pub struct RunLog {
    dispatch: Dispatch,
    guard: WorkerGuard,
    path: PathBuf,
}

impl RunLog {
    /// Create (or truncate) the log file in `dir` and start recording into it
    pub fn open(dir: &Path, config: &LogConfig) -> Result<Self> {
        let path = dir.join(&config.log_file_name);
        let file = File::create(&path)
            .with_context(|| format!("Failed to create log file {}", path.display()))?;

        // Block instead of dropping lines when the channel is full
        let (non_blocking, guard) = NonBlockingBuilder::default().lossy(false).finish(file);

        let filter = EnvFilter::try_new(config.level.to_string())
            .context("Failed to build log level filter")?;

        let dispatch = match config.format {
            LogFormat::Text => {
                // Console layer (text format), skipped when echo is off
                let console_layer = config.echo_console.then(|| {
                    fmt::layer()
                        .with_writer(std::io::stdout)
                        .with_target(config.include_targets)
                });

                // File layer (text format, no ANSI colors)
                let file_layer = fmt::layer()
                    .with_writer(non_blocking)
                    .with_target(config.include_targets)
                    .with_ansi(false);

                Dispatch::new(
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(console_layer)
                        .with(file_layer),
                )
            },
            LogFormat::Json => {
                let console_layer = config.echo_console.then(|| {
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stdout)
                        .with_target(config.include_targets)
                });

                let file_layer = fmt::layer()
                    .json()
                    .with_writer(non_blocking)
                    .with_target(config.include_targets)
                    .with_ansi(false);

                Dispatch::new(
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(console_layer)
                        .with(file_layer),
                )
            },
        };

        Ok(Self {
            dispatch,
            guard,
            path,
        })
    }

    /// Location of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stop recording and flush everything to disk
    pub fn close(self) {
        let RunLog { dispatch, guard, .. } = self;
        drop(dispatch);
        drop(guard);
    }
}

impl LogSink for RunLog {
    fn record(&self, level: LogLevel, message: &str) {
        tracing::dispatcher::with_default(&self.dispatch, || match level {
            LogLevel::Trace => tracing::trace!(target: "redelim", "{message}"),
            LogLevel::Debug => tracing::debug!(target: "redelim", "{message}"),
            LogLevel::Info => tracing::info!(target: "redelim", "{message}"),
            LogLevel::Warn => tracing::warn!(target: "redelim", "{message}"),
            LogLevel::Error => tracing::error!(target: "redelim", "{message}"),
        });
    }
}
