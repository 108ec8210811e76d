//! Batch driver
//!
//! One run walks through `Init -> Discover -> Process -> Summarize -> Done`.
//! Per-file failures are logged and the batch moves on; anything else that
//! goes wrong (configuration, discovery, archive setup, a panic) aborts the run
//! with a single error entry carrying a category label and a stack trace.

use crate::config::RunConfig;
use crate::error::CliError;
use redelim_common::{LogLevel, LogSink, RedelimError};
use redelim_core::job::{discover_jobs, Job};
use redelim_core::transcode::TranscodeReport;
use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::fmt;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

/// Exit status of a normal run, whatever the per-file results were
pub const EXIT_OK: i32 = 0;

/// Exit status when the base directory holds no candidate files
pub const EXIT_NO_FILES: i32 = 1;

/// Exit status when an unexpected error aborted the run
pub const EXIT_ABORTED: i32 = 70;

/// Driver states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    Discover,
    Process,
    Summarize,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Init => write!(f, "init"),
            Stage::Discover => write!(f, "discover"),
            Stage::Process => write!(f, "process"),
            Stage::Summarize => write!(f, "summarize"),
            Stage::Done => write!(f, "done"),
        }
    }
}

/// Tally of one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Jobs transcoded and archived
    pub succeeded: usize,
    /// File names of jobs left in place
    pub failed: Vec<String>,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(RunSummary),
    NoFiles,
    Aborted {
        stage: Stage,
        category: &'static str,
    },
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Completed(_) => EXIT_OK,
            RunOutcome::NoFiles => EXIT_NO_FILES,
            RunOutcome::Aborted { .. } => EXIT_ABORTED,
        }
    }
}

/// Run one batch over `base_dir`, reporting into `log`.
///
/// Never fails: unexpected errors and panics are logged and turned into
/// [`RunOutcome::Aborted`].
pub fn run_batch(base_dir: &Path, log: &dyn LogSink) -> RunOutcome {
    let config = match RunConfig::load(base_dir) {
        Ok(config) => config,
        Err(err) => {
            let trace = Backtrace::force_capture();
            return report_error(log, Stage::Init, &err, &trace.to_string());
        },
    };

    let mut driver = BatchDriver::new(&config, log);
    match catch_panics(|| driver.run()) {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(err)) => {
            let trace = Backtrace::force_capture();
            report_error(log, driver.stage(), &err, &trace.to_string())
        },
        Err(caught) => {
            let stage = driver.stage();
            log.record(
                LogLevel::Error,
                &format!(
                    "[panic] Unexpected failure during {}: {}\nStack trace:\n{}",
                    stage, caught.message, caught.trace
                ),
            );
            RunOutcome::Aborted {
                stage,
                category: "panic",
            }
        },
    }
}

fn report_error(log: &dyn LogSink, stage: Stage, err: &CliError, trace: &str) -> RunOutcome {
    let category = err.category();
    log.record(
        LogLevel::Error,
        &format!(
            "[{}] Unexpected error during {}: {}\nStack trace:\n{}",
            category,
            stage,
            error_chain(err),
            trace
        ),
    );
    RunOutcome::Aborted { stage, category }
}

/// Render an error with all of its sources
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        // thiserror's transparent variants repeat their source's message
        if !rendered.ends_with(&cause_text) {
            rendered.push_str(": ");
            rendered.push_str(&cause_text);
        }
        source = cause.source();
    }
    rendered
}

/// Walks the configured base directory through the driver states
pub struct BatchDriver<'a> {
    config: &'a RunConfig,
    log: &'a dyn LogSink,
    stage: Stage,
}

impl<'a> BatchDriver<'a> {
    pub fn new(config: &'a RunConfig, log: &'a dyn LogSink) -> Self {
        Self {
            config,
            log,
            stage: Stage::Init,
        }
    }

    /// Current state, as far as the run got
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Discover, process, and summarize
    pub fn run(&mut self) -> Result<RunOutcome, CliError> {
        self.enter(Stage::Discover);
        let jobs = self.discover()?;
        if jobs.is_empty() {
            self.info(&format!(
                "No {} files found in the directory.",
                self.config.naming.extension().trim_start_matches('.').to_uppercase()
            ));
            self.enter(Stage::Done);
            return Ok(RunOutcome::NoFiles);
        }

        self.enter(Stage::Process);
        self.ensure_archive_dir()?;
        let mut summary = RunSummary::default();
        for job in &jobs {
            match self.process(job) {
                Ok(()) => summary.succeeded += 1,
                Err(_) => summary.failed.push(job.file_name()),
            }
        }

        self.enter(Stage::Summarize);
        self.summarize(&summary);

        self.enter(Stage::Done);
        Ok(RunOutcome::Completed(summary))
    }

    fn discover(&self) -> Result<Vec<Job>, CliError> {
        self.info(&format!(
            "Looking for *{} files in {}",
            self.config.naming.extension(),
            self.config.base_dir.display()
        ));

        let jobs = discover_jobs(
            &self.config.base_dir,
            &self.config.naming,
            &self.config.archive_dir,
        )?;
        self.debug(&format!("Found {} candidate file(s)", jobs.len()));
        Ok(jobs)
    }

    fn ensure_archive_dir(&self) -> Result<(), CliError> {
        let dir = &self.config.archive_dir;
        if !dir.is_dir() {
            fs::create_dir_all(dir).map_err(|e| RedelimError::io(dir, e))?;
            self.info(&format!("Created archive directory: {}", dir.display()));
        }
        Ok(())
    }

    /// Transcode one job and archive its input. Failures are logged here.
    fn process(&self, job: &Job) -> Result<(), RedelimError> {
        let report = match self.config.transcoder.transcode(&job.input, &job.output) {
            Ok(report) => report,
            Err(err) => {
                self.error(&format!("Error processing {}: {}", job.input.display(), err));
                return Err(err);
            },
        };
        self.saved(job, report);

        if let Err(err) = self.archive(job) {
            self.error(&format!("Error archiving {}: {}", job.file_name(), err));
            return Err(err);
        }
        self.info(&format!(
            "Moved original {} to {}",
            job.file_name(),
            job.archive.display()
        ));
        Ok(())
    }

    fn saved(&self, job: &Job, report: TranscodeReport) {
        self.info(&format!("Processed file saved as: {}", job.output.display()));
        self.debug(&format!("{} record(s) written", report.records));
    }

    fn archive(&self, job: &Job) -> Result<(), RedelimError> {
        let to_archive_error = |source| RedelimError::Archive {
            from: job.input.clone(),
            to: job.archive.clone(),
            source,
        };

        if job.archive.is_file() {
            self.log.record(
                LogLevel::Warn,
                &format!("Replacing previously archived {}", job.archive.display()),
            );
            fs::remove_file(&job.archive).map_err(to_archive_error)?;
        }
        fs::rename(&job.input, &job.archive).map_err(to_archive_error)
    }

    fn summarize(&self, summary: &RunSummary) {
        self.info(&format!(
            "Processed {} file(s) successfully.",
            summary.succeeded
        ));
        if !summary.failed.is_empty() {
            self.log.record(
                LogLevel::Warn,
                &format!(
                    "{} file(s) failed and were left in place: {}",
                    summary.failed.len(),
                    summary.failed.join(", ")
                ),
            );
        }
        self.info(&format!(
            "Originals archived in: {}",
            self.config.archive_dir.display()
        ));
    }

    fn enter(&mut self, stage: Stage) {
        self.stage = stage;
        self.debug(&format!("Entering {} stage", stage));
    }

    fn info(&self, message: &str) {
        self.log.record(LogLevel::Info, message);
    }

    fn debug(&self, message: &str) {
        self.log.record(LogLevel::Debug, message);
    }

    fn error(&self, message: &str) {
        self.log.record(LogLevel::Error, message);
    }
}

/// A panic caught while the driver was running
#[derive(Debug)]
pub struct CaughtPanic {
    pub message: String,
    pub trace: String,
}

thread_local! {
    static PANIC_TRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Run `f`, turning a panic into a [`CaughtPanic`] with the backtrace taken
/// at the panic site.
///
/// The panic hook is swapped for the duration of the call so the panic is
/// reported once, through the run log, instead of also on stderr.
pub fn catch_panics<T>(f: impl FnOnce() -> T) -> Result<T, CaughtPanic> {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(|info| {
        let trace = format!("{}\n{}", info, Backtrace::force_capture());
        PANIC_TRACE.with(|slot| *slot.borrow_mut() = Some(trace));
    }));

    let result = panic::catch_unwind(AssertUnwindSafe(f));
    panic::set_hook(previous);

    result.map_err(|payload| CaughtPanic {
        message: panic_message(payload.as_ref()),
        trace: PANIC_TRACE
            .with(|slot| slot.borrow_mut().take())
            .unwrap_or_else(|| Backtrace::force_capture().to_string()),
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Collects records in memory
    #[derive(Default)]
    struct MemorySink {
        lines: Mutex<Vec<(LogLevel, String)>>,
    }

    impl LogSink for MemorySink {
        fn record(&self, level: LogLevel, message: &str) {
            self.lines.lock().unwrap().push((level, message.to_string()));
        }
    }

    impl MemorySink {
        fn contains(&self, needle: &str) -> bool {
            self.lines.lock().unwrap().iter().any(|(_, m)| m.contains(needle))
        }

        fn errors(&self) -> Vec<String> {
            self.lines
                .lock()
                .unwrap()
                .iter()
                .filter(|(l, _)| *l == LogLevel::Error)
                .map(|(_, m)| m.clone())
                .collect()
        }
    }

    fn config_for(dir: &TempDir) -> RunConfig {
        RunConfig::from_settings(dir.path(), &Default::default()).unwrap()
    }

    #[test]
    fn test_processes_and_archives() {
        let dir = TempDir::new().unwrap();
        let base = dir.path();
        fs::write(base.join("a.csv"), "José<Ñandú;X<y>z\n").unwrap();
        fs::write(base.join("b.csv"), "one<two\n").unwrap();

        let config = config_for(&dir);
        let sink = MemorySink::default();
        let outcome = BatchDriver::new(&config, &sink).run().unwrap();

        assert_eq!(
            outcome,
            RunOutcome::Completed(RunSummary {
                succeeded: 2,
                failed: vec![]
            })
        );
        assert_eq!(outcome.exit_code(), EXIT_OK);

        assert_eq!(
            fs::read_to_string(base.join("a_ok.csv")).unwrap(),
            "Jose;NanduX;yz\r\n"
        );
        assert!(!base.join("a.csv").exists());
        assert_eq!(
            fs::read_to_string(base.join("originals").join("a.csv")).unwrap(),
            "José<Ñandú;X<y>z\n"
        );
        assert!(sink.contains("Created archive directory"));
        assert!(sink.contains("Processed 2 file(s) successfully."));
        assert!(sink.contains("Originals archived in:"));
    }

    #[test]
    fn test_record_count_reaches_the_sink() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.csv"), "a<b\nc<d\n").unwrap();

        let config = config_for(&dir);
        let sink = MemorySink::default();
        BatchDriver::new(&config, &sink).run().unwrap();

        let lines = sink.lines.lock().unwrap();
        assert!(lines
            .iter()
            .any(|(level, m)| *level == LogLevel::Debug && m == "2 record(s) written"));
    }

    #[test]
    #[serial]
    fn test_archive_setup_failure_is_reported_during_process() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.csv"), "a<b\n").unwrap();
        // A plain file where the archive directory should go
        fs::write(dir.path().join("originals"), "not a directory").unwrap();

        let sink = MemorySink::default();
        let outcome = run_batch(dir.path(), &sink);

        assert_eq!(
            outcome,
            RunOutcome::Aborted {
                stage: Stage::Process,
                category: "io"
            }
        );
        assert!(sink.errors()[0].starts_with("[io] Unexpected error during process"));
        assert!(dir.path().join("a.csv").exists());
    }

    #[test]
    fn test_processed_outputs_are_not_reprocessed() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a_ok.csv"), "already;done\r\n").unwrap();

        let config = config_for(&dir);
        let sink = MemorySink::default();
        let outcome = BatchDriver::new(&config, &sink).run().unwrap();

        assert_eq!(outcome, RunOutcome::NoFiles);
        assert_eq!(outcome.exit_code(), EXIT_NO_FILES);
        assert!(sink.contains("No CSV files found in the directory."));
        assert!(!dir.path().join("originals").exists());
    }

    #[test]
    fn test_failed_job_is_left_in_place() {
        let dir = TempDir::new().unwrap();
        let base = dir.path();
        fs::write(base.join("bad.csv"), b"\xff\xfe<x\n").unwrap();
        fs::write(base.join("good.csv"), "a<b\n").unwrap();
        // Occupy the output path so the write fails
        fs::write(base.join("stuck.csv"), "a<b\n").unwrap();
        fs::create_dir(base.join("stuck_ok.csv")).unwrap();

        let config = config_for(&dir);
        let sink = MemorySink::default();
        let outcome = BatchDriver::new(&config, &sink).run().unwrap();

        let RunOutcome::Completed(summary) = outcome else {
            panic!("expected a completed run, got {outcome:?}");
        };
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, vec!["bad.csv", "stuck.csv"]);

        assert!(base.join("bad.csv").exists());
        assert!(base.join("stuck.csv").exists());
        assert!(!base.join("bad_ok.csv").exists());
        assert!(!base.join("originals").join("bad.csv").exists());
        assert!(!base.join("originals").join("stuck.csv").exists());
        assert!(base.join("originals").join("good.csv").exists());

        let errors = sink.errors();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("Error processing"));
        assert!(sink.contains("2 file(s) failed"));
    }

    #[test]
    fn test_replaces_previously_archived_original() {
        let dir = TempDir::new().unwrap();
        let base = dir.path();
        fs::create_dir(base.join("originals")).unwrap();
        fs::write(base.join("originals").join("a.csv"), "old").unwrap();
        fs::write(base.join("a.csv"), "new<row\n").unwrap();

        let config = config_for(&dir);
        let sink = MemorySink::default();
        BatchDriver::new(&config, &sink).run().unwrap();

        assert_eq!(
            fs::read_to_string(base.join("originals").join("a.csv")).unwrap(),
            "new<row\n"
        );
        assert!(sink.contains("Replacing previously archived"));
        assert!(!sink.contains("Created archive directory"));
    }

    #[test]
    #[serial]
    fn test_run_batch_reports_config_errors() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("redelim.toml"), "source_delimiter = ';'\n").unwrap();
        fs::write(dir.path().join("a.csv"), "a<b\n").unwrap();

        let sink = MemorySink::default();
        let outcome = run_batch(dir.path(), &sink);

        assert_eq!(
            outcome,
            RunOutcome::Aborted {
                stage: Stage::Init,
                category: "config"
            }
        );
        assert_eq!(outcome.exit_code(), EXIT_ABORTED);
        let errors = sink.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("[config] Unexpected error during init"));
        assert!(errors[0].contains("Stack trace:"));
        assert!(dir.path().join("a.csv").exists());
    }

    #[test]
    #[serial]
    fn test_run_batch_reports_discovery_errors() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone");

        let sink = MemorySink::default();
        let outcome = run_batch(&missing, &sink);

        assert_eq!(
            outcome,
            RunOutcome::Aborted {
                stage: Stage::Discover,
                category: "io"
            }
        );
        assert!(sink.errors()[0].starts_with("[io] Unexpected error during discover"));
    }

    #[test]
    #[serial]
    fn test_catch_panics() {
        let caught = catch_panics(|| -> u32 { panic!("boom") }).unwrap_err();
        assert_eq!(caught.message, "boom");
        assert!(caught.trace.contains("boom"));

        assert_eq!(catch_panics(|| 7).unwrap(), 7);
    }

    #[test]
    fn test_error_chain_skips_repeated_messages() {
        let err: CliError = RedelimError::config("bad").into();
        assert_eq!(error_chain(&err), "Configuration error: bad");
    }
}
