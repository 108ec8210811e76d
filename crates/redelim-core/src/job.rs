//! Job discovery and path derivation
//!
//! A job is one candidate input file in the base directory together with the
//! output it will be transcoded to and the archive location it moves to once
//! that output is written.

use redelim_common::{RedelimError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Default input extension
pub const DEFAULT_EXTENSION: &str = ".csv";

/// Default suffix marking a file as already processed
pub const DEFAULT_MARKER_SUFFIX: &str = "_ok";

/// Naming rules shared by discovery and output derivation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobNaming {
    extension: String,
    marker_suffix: String,
}

impl JobNaming {
    /// Create naming rules. `extension` must start with a dot and the marker
    /// suffix must be non-empty, otherwise an output could collide with its
    /// input.
    pub fn new(extension: impl Into<String>, marker_suffix: impl Into<String>) -> Result<Self> {
        let extension = extension.into();
        let marker_suffix = marker_suffix.into();

        if extension.len() < 2 || !extension.starts_with('.') {
            return Err(RedelimError::config(format!(
                "extension '{}' must start with '.' and name a file type",
                extension
            )));
        }
        if marker_suffix.is_empty() {
            return Err(RedelimError::config("marker suffix must not be empty"));
        }
        if has_separator(&extension) || has_separator(&marker_suffix) {
            return Err(RedelimError::config(
                "extension and marker suffix must not contain path separators",
            ));
        }

        Ok(Self {
            extension,
            marker_suffix,
        })
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Whether a file with this name should be processed. Hidden files are
    /// never candidates.
    pub fn is_candidate(&self, file_name: &str) -> bool {
        !file_name.starts_with('.')
            && file_name.ends_with(&self.extension)
            && !file_name.ends_with(&self.processed_ending())
    }

    /// Name of the output file for a candidate input name
    pub fn output_name(&self, file_name: &str) -> String {
        let stem = file_name.strip_suffix(&self.extension).unwrap_or(file_name);
        format!("{}{}{}", stem, self.marker_suffix, self.extension)
    }

    fn processed_ending(&self) -> String {
        format!("{}{}", self.marker_suffix, self.extension)
    }
}

impl Default for JobNaming {
    fn default() -> Self {
        Self {
            extension: DEFAULT_EXTENSION.to_string(),
            marker_suffix: DEFAULT_MARKER_SUFFIX.to_string(),
        }
    }
}

fn has_separator(s: &str) -> bool {
    s.contains(['/', '\\'])
}

/// One file to process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// The discovered input file
    pub input: PathBuf,
    /// Transcoded output, next to the input
    pub output: PathBuf,
    /// Where the input is moved after a successful transcode
    pub archive: PathBuf,
}

impl Job {
    /// Derive output and archive paths for `input`
    pub fn new(input: impl Into<PathBuf>, naming: &JobNaming, archive_dir: &Path) -> Result<Self> {
        let input = input.into();
        let file_name = input
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                RedelimError::config(format!("'{}' has no usable file name", input.display()))
            })?
            .to_string();

        let output = input.with_file_name(naming.output_name(&file_name));
        let archive = archive_dir.join(&file_name);

        Ok(Self {
            input,
            output,
            archive,
        })
    }

    /// File name of the input, for log messages
    pub fn file_name(&self) -> String {
        self.input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// List the jobs in `base_dir`.
///
/// Only regular, non-hidden files directly inside `base_dir` are considered
/// (no recursion). Jobs are sorted by file name.
pub fn discover_jobs(base_dir: &Path, naming: &JobNaming, archive_dir: &Path) -> Result<Vec<Job>> {
    let mut jobs = Vec::new();

    for entry in WalkDir::new(base_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(base_dir).to_path_buf();
            RedelimError::io(path, e.into())
        })?;

        // Follows symlinks, like a shell glob would
        if !entry.path().is_file() {
            continue;
        }

        // Names that are not valid UTF-8 cannot match the extension anyway
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };

        if naming.is_candidate(name) {
            jobs.push(Job::new(entry.path(), naming, archive_dir)?);
        }
    }

    Ok(jobs)
}
