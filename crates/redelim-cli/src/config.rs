//! Configuration management for redelim
//!
//! Settings are layered: built-in defaults, then `redelim.toml` in the base
//! directory (optional), then `REDELIM_*` environment variables.

use crate::error::{CliError, Result};
use redelim_core::job::{JobNaming, DEFAULT_EXTENSION, DEFAULT_MARKER_SUFFIX};
use redelim_core::transcode::Transcoder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ============================================================================
// Configuration Constants
// ============================================================================

/// Optional settings file looked up in the base directory
pub const CONFIG_FILE_NAME: &str = "redelim.toml";

/// Delimiter of the upstream export
pub const DEFAULT_SOURCE_DELIMITER: char = '<';

/// Delimiter of the files redelim writes
pub const DEFAULT_DESTINATION_DELIMITER: char = ';';

/// Subdirectory of the base directory receiving processed originals
pub const DEFAULT_ARCHIVE_DIR: &str = "originals";

/// User-facing settings, as found in `redelim.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub source_delimiter: char,
    pub destination_delimiter: char,
    pub extension: String,
    pub marker_suffix: String,
    pub archive_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_delimiter: DEFAULT_SOURCE_DELIMITER,
            destination_delimiter: DEFAULT_DESTINATION_DELIMITER,
            extension: DEFAULT_EXTENSION.to_string(),
            marker_suffix: DEFAULT_MARKER_SUFFIX.to_string(),
            archive_dir: DEFAULT_ARCHIVE_DIR.to_string(),
        }
    }
}

impl Settings {
    /// Load settings for `base_dir`: defaults, then the settings file, then
    /// the environment
    pub fn load(base_dir: &Path) -> Result<Self> {
        let mut settings = Self::from_file(&base_dir.join(CONFIG_FILE_NAME))?.unwrap_or_default();
        settings.apply_env()?;
        Ok(settings)
    }

    /// Read a settings file, `None` if it does not exist
    pub fn from_file(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)?;
        let settings = toml::from_str(&content).map_err(|source| CliError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Some(settings))
    }

    /// Override settings from environment variables
    ///
    /// Environment variables:
    /// - `REDELIM_SOURCE_DELIMITER`
    /// - `REDELIM_DESTINATION_DELIMITER`
    /// - `REDELIM_EXTENSION`
    /// - `REDELIM_MARKER_SUFFIX`
    /// - `REDELIM_ARCHIVE_DIR`
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var("REDELIM_SOURCE_DELIMITER") {
            self.source_delimiter = parse_delimiter("REDELIM_SOURCE_DELIMITER", &value)?;
        }

        if let Ok(value) = std::env::var("REDELIM_DESTINATION_DELIMITER") {
            self.destination_delimiter = parse_delimiter("REDELIM_DESTINATION_DELIMITER", &value)?;
        }

        if let Ok(value) = std::env::var("REDELIM_EXTENSION") {
            self.extension = value;
        }

        if let Ok(value) = std::env::var("REDELIM_MARKER_SUFFIX") {
            self.marker_suffix = value;
        }

        if let Ok(value) = std::env::var("REDELIM_ARCHIVE_DIR") {
            self.archive_dir = value;
        }

        Ok(())
    }
}

fn parse_delimiter(var: &str, value: &str) -> Result<char> {
    value
        .parse::<char>()
        .map_err(|_| CliError::config(format!("{} must be exactly one character, got '{}'", var, value)))
}

/// Validated configuration for one run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory scanned for input files
    pub base_dir: PathBuf,

    /// Absolute archive location under `base_dir`
    pub archive_dir: PathBuf,

    /// Candidate and output naming
    pub naming: JobNaming,

    /// Per-file converter
    pub transcoder: Transcoder,
}

impl RunConfig {
    /// Load and validate the configuration for `base_dir`
    pub fn load(base_dir: &Path) -> Result<Self> {
        let settings = Settings::load(base_dir)?;
        Self::from_settings(base_dir, &settings)
    }

    /// Validate `settings` and bind them to `base_dir`
    pub fn from_settings(base_dir: &Path, settings: &Settings) -> Result<Self> {
        let archive_name = settings.archive_dir.as_str();
        if archive_name.is_empty()
            || archive_name == "."
            || archive_name == ".."
            || archive_name.contains(['/', '\\'])
        {
            return Err(CliError::config(format!(
                "archive_dir '{}' must be a plain directory name",
                archive_name
            )));
        }

        let naming = JobNaming::new(settings.extension.clone(), settings.marker_suffix.clone())?;
        let transcoder =
            Transcoder::new(settings.source_delimiter, settings.destination_delimiter)?;

        Ok(Self {
            base_dir: base_dir.to_path_buf(),
            archive_dir: base_dir.join(archive_name),
            naming,
            transcoder,
        })
    }
}
