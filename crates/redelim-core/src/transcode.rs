//! Re-delimiting of one source file into a cleaned destination file
//!
//! Records are read with the source delimiter (no header, no quoting), cleaned
//! with a [`RowCleaner`], and written with the destination delimiter using
//! standard CSV quoting. Blank lines carry no record and are not written.
//!
//! Output goes to a temporary file next to the destination and is renamed into
//! place only after the last record is flushed. If anything fails the temporary
//! file is removed, so a failed transcode never leaves a destination behind.

use crate::row::RowCleaner;
use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use redelim_common::{RedelimError, Result};
use std::fs::File;
use std::path::Path;

/// Outcome of a successful transcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscodeReport {
    /// Number of records written to the destination
    pub records: u64,
}

/// Converts `source_delimiter`-separated files into cleaned
/// `destination_delimiter`-separated files.
#[derive(Debug, Clone)]
pub struct Transcoder {
    source_delimiter: u8,
    destination_delimiter: u8,
    cleaner: RowCleaner,
}

impl Transcoder {
    /// Create a transcoder. Both delimiters must be single ASCII characters
    /// and must differ.
    pub fn new(source_delimiter: char, destination_delimiter: char) -> Result<Self> {
        let source = ascii_delimiter("source", source_delimiter)?;
        let destination = ascii_delimiter("destination", destination_delimiter)?;
        if source == destination {
            return Err(RedelimError::config(format!(
                "source and destination delimiters are both '{}'",
                source_delimiter
            )));
        }

        Ok(Self {
            source_delimiter: source,
            destination_delimiter: destination,
            cleaner: RowCleaner::new(destination_delimiter),
        })
    }

    /// Transcode `source` into `destination`, replacing any existing file there.
    ///
    /// Fails if the source cannot be opened, is not valid UTF-8, or the
    /// destination cannot be written. On failure no destination file is
    /// created and an existing one is left untouched.
    pub fn transcode(&self, source: &Path, destination: &Path) -> Result<TranscodeReport> {
        let input = File::open(source).map_err(|e| RedelimError::io(source, e))?;
        let mut reader = ReaderBuilder::new()
            .delimiter(self.source_delimiter)
            .has_headers(false)
            .quoting(false)
            .flexible(true)
            .from_reader(input);

        let dir = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut builder = tempfile::Builder::new();
        builder.prefix(".redelim-").suffix(".tmp");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(std::fs::Permissions::from_mode(0o644));
        }
        let staging = builder
            .tempfile_in(dir)
            .map_err(|e| RedelimError::io(destination, e))?;

        let mut writer = WriterBuilder::new()
            .delimiter(self.destination_delimiter)
            .flexible(true)
            .terminator(Terminator::CRLF)
            .from_writer(staging);

        let mut record = StringRecord::new();
        let mut records = 0u64;
        while reader
            .read_record(&mut record)
            .map_err(|e| RedelimError::csv(source, e))?
        {
            let cleaned = self.cleaner.clean_record(record.iter());
            writer
                .write_record(&cleaned)
                .map_err(|e| RedelimError::csv(destination, e))?;
            records += 1;
        }

        let staging = writer
            .into_inner()
            .map_err(|e| RedelimError::io(destination, e.into_error()))?;
        staging
            .persist(destination)
            .map_err(|e| RedelimError::io(destination, e.error))?;

        Ok(TranscodeReport { records })
    }
}

impl Default for Transcoder {
    fn default() -> Self {
        Self {
            source_delimiter: b'<',
            destination_delimiter: b';',
            cleaner: RowCleaner::new(';'),
        }
    }
}

fn ascii_delimiter(role: &str, delimiter: char) -> Result<u8> {
    if delimiter.is_ascii() && !matches!(delimiter, '\r' | '\n' | '"') {
        Ok(delimiter as u8)
    } else {
        Err(RedelimError::config(format!(
            "{} delimiter {:?} must be a single ASCII character other than a quote or line break",
            role, delimiter
        )))
    }
}
