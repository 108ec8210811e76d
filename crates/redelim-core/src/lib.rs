//! redelim Core Library
//!
//! The per-file half of redelim: everything needed to turn one
//! `<`-delimited export into a cleaned `;`-delimited file.
//!
//! # Components
//!
//! - **text**: diacritic removal by canonical decomposition
//! - **row**: forbidden-character stripping for record fields
//! - **transcode**: source file to destination file, failure-atomic
//! - **job**: candidate discovery and output/archive path derivation
//!
//! # Example
//!
//! ```no_run
//! use redelim_core::job::{discover_jobs, JobNaming};
//! use redelim_core::transcode::Transcoder;
//! use std::path::Path;
//!
//! fn main() -> redelim_common::Result<()> {
//!     let base = Path::new("./exports");
//!     let transcoder = Transcoder::new('<', ';')?;
//!     for job in discover_jobs(base, &JobNaming::default(), &base.join("originals"))? {
//!         transcoder.transcode(&job.input, &job.output)?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod job;
pub mod row;
pub mod text;
pub mod transcode;

pub use job::{discover_jobs, Job, JobNaming};
pub use row::RowCleaner;
pub use transcode::{TranscodeReport, Transcoder};
