//! Request model and batch execution for file conversion.
//!
//! A [`PipelineRequest`] captures the user's choices for a file. The
//! [`Pipeline`] applies them in a fixed order:
//!
//! 1. detect the format from the file extension
//! 2. decode into a table
//! 3. remove duplicate rows (optional)
//! 4. fill numeric nulls with column means (optional)
//! 5. select and reorder columns
//! 6. build a preview (optional)
//! 7. encode into the target format
//!
//! # Example
//!
//! ```no_run
//! use sweeper::config::SweeperConfig;
//! use sweeper::pipeline::{Pipeline, PipelineRequest};
//! use sweeper::table::SourceFile;
//! use std::path::Path;
//!
//! let request = PipelineRequest::from_json(r#"{"cleaning": {"remove_duplicates": true}}"#)?;
//! let file = SourceFile::from_path(Path::new("customers.csv"))?;
//!
//! let report = Pipeline::new(&SweeperConfig::default()).run_uniform(&[file], &request);
//! for err in report.errors() {
//!     eprintln!("{err}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod executor;
pub mod spec;

pub use executor::{
    BatchReport, ConvertedFile, FileError, FileJob, FileOutcome, Pipeline, RunSummary,
};
pub use spec::{PipelineRequest, REQUEST_VERSION};
