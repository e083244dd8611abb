//! # Sweeper - tabular file cleaning and conversion
//!
//! Sweeper takes uploaded CSV and XLSX files, optionally removes duplicate
//! rows and fills missing numeric values with column means, keeps the columns
//! the user picked and writes the result back out as CSV or XLSX.
//!
//! ## Quick Start
//!
//! ```no_run
//! use sweeper::cleaning::CleaningRequest;
//! use sweeper::codec::FormatKind;
//! use sweeper::export::ExportRequest;
//! use sweeper::pipeline::{Pipeline, PipelineRequest};
//! use sweeper::table::SourceFile;
//!
//! let request = PipelineRequest {
//!     cleaning: CleaningRequest {
//!         remove_duplicates: true,
//!         impute_numeric_means: true,
//!     },
//!     export: ExportRequest { target: FormatKind::Xlsx },
//!     ..Default::default()
//! };
//!
//! let file = SourceFile::new("sales.csv", b"id,amount\n1,10\n1,10\n2,\n".to_vec());
//! let report = Pipeline::default().run_uniform(&[file], &request);
//! for artifact in report.artifacts() {
//!     println!("{} ({} bytes)", artifact.file_name, artifact.len());
//! }
//! ```
//!
//! ## Core Modules
//!
//! - [`table`]: column kinds and uploaded files
//! - [`codec`]: CSV and XLSX decoding/encoding
//! - [`cleaning`]: duplicate removal and mean imputation
//! - [`projection`]: column selection
//! - [`export`]: output naming and artifacts
//! - [`preview`]: table summaries for display
//! - [`pipeline`]: request model and batch orchestration
//! - [`config`], [`logging`], [`error`]: ambient plumbing
//!
//! Tables are polars [`DataFrame`](polars::prelude::DataFrame)s. Cleaning
//! steps run through the lazy API and always return a new frame.

#![warn(clippy::all, rust_2018_idioms)]

pub mod cleaning;
pub mod codec;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod pipeline;
pub mod preview;
pub mod projection;
pub mod table;
