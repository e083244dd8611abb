//! Pipeline execution engine.
//!
//! Runs each uploaded file through detect → decode → clean → project →
//! (preview) → export. A failure in one file is recorded as that file's
//! outcome and never stops the rest of the batch.

use super::spec::PipelineRequest;
use crate::cleaning::{Cleaned, ImputedColumn, clean};
use crate::codec::{FormatCodec, FormatKind, detect_format};
use crate::config::SweeperConfig;
use crate::error::{Result, SweeperError};
use crate::export::{ExportArtifact, ExportPlanner};
use crate::preview::TablePreview;
use crate::projection::project;
use crate::table::SourceFile;
use serde::Serialize;
use std::time::{Duration, Instant};

/// What happened to a single file.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub format: FormatKind,
    pub rows_before: usize,
    pub columns_before: usize,
    pub duplicates_removed: usize,
    pub rows_after: usize,
    pub columns_after: usize,
    pub imputed: Vec<ImputedColumn>,
    /// Numeric columns with no values, left unimputed
    pub skipped_means: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConvertedFile {
    pub source_name: String,
    pub artifact: ExportArtifact,
    pub summary: RunSummary,
    pub preview: Option<TablePreview>,
}

/// Per-file failure reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileError {
    pub file_name: String,
    pub kind: String,
    pub detail: String,
}

impl FileError {
    pub fn new(file_name: impl Into<String>, err: &SweeperError) -> Self {
        Self {
            file_name: file_name.into(),
            kind: err.kind().to_owned(),
            detail: err.detail(),
        }
    }
}

impl std::fmt::Display for FileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.file_name, self.detail, self.kind)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Converted(Box<ConvertedFile>),
    Failed(FileError),
}

impl FileOutcome {
    pub fn file_name(&self) -> &str {
        match self {
            Self::Converted(c) => &c.source_name,
            Self::Failed(e) => &e.file_name,
        }
    }

    pub fn artifact(&self) -> Option<&ExportArtifact> {
        match self {
            Self::Converted(c) => Some(&c.artifact),
            Self::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&FileError> {
        match self {
            Self::Converted(_) => None,
            Self::Failed(e) => Some(e),
        }
    }
}

/// One file plus the choices made for it.
#[derive(Debug, Clone)]
pub struct FileJob {
    pub source: SourceFile,
    pub request: PipelineRequest,
}

/// Outcomes for a batch, in input order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
    #[serde(skip)]
    pub duration: Duration,
}

impl BatchReport {
    pub fn artifacts(&self) -> impl Iterator<Item = &ExportArtifact> {
        self.outcomes.iter().filter_map(FileOutcome::artifact)
    }

    pub fn errors(&self) -> impl Iterator<Item = &FileError> {
        self.outcomes.iter().filter_map(FileOutcome::error)
    }

    pub fn converted_count(&self) -> usize {
        self.artifacts().count()
    }

    pub fn failed_count(&self) -> usize {
        self.errors().count()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} file(s): {} converted, {} failed in {:.2}s",
            self.outcomes.len(),
            self.converted_count(),
            self.failed_count(),
            self.duration.as_secs_f64()
        )
    }
}

/// Runs files through the conversion pipeline. Holds no per-file state.
#[derive(Debug, Clone)]
pub struct Pipeline {
    codec: FormatCodec,
    planner: ExportPlanner,
    preview_row_limit: usize,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(&SweeperConfig::default())
    }
}

impl Pipeline {
    pub fn new(config: &SweeperConfig) -> Self {
        let codec = FormatCodec::from_config(config);
        Self {
            planner: ExportPlanner::new(codec.clone()),
            codec,
            preview_row_limit: config.preview_row_limit,
        }
    }

    /// Process one file; failures become [`FileOutcome::Failed`].
    pub fn run_file(&self, source: &SourceFile, request: &PipelineRequest) -> FileOutcome {
        tracing::info!(file = source.name(), bytes = source.size(), "processing file");

        match self.convert(source, request) {
            Ok(converted) => {
                tracing::info!(
                    file = source.name(),
                    output = %converted.artifact.file_name,
                    rows = converted.summary.rows_after,
                    columns = converted.summary.columns_after,
                    "file converted"
                );
                FileOutcome::Converted(Box::new(converted))
            }
            Err(e) => {
                tracing::warn!(file = source.name(), kind = e.kind(), "file failed: {e}");
                FileOutcome::Failed(FileError::new(source.name(), &e))
            }
        }
    }

    /// Process jobs in order, each with its own request.
    pub fn run_batch(&self, jobs: impl IntoIterator<Item = FileJob>) -> BatchReport {
        let start = Instant::now();
        let outcomes = jobs
            .into_iter()
            .map(|job| self.run_file(&job.source, &job.request))
            .collect();
        Self::finish(outcomes, start)
    }

    /// Process every file with the same request.
    pub fn run_uniform(&self, files: &[SourceFile], request: &PipelineRequest) -> BatchReport {
        let start = Instant::now();
        let outcomes = files.iter().map(|f| self.run_file(f, request)).collect();
        Self::finish(outcomes, start)
    }

    fn finish(outcomes: Vec<FileOutcome>, start: Instant) -> BatchReport {
        let report = BatchReport {
            outcomes,
            duration: start.elapsed(),
        };
        tracing::info!("{}", report.summary());
        report
    }

    fn convert(&self, source: &SourceFile, request: &PipelineRequest) -> Result<ConvertedFile> {
        let format = detect_format(source.name())?;
        let table = self.codec.decode(source.bytes(), format)?;
        let (rows_before, columns_before) = (table.height(), table.width());

        let Cleaned {
            table,
            duplicates_removed,
            imputation,
        } = clean(&table, &request.cleaning)?;
        let imputation = imputation.unwrap_or_default();

        let table = project(&table, &request.projection)?;

        let preview = request
            .preview
            .then(|| TablePreview::build(source, &table, self.preview_row_limit))
            .transpose()?;

        let artifact = self.planner.export(&table, source, &request.export)?;

        Ok(ConvertedFile {
            source_name: source.name().to_owned(),
            artifact,
            summary: RunSummary {
                format,
                rows_before,
                columns_before,
                duplicates_removed,
                rows_after: table.height(),
                columns_after: table.width(),
                imputed: imputation.filled,
                skipped_means: imputation.skipped,
            },
            preview,
        })
    }
}
