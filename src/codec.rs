//! Format detection and (de)serialisation between bytes and tables.
//!
//! Two formats are recognised, chosen by file extension:
//!
//! | Extension | [`FormatKind`] | Reader | Writer |
//! |-----------|----------------|--------|--------|
//! | `.csv`    | `Csv`          | polars CSV reader | polars CSV writer |
//! | `.xlsx`   | `Xlsx`         | calamine (first worksheet) | `rust_xlsxwriter` |
//!
//! The first row of either format is the header. Encoding never writes a
//! row index.

pub mod csv;
pub mod xlsx;

use crate::config::SweeperConfig;
use crate::config::{CsvSettings, XlsxSettings};
use crate::error::{Result, SweeperError};
use crate::table::extension_of;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Tabular encodings the pipeline can read and write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatKind {
    /// Comma-delimited text with a header row.
    #[serde(rename = "CSV", alias = "csv", alias = "Csv")]
    Csv,
    /// Office Open XML workbook.
    #[serde(rename = "Excel", alias = "excel", alias = "xlsx", alias = "XLSX", alias = "Xlsx")]
    Xlsx,
}

impl FormatKind {
    pub const ALL: [Self; 2] = [Self::Csv, Self::Xlsx];

    /// Extension written for this format, including the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => ".csv",
            Self::Xlsx => ".xlsx",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }

    /// Label shown to users when choosing an export target.
    pub fn label(self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Xlsx => "Excel",
        }
    }

    fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.extension() == ext)
    }
}

impl std::fmt::Display for FormatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv => write!(f, "CSV"),
            Self::Xlsx => write!(f, "XLSX"),
        }
    }
}

impl FromStr for FormatKind {
    type Err = SweeperError;

    /// Accepts `csv`, `excel` and `xlsx` in any case, with or without a dot.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "excel" | "xlsx" => Ok(Self::Xlsx),
            other => Err(SweeperError::Config(format!(
                "Unknown export target '{other}' (expected CSV or Excel)"
            ))),
        }
    }
}

/// Detect the format of `file_name` from its extension (case-insensitive).
///
/// # Errors
///
/// [`SweeperError::UnsupportedFormat`] carrying the lower-cased extension
/// (empty when the name has none).
pub fn detect_format(file_name: &str) -> Result<FormatKind> {
    let ext = extension_of(file_name);
    FormatKind::from_extension(&ext).ok_or(SweeperError::UnsupportedFormat(ext))
}

/// Reads and writes tables in every [`FormatKind`].
#[derive(Debug, Clone, Default)]
pub struct FormatCodec {
    csv: CsvSettings,
    xlsx: XlsxSettings,
}

impl FormatCodec {
    pub fn new(csv: CsvSettings, xlsx: XlsxSettings) -> Self {
        Self { csv, xlsx }
    }

    pub fn from_config(config: &SweeperConfig) -> Self {
        Self::new(config.csv.clone(), config.xlsx.clone())
    }

    /// Parse `bytes` as `kind` into a table.
    ///
    /// Columns without a single value are typed `Float64` whatever the
    /// reader inferred, so they count as numeric downstream.
    ///
    /// # Errors
    ///
    /// [`SweeperError::Decode`] when the payload is malformed.
    pub fn decode(&self, bytes: &[u8], kind: FormatKind) -> Result<DataFrame> {
        let df = match kind {
            FormatKind::Csv => csv::read_csv(bytes, &self.csv)?,
            FormatKind::Xlsx => xlsx::read_xlsx(bytes)?,
        };
        tracing::debug!(
            format = %kind,
            rows = df.height(),
            columns = df.width(),
            "decoded table"
        );
        type_empty_columns(df).map_err(|e| SweeperError::decode(kind, e))
    }

    /// Serialise `df` as `kind`: header row, then data rows.
    ///
    /// The returned buffer starts at its first byte.
    ///
    /// # Errors
    ///
    /// [`SweeperError::Encode`] when the writer fails or the table exceeds
    /// the format's limits.
    pub fn encode(&self, df: &DataFrame, kind: FormatKind) -> Result<Vec<u8>> {
        let bytes = match kind {
            FormatKind::Csv => csv::write_csv(df)?,
            FormatKind::Xlsx => xlsx::write_xlsx(df, &self.xlsx)?,
        };
        tracing::debug!(format = %kind, bytes = bytes.len(), "encoded table");
        Ok(bytes)
    }
}

/// Retype all-null columns as `Float64`.
fn type_empty_columns(mut df: DataFrame) -> PolarsResult<DataFrame> {
    let empty: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|c| !c.is_empty() && c.null_count() == c.len() && !c.dtype().is_float())
        .map(|c| c.name().to_string())
        .collect();

    for name in empty {
        let retyped = df
            .column(&name)?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        df.replace(&name, retyped)?;
    }
    Ok(df)
}
