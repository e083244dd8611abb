//! Table previews for the presentation layer.
//!
//! A preview bundles what a UI shows before conversion: file details, the
//! first rows of the (cleaned, projected) table and the numeric columns a
//! bar chart would plot.

use crate::error::Result;
use crate::table::{ColumnKind, SourceFile, column_kinds, numeric_columns};
use polars::prelude::DataFrame;
use serde::Serialize;

/// Numeric columns offered for charting.
pub const CHART_COLUMN_LIMIT: usize = 2;

#[derive(Debug, Clone, Serialize)]
pub struct TablePreview {
    pub file_name: String,
    /// Upload size in KiB.
    pub size_kb: f64,
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<(String, ColumnKind)>,
    #[serde(skip)]
    pub head: DataFrame,
    pub chart_columns: Vec<String>,
}

impl TablePreview {
    pub fn build(source: &SourceFile, df: &DataFrame, row_limit: usize) -> Result<Self> {
        let chart_columns = numeric_columns(df)
            .into_iter()
            .take(CHART_COLUMN_LIMIT)
            .collect();

        Ok(Self {
            file_name: source.name().to_owned(),
            size_kb: source.size() as f64 / 1024.0,
            row_count: df.height(),
            column_count: df.width(),
            columns: column_kinds(df),
            head: df.head(Some(row_limit)),
            chart_columns,
        })
    }

    /// Subset of the table to plot.
    pub fn chart_data(&self, df: &DataFrame) -> Result<DataFrame> {
        Ok(df.select(self.chart_columns.iter().map(String::as_str))?)
    }
}
