//! Table cleaning: duplicate-row removal and numeric mean imputation.
//!
//! Both operations take a borrowed table and return a new one, so a caller
//! holding the input keeps an unchanged copy. [`clean`] applies whichever
//! toggles a [`CleaningRequest`] enables, always deduplicating before
//! imputing: filled-in means are synthetic values and must not decide which
//! rows count as duplicates.

use crate::error::Result;
use crate::table::numeric_columns;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Which cleaning operations to run for one file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningRequest {
    pub remove_duplicates: bool,
    pub impute_numeric_means: bool,
}

impl CleaningRequest {
    pub fn is_noop(&self) -> bool {
        !self.remove_duplicates && !self.impute_numeric_means
    }
}

/// A numeric column whose nulls were replaced by its mean.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImputedColumn {
    pub name: String,
    pub mean: f64,
    pub filled: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImputationReport {
    pub filled: Vec<ImputedColumn>,
    /// Numeric columns without any value to average; their nulls are kept.
    pub skipped: Vec<String>,
}

impl ImputationReport {
    pub fn cells_filled(&self) -> usize {
        self.filled.iter().map(|c| c.filled).sum()
    }
}

#[derive(Debug, Clone)]
pub struct Imputation {
    pub table: DataFrame,
    pub report: ImputationReport,
}

/// Result of [`clean`].
#[derive(Debug, Clone)]
pub struct Cleaned {
    pub table: DataFrame,
    /// Rows dropped as duplicates (zero when deduplication was off).
    pub duplicates_removed: usize,
    /// `None` when imputation was not requested.
    pub imputation: Option<ImputationReport>,
}

/// Drop every row that repeats an earlier row in all columns.
///
/// Nulls compare equal to nulls. The first occurrence of each row is kept
/// and the remaining order is preserved.
pub fn remove_duplicates(df: &DataFrame) -> Result<DataFrame> {
    if df.width() == 0 || df.height() < 2 {
        return Ok(df.clone());
    }

    let deduped = df
        .clone()
        .lazy()
        .unique_stable(None, UniqueKeepStrategy::First)
        .collect()?;
    Ok(deduped)
}

/// Fill nulls in numeric columns with the column mean.
///
/// Each mean is taken over the non-null values before any filling. Columns
/// with no values at all are left as they are and listed in
/// [`ImputationReport::skipped`]. Text, boolean and temporal nulls are never
/// touched.
pub fn impute_numeric_means(df: &DataFrame) -> Result<Imputation> {
    let mut report = ImputationReport::default();
    let mut table = df.clone();

    for name in numeric_columns(df) {
        let series = df.column(&name)?.as_materialized_series();
        let nulls = series.null_count();
        if nulls == 0 {
            continue;
        }

        match series.mean() {
            Some(mean) if mean.is_finite() => {
                // Filled on the series by exact name; a `col()` expression
                // would read names like `*` or `^a$` as patterns.
                let filled = series
                    .cast(&DataType::Float64)?
                    .f64()?
                    .fill_null_with_values(mean)?
                    .into_series();
                table.with_column(filled)?;
                report.filled.push(ImputedColumn {
                    name,
                    mean,
                    filled: nulls,
                });
            }
            _ => {
                tracing::info!(column = %name, "no values to average, imputation skipped");
                report.skipped.push(name);
            }
        }
    }

    Ok(Imputation { table, report })
}

/// Run the requested operations, deduplication first.
pub fn clean(df: &DataFrame, request: &CleaningRequest) -> Result<Cleaned> {
    let mut table = if request.remove_duplicates {
        remove_duplicates(df)?
    } else {
        df.clone()
    };
    let duplicates_removed = df.height() - table.height();

    let imputation = if request.impute_numeric_means {
        let Imputation {
            table: imputed,
            report,
        } = impute_numeric_means(&table)?;
        table = imputed;
        Some(report)
    } else {
        None
    };

    Ok(Cleaned {
        table,
        duplicates_removed,
        imputation,
    })
}

#[cfg(test)]
mod tests;
