//! In-memory table model.
//!
//! A table is a polars [`DataFrame`]: ordered, uniquely named columns of
//! equal length. Each column carries a [`ColumnKind`] derived from its dtype
//! at decode time; cleaning and encoding dispatch on that tag rather than on
//! individual cell values.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Coarse per-column type tag.
#[derive(Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Debug, Hash)]
pub enum ColumnKind {
    Numeric,
    Text,
    Boolean,
    Temporal,
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "Numeric",
            Self::Text => "Text",
            Self::Boolean => "Boolean",
            Self::Temporal => "Temporal",
        }
    }

    pub fn from_dtype(dtype: &DataType) -> Self {
        if dtype.is_primitive_numeric() {
            Self::Numeric
        } else if dtype.is_bool() {
            Self::Boolean
        } else if matches!(dtype, DataType::Date | DataType::Datetime(_, _)) {
            Self::Temporal
        } else {
            Self::Text
        }
    }
}

/// Column names in table order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

/// Column names paired with their kinds, in table order.
pub fn column_kinds(df: &DataFrame) -> Vec<(String, ColumnKind)> {
    df.get_columns()
        .iter()
        .map(|c| (c.name().to_string(), ColumnKind::from_dtype(c.dtype())))
        .collect()
}

/// Names of the columns tagged [`ColumnKind::Numeric`], in table order.
pub fn numeric_columns(df: &DataFrame) -> Vec<String> {
    column_kinds(df)
        .into_iter()
        .filter(|(_, kind)| *kind == ColumnKind::Numeric)
        .map(|(name, _)| name)
        .collect()
}

/// An uploaded file as handed over by the host.
///
/// The payload is never mutated; decoding borrows it.
#[derive(Debug, Clone)]
pub struct SourceFile {
    name: String,
    extension: String,
    bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let extension = extension_of(&name);
        Self {
            name,
            extension,
            bytes,
        }
    }

    /// Read a file from disk, keeping only its file name as identity.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lower-cased extension including the leading dot, or empty.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Lower-cased extension of `file_name` including the dot (`".csv"`), or an
/// empty string when the name has none.
pub fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|s| s.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("data.CSV"), ".csv");
        assert_eq!(extension_of("report.final.xlsx"), ".xlsx");
        assert_eq!(extension_of("README"), "");
        assert_eq!(extension_of(".hidden"), "");
    }

    #[test]
    fn test_column_kind_from_dtype() {
        assert_eq!(ColumnKind::from_dtype(&DataType::Int64), ColumnKind::Numeric);
        assert_eq!(ColumnKind::from_dtype(&DataType::Float32), ColumnKind::Numeric);
        assert_eq!(ColumnKind::from_dtype(&DataType::UInt32), ColumnKind::Numeric);
        assert_eq!(ColumnKind::from_dtype(&DataType::Boolean), ColumnKind::Boolean);
        assert_eq!(ColumnKind::from_dtype(&DataType::Date), ColumnKind::Temporal);
        assert_eq!(
            ColumnKind::from_dtype(&DataType::Datetime(TimeUnit::Milliseconds, None)),
            ColumnKind::Temporal
        );
        assert_eq!(ColumnKind::from_dtype(&DataType::String), ColumnKind::Text);
    }

    #[test]
    fn test_numeric_columns_keep_order() -> PolarsResult<()> {
        let df = df!(
            "name" => &["a", "b"],
            "score" => &[1.5, 2.5],
            "flag" => &[true, false],
            "count" => &[1_i64, 2]
        )?;
        assert_eq!(numeric_columns(&df), vec!["score", "count"]);
        Ok(())
    }

    #[test]
    fn test_source_file_identity() {
        let file = SourceFile::new("Sales.XLSX", vec![1, 2, 3]);
        assert_eq!(file.name(), "Sales.XLSX");
        assert_eq!(file.extension(), ".xlsx");
        assert_eq!(file.size(), 3);
    }
}
