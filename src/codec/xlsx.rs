//! Spreadsheet reading (calamine) and writing (`rust_xlsxwriter`).
//!
//! Excel stores every number as a double, so a column whose numbers are all
//! integral is read back as `Int64`. Temporal values are written as serial
//! day numbers with a date/time number format, which is what marks them as
//! dates for any reader.

use super::FormatKind;
use crate::config::XlsxSettings;
use crate::error::{Result, SweeperError};
use crate::table::ColumnKind;
use anyhow::{Context as _, anyhow};
use calamine::{Data, DataType as _, Range, Reader as _, Xlsx};
use chrono::{DateTime, NaiveDateTime};
use polars::prelude::*;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::collections::HashSet;
use std::io::Cursor;

/// Data rows available below the header row.
pub const MAX_DATA_ROWS: usize = 1_048_575;
pub const MAX_COLUMNS: usize = 16_384;

const MS_PER_DAY: f64 = 86_400_000.0;
/// Serial number of 1970-01-01 in the 1900 date system.
const UNIX_EPOCH_SERIAL: f64 = 25_569.0;
/// Largest integer a double represents exactly.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

pub fn read_xlsx(bytes: &[u8]) -> Result<DataFrame> {
    read_first_sheet(bytes).map_err(|e| SweeperError::decode(FormatKind::Xlsx, format!("{e:#}")))
}

pub fn write_xlsx(df: &DataFrame, settings: &XlsxSettings) -> Result<Vec<u8>> {
    if df.height() > MAX_DATA_ROWS {
        return Err(SweeperError::encode(
            FormatKind::Xlsx,
            format!(
                "{} rows exceed the worksheet limit of {MAX_DATA_ROWS}",
                df.height()
            ),
        ));
    }
    if df.width() > MAX_COLUMNS {
        return Err(SweeperError::encode(
            FormatKind::Xlsx,
            format!(
                "{} columns exceed the worksheet limit of {MAX_COLUMNS}",
                df.width()
            ),
        ));
    }

    write_workbook(df, settings).map_err(|e| SweeperError::encode(FormatKind::Xlsx, format!("{e:#}")))
}

fn read_first_sheet(bytes: &[u8]) -> anyhow::Result<DataFrame> {
    let mut workbook: Xlsx<_> =
        Xlsx::new(Cursor::new(bytes)).context("Failed to open workbook")?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("Workbook has no worksheets"))?
        .context("Failed to read first worksheet")?;
    range_to_frame(&range)
}

fn range_to_frame(range: &Range<Data>) -> anyhow::Result<DataFrame> {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(DataFrame::empty());
    };
    let data: Vec<&[Data]> = rows.collect();

    let columns = header_names(header)
        .into_iter()
        .enumerate()
        .map(|(idx, name)| {
            let cells: Vec<Option<&Data>> = data.iter().map(|row| row.get(idx)).collect();
            build_column(&name, &cells)
        })
        .collect::<anyhow::Result<Vec<Column>>>()?;

    DataFrame::new(columns).context("Failed to assemble table")
}

/// Header labels with blanks named `Unnamed: <index>` and repeats suffixed
/// `_duplicated_<n>`.
fn header_names(header: &[Data]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(header.len());

    for (idx, cell) in header.iter().enumerate() {
        let base = cell_text(cell).unwrap_or_else(|| format!("Unnamed: {idx}"));
        let mut name = base.clone();
        let mut n = 0;
        while seen.contains(&name) {
            name = format!("{base}_duplicated_{n}");
            n += 1;
        }
        seen.insert(name.clone());
        names.push(name);
    }
    names
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum CellClass {
    Blank,
    Integer,
    Float,
    Boolean,
    DateTime,
    Text,
}

impl CellClass {
    fn of(cell: Option<&Data>) -> Self {
        match cell {
            None | Some(Data::Empty | Data::Error(_)) => Self::Blank,
            Some(Data::Int(_)) => Self::Integer,
            Some(Data::Float(f)) if f.fract() == 0.0 && f.abs() <= MAX_EXACT_INT => Self::Integer,
            Some(Data::Float(_)) => Self::Float,
            Some(Data::Bool(_)) => Self::Boolean,
            Some(Data::DateTime(_) | Data::DateTimeIso(_)) => Self::DateTime,
            Some(Data::String(_) | Data::DurationIso(_)) => Self::Text,
        }
    }

    fn merge(self, other: Self) -> Self {
        match (self, other) {
            (Self::Blank, x) | (x, Self::Blank) => x,
            (a, b) if a == b => a,
            (Self::Integer, Self::Float) | (Self::Float, Self::Integer) => Self::Float,
            _ => Self::Text,
        }
    }
}

fn build_column(name: &str, cells: &[Option<&Data>]) -> anyhow::Result<Column> {
    let class = cells
        .iter()
        .fold(CellClass::Blank, |acc, cell| acc.merge(CellClass::of(*cell)));

    let series = match class {
        CellClass::Integer => {
            let values: Vec<Option<i64>> = cells.iter().map(|c| cell_f64(*c).map(|v| v as i64)).collect();
            Series::new(name.into(), values)
        }
        CellClass::Float => {
            let values: Vec<Option<f64>> = cells.iter().map(|c| cell_f64(*c)).collect();
            Series::new(name.into(), values)
        }
        CellClass::Boolean => {
            let values: Vec<Option<bool>> = cells.iter().map(|c| c.and_then(Data::get_bool)).collect();
            Series::new(name.into(), values)
        }
        CellClass::DateTime => {
            let values: Vec<Option<i64>> = cells
                .iter()
                .map(|c| c.and_then(Data::as_datetime).map(datetime_to_ms))
                .collect();
            Series::new(name.into(), values)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
                .with_context(|| format!("Failed to build date column '{name}'"))?
        }
        CellClass::Text | CellClass::Blank => {
            let values: Vec<Option<String>> = cells.iter().map(|c| c.and_then(cell_text)).collect();
            Series::new(name.into(), values)
        }
    };

    Ok(Column::from(series))
}

fn cell_f64(cell: Option<&Data>) -> Option<f64> {
    match cell {
        Some(Data::Int(i)) => Some(*i as f64),
        Some(Data::Float(f)) => Some(*f),
        _ => None,
    }
}

/// Text rendering of a cell, `None` for blanks and errors.
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => Some(s.clone()),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_datetime()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .or_else(|| Some(cell.to_string())),
        other => Some(other.to_string()),
    }
}

/// Milliseconds since the epoch, rounded to absorb serial-number float error.
fn datetime_to_ms(dt: NaiveDateTime) -> i64 {
    let micros = dt.and_utc().timestamp_micros();
    (micros + 500).div_euclid(1000)
}

fn ms_to_serial(ms: i64) -> f64 {
    ms as f64 / MS_PER_DAY + UNIX_EPOCH_SERIAL
}

fn write_workbook(df: &DataFrame, settings: &XlsxSettings) -> anyhow::Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(settings.sheet_name.as_str())
        .context("Invalid worksheet name")?;

    let header_format = Format::new().set_bold();
    let datetime_format = Format::new().set_num_format(settings.datetime_format.as_str());

    for (idx, column) in df.get_columns().iter().enumerate() {
        let col = u16::try_from(idx)?;
        worksheet.write_string_with_format(0, col, column.name().as_str(), &header_format)?;
        write_column(worksheet, col, column.as_materialized_series(), &datetime_format)
            .with_context(|| format!("Failed to write column '{}'", column.name()))?;
    }

    Ok(workbook.save_to_buffer()?)
}

fn write_column(
    worksheet: &mut Worksheet,
    col: u16,
    series: &Series,
    datetime_format: &Format,
) -> anyhow::Result<()> {
    match ColumnKind::from_dtype(series.dtype()) {
        ColumnKind::Numeric => {
            let values = series.cast(&DataType::Float64)?;
            for (idx, value) in values.f64()?.into_iter().enumerate() {
                // Excel has no NaN/inf; those stay blank like nulls
                if let Some(v) = value
                    && v.is_finite()
                {
                    worksheet.write_number(data_row(idx)?, col, v)?;
                }
            }
        }
        ColumnKind::Boolean => {
            for (idx, value) in series.bool()?.into_iter().enumerate() {
                if let Some(v) = value {
                    worksheet.write_boolean(data_row(idx)?, col, v)?;
                }
            }
        }
        ColumnKind::Temporal => {
            let millis = series
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
                .cast(&DataType::Int64)?;
            for (idx, value) in millis.i64()?.into_iter().enumerate() {
                let Some(ms) = value else { continue };
                let serial = ms_to_serial(ms);
                if serial >= 1.0 {
                    worksheet.write_number_with_format(data_row(idx)?, col, serial, datetime_format)?;
                } else if let Some(dt) = DateTime::from_timestamp_millis(ms) {
                    // before 1900: not representable as an Excel date
                    worksheet.write_string(data_row(idx)?, col, dt.naive_utc().to_string())?;
                }
            }
        }
        ColumnKind::Text => {
            let values = series.cast(&DataType::String)?;
            for (idx, value) in values.str()?.into_iter().enumerate() {
                if let Some(v) = value {
                    worksheet.write_string(data_row(idx)?, col, v)?;
                }
            }
        }
    }
    Ok(())
}

fn data_row(idx: usize) -> anyhow::Result<u32> {
    Ok(u32::try_from(idx + 1)?)
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used)]
    use super::*;
    use crate::table::column_names;
    use anyhow::Result;

    fn round_trip(df: &DataFrame) -> Result<DataFrame> {
        let bytes = write_xlsx(df, &XlsxSettings::default())?;
        Ok(read_xlsx(&bytes)?)
    }

    #[test]
    fn test_round_trip_preserves_types_and_values() -> Result<()> {
        let df = df!(
            "id" => &[1_i64, 2, 3],
            "name" => &[Some("Alice"), None, Some("Carol")],
            "score" => &[Some(9.5), Some(7.25), None],
            "active" => &[true, false, true]
        )?;

        let back = round_trip(&df)?;
        assert_eq!(column_names(&back), vec!["id", "name", "score", "active"]);
        assert_eq!(back.height(), 3);
        assert_eq!(back.column("id")?.dtype(), &DataType::Int64);
        assert_eq!(back.column("score")?.dtype(), &DataType::Float64);
        assert_eq!(back.column("active")?.dtype(), &DataType::Boolean);
        assert!(back.equals_missing(&df), "round trip changed values:\n{back}");
        Ok(())
    }

    #[test]
    fn test_round_trip_datetime_column() -> Result<()> {
        let ms = vec![Some(1_705_276_800_000_i64), None, Some(1_706_745_600_000)];
        let joined = Series::new("joined".into(), ms.clone())
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
        let df = DataFrame::new(vec![Column::from(joined)])?;

        let back = round_trip(&df)?;
        let column = back.column("joined")?.as_materialized_series();
        assert!(column.dtype().is_temporal());

        let decoded = column.cast(&DataType::Int64)?;
        let decoded: Vec<Option<i64>> = decoded.i64()?.into_iter().collect();
        assert_eq!(decoded.get(1), Some(&None));
        for (orig, got) in ms.iter().zip(decoded.iter()) {
            if let (Some(o), Some(g)) = (orig, got) {
                assert!((o - g).abs() < 1000, "{o} vs {g}");
            }
        }
        Ok(())
    }

    #[test]
    fn test_garbage_bytes_are_decode_error() {
        let err = read_xlsx(b"definitely not a zip file").unwrap_err();
        assert_eq!(err.kind(), "DecodeError");
    }

    #[test]
    fn test_header_names_fill_blanks_and_repeats() {
        let header = vec![
            Data::String("a".to_owned()),
            Data::Empty,
            Data::String("a".to_owned()),
            Data::Float(2024.0),
        ];
        assert_eq!(
            header_names(&header),
            vec!["a", "Unnamed: 1", "a_duplicated_0", "2024"]
        );
    }

    #[test]
    fn test_mixed_cells_become_text() -> Result<()> {
        let cells = [
            Data::Int(1),
            Data::String("two".to_owned()),
            Data::Empty,
        ];
        let refs: Vec<Option<&Data>> = cells.iter().map(Some).collect();
        let column = build_column("mixed", &refs)?;
        assert_eq!(column.dtype(), &DataType::String);
        assert_eq!(column.null_count(), 1);
        assert_eq!(
            column.as_materialized_series().str()?.get(1).unwrap(),
            "two"
        );
        Ok(())
    }

    #[test]
    fn test_integral_floats_become_integers() -> Result<()> {
        let cells = [Data::Float(1.0), Data::Int(2), Data::Empty];
        let refs: Vec<Option<&Data>> = cells.iter().map(Some).collect();
        let column = build_column("n", &refs)?;
        assert_eq!(column.dtype(), &DataType::Int64);

        let cells = [Data::Float(1.5), Data::Int(2)];
        let refs: Vec<Option<&Data>> = cells.iter().map(Some).collect();
        let column = build_column("n", &refs)?;
        assert_eq!(column.dtype(), &DataType::Float64);
        Ok(())
    }

    #[test]
    fn test_empty_table_writes_header_only() -> Result<()> {
        let df = df!("a" => Vec::<i64>::new(), "b" => Vec::<String>::new())?;
        let back = round_trip(&df)?;
        assert_eq!(column_names(&back), vec!["a", "b"]);
        assert_eq!(back.height(), 0);
        Ok(())
    }
}
