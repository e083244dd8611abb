use super::FormatKind;
use crate::config::CsvSettings;
use crate::error::{Result, SweeperError};
use polars::prelude::*;
use std::io::Cursor;

/// Parse CSV bytes with a header row.
///
/// Dtypes are inferred from the first `infer_schema_length` rows. When a
/// later row does not fit that schema the file is read again with every row
/// sampled, so only malformed input fails.
pub fn read_csv(bytes: &[u8], settings: &CsvSettings) -> Result<DataFrame> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(SweeperError::decode(FormatKind::Csv, "file is empty"));
    }

    match parse(bytes, settings.infer_schema_length, settings.try_parse_dates) {
        Ok(df) => Ok(df),
        Err(e) if settings.infer_schema_length.is_some() => {
            tracing::debug!("CSV schema sample too short ({e}), rescanning all rows");
            parse(bytes, None, settings.try_parse_dates)
                .map_err(|e| SweeperError::decode(FormatKind::Csv, e))
        }
        Err(e) => Err(SweeperError::decode(FormatKind::Csv, e)),
    }
}

fn parse(
    bytes: &[u8],
    infer_schema_length: Option<usize>,
    try_parse_dates: bool,
) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(infer_schema_length)
        .map_parse_options(|opts| opts.with_try_parse_dates(try_parse_dates))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
}

pub fn write_csv(df: &DataFrame) -> Result<Vec<u8>> {
    // CsvWriter needs a mutable frame; the caller's table stays untouched.
    let mut df = df.clone();
    let mut buffer = Cursor::new(Vec::new());
    CsvWriter::new(&mut buffer)
        .include_header(true)
        .finish(&mut df)
        .map_err(|e| SweeperError::encode(FormatKind::Csv, e))?;
    buffer.set_position(0);
    Ok(buffer.into_inner())
}
