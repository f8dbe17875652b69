//! CSV import of datasets and CSV export of the current selection

use super::dataset::{Dataset, from_millis};
use crate::error::{CrossError, Result};
use crate::filter::{ColumnKind, Selection};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::path::Path;

/// Slash-delimited date-time formats, month first, tried in order
const SLASH_DATETIME_FORMATS: [&str; 4] = [
    "%m/%d/%Y %H:%M",       // 1/5/2020 14:30
    "%m/%d/%Y %H:%M:%S",    // 1/5/2020 14:30:15
    "%m/%d/%Y %I:%M %p",    // 1/5/2020 2:30 PM
    "%m/%d/%Y %I:%M:%S %p", // 1/5/2020 2:30:15 PM
];

/// ISO 8601 forms without a UTC offset
const ISO_DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f", // 2020-01-15T14:30:00.123
    "%Y-%m-%dT%H:%M:%S",    // 2020-01-15T14:30:00
    "%Y-%m-%dT%H:%M",       // 2020-01-15T14:30
    "%Y-%m-%d %H:%M:%S%.f", // 2020-01-15 14:30:00.123
    "%Y-%m-%d %H:%M:%S",    // 2020-01-15 14:30:00
    "%Y-%m-%d %H:%M",       // 2020-01-15 14:30
];

/// Format used when writing dates back out
const EXPORT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a date string from the first CSV column.
///
/// Strings without a `/` are treated as ISO 8601; strings with one use the
/// month-first `M/D/YYYY` family with an optional 24h or 12h time of day.
/// Returns `None` when the string is not a valid date.
pub fn parse_date_str(date_str: &str) -> Option<NaiveDateTime> {
    let trimmed = date_str.trim();
    if trimmed.is_empty() {
        return None;
    }

    if !trimmed.contains('/') {
        return parse_iso8601(trimmed);
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%m/%d/%Y") {
        return date.and_hms_opt(0, 0, 0);
    }
    SLASH_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
}

fn parse_iso8601(s: &str) -> Option<NaiveDateTime> {
    // Explicit offsets are normalized to UTC wall time
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Some(dt) = ISO_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
    {
        return Some(dt);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Coerce a CSV cell to a number; blank or non-numeric cells are missing
fn parse_number(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse CSV text into a dataset.
///
/// The first row is the header and the first column must hold dates. Rows
/// whose date does not parse are dropped; the remaining cells are coerced to
/// numbers with blanks mapped to missing values.
pub fn parse_csv_str(text: &str) -> Result<Dataset> {
    profiling::scope!("parse_csv_str");

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let (date_name, variable_names) = headers.split_first().ok_or(CrossError::EmptyDataset)?;

    let mut dates = Vec::new();
    let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::new(); variable_names.len()];
    let mut dropped = 0usize;

    for record in reader.records() {
        let record = record?;
        let Some(date) = record.get(0).and_then(parse_date_str) else {
            dropped += 1;
            continue;
        };
        dates.push(date);
        for (idx, column) in columns.iter_mut().enumerate() {
            column.push(record.get(idx + 1).and_then(parse_number));
        }
    }

    if dropped > 0 {
        tracing::warn!("Dropped {} CSV rows with unparseable dates", dropped);
    }
    if dates.is_empty() {
        return Err(CrossError::EmptyDataset);
    }

    tracing::info!(
        "Parsed CSV: {} rows, {} variables",
        dates.len(),
        variable_names.len()
    );
    Dataset::new(
        date_name,
        &dates,
        variable_names.iter().cloned().zip(columns).collect(),
    )
}

/// Read and parse a CSV file
pub fn read_csv_file(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path)?;
    parse_csv_str(&text)
}

fn format_value(kind: ColumnKind, value: f64) -> String {
    match kind {
        ColumnKind::Date => from_millis(value as i64)
            .map(|dt| dt.format(EXPORT_DATE_FORMAT).to_string())
            .unwrap_or_default(),
        ColumnKind::Numeric if value.is_nan() => "NaN".to_string(),
        ColumnKind::Numeric => value.to_string(),
    }
}

/// Render the selected records as CSV: a header row, then one row per record
pub fn selection_to_csv(selection: &Selection) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(selection.names())?;
    for record in selection.records() {
        writer.write_record(
            selection
                .kinds()
                .iter()
                .zip(&record.values)
                .map(|(&kind, &value)| format_value(kind, value)),
        )?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| CrossError::FileIo(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Write the selected records to a CSV file
pub fn write_selection_csv(selection: &Selection, path: &Path) -> Result<()> {
    std::fs::write(path, selection_to_csv(selection)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::SelectedRecord;
    use std::io::Write;
    use tempfile::Builder;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_parse_slash_dates() {
        assert_eq!(parse_date_str("1/1/2020"), Some(dt(2020, 1, 1, 0, 0, 0)));
        assert_eq!(parse_date_str("12/31/2019 23:05"), Some(dt(2019, 12, 31, 23, 5, 0)));
        assert_eq!(parse_date_str("3/4/2021 7:08:09"), Some(dt(2021, 3, 4, 7, 8, 9)));
        assert_eq!(parse_date_str("3/4/2021 2:30 PM"), Some(dt(2021, 3, 4, 14, 30, 0)));
        assert_eq!(parse_date_str("3/4/2021 12:15:01 AM"), Some(dt(2021, 3, 4, 0, 15, 1)));
    }

    #[test]
    fn test_parse_iso_dates() {
        assert_eq!(parse_date_str("2020-02-29"), Some(dt(2020, 2, 29, 0, 0, 0)));
        assert_eq!(parse_date_str("2020-02-29T10:11:12"), Some(dt(2020, 2, 29, 10, 11, 12)));
        assert_eq!(parse_date_str("2020-02-29 10:11"), Some(dt(2020, 2, 29, 10, 11, 0)));
        assert_eq!(parse_date_str("2020-02-29T10:11:12Z"), Some(dt(2020, 2, 29, 10, 11, 12)));
        assert_eq!(
            parse_date_str("2020-02-29T10:11:12+02:00"),
            Some(dt(2020, 2, 29, 8, 11, 12))
        );
    }

    #[test]
    fn test_parse_invalid_dates() {
        assert_eq!(parse_date_str(""), None);
        assert_eq!(parse_date_str("not a date"), None);
        assert_eq!(parse_date_str("13/1/2020"), None);
        assert_eq!(parse_date_str("2020-02-30"), None);
    }

    #[test]
    fn test_blank_cell_is_missing() {
        let ds = parse_csv_str("Date,A,B\n1/1/2020,1,\n").unwrap();
        assert_eq!(ds.height(), 1);
        assert_eq!(ds.variable_names(), vec!["A", "B"]);
        assert_eq!(ds.variable_values("A").unwrap(), vec![1.0]);
        assert!(ds.variable_values("B").unwrap()[0].is_nan());
    }

    #[test]
    fn test_bad_dates_are_dropped() {
        let text = "Date,A\n1/1/2020,1\ngarbage,2\n,3\n2020-01-03,4\n";
        let ds = parse_csv_str(text).unwrap();
        assert_eq!(ds.height(), 2);
        assert_eq!(ds.variable_values("A").unwrap(), vec![1.0, 4.0]);
    }

    #[test]
    fn test_non_numeric_and_short_rows() {
        let ds = parse_csv_str("Date,A,B\n1/1/2020, 2.5 ,abc\n1/2/2020,3\n").unwrap();
        assert_eq!(ds.variable_options("A").unwrap(), vec![Some(2.5), Some(3.0)]);
        assert_eq!(ds.variable_options("B").unwrap(), vec![None, None]);
    }

    #[test]
    fn test_no_valid_rows_is_empty() {
        assert!(matches!(
            parse_csv_str("Date,A\nnope,1\n"),
            Err(CrossError::EmptyDataset)
        ));
        assert!(matches!(parse_csv_str(""), Err(CrossError::EmptyDataset)));
    }

    #[test]
    fn test_read_csv_file() {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Date,Load").unwrap();
        writeln!(file, "1/1/2020 1:00,10").unwrap();
        writeln!(file, "1/1/2020 2:00,11").unwrap();
        file.flush().unwrap();

        let ds = read_csv_file(file.path()).unwrap();
        assert_eq!(ds.height(), 2);
        assert_eq!(ds.date_name(), "Date");
    }

    #[test]
    fn test_selection_to_csv() {
        let jan1 = crate::data::dataset::to_millis(&dt(2020, 1, 1, 6, 0, 0)) as f64;
        let selection = Selection::new(
            vec!["Date".to_string(), "Hour".to_string(), "A".to_string()],
            vec![ColumnKind::Date, ColumnKind::Numeric, ColumnKind::Numeric],
            vec![SelectedRecord {
                row: 0,
                values: vec![jan1, 6.0, 1.5],
            }],
        );

        let csv = selection_to_csv(&selection).unwrap();
        assert_eq!(csv, "Date,Hour,A\n2020-01-01 06:00:00,6,1.5\n");
    }
}
