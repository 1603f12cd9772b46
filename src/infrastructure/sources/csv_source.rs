//! CSV price-history loader.
//!
//! The export format carries a 3-line preamble: line 1 is the real column
//! header, lines 2 and 3 are metadata (ticker and field labels), and data
//! starts on line 4. The header also mislabels the date column as "Price".

use crate::domain::bar::{Column, RawBar, RawTable};
use crate::domain::errors::SourceFormatError;
use chrono::NaiveDate;
use std::path::Path;
use tracing::warn;

/// Parses one `stock_data_<TICKER>.csv` file into an un-cleaned table.
///
/// Fails with `MissingColumn` when the header lacks a Date (or "Price")
/// or Close column. Unparseable cell values become missing instead of
/// failing the file, except dates: a row without a usable date is
/// dropped here, since nothing downstream can key it.
pub fn load_csv_file(path: &Path, ticker: &str) -> Result<RawTable, SourceFormatError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    // Header row -> canonical columns; unknown headers are ignored.
    let layout: Vec<Option<Column>> = reader
        .headers()?
        .iter()
        .map(Column::from_header)
        .collect();

    let file = path.display().to_string();
    let mut table = RawTable::new();
    table.columns.insert(Column::Ticker);
    for column in layout.iter().flatten() {
        table.columns.insert(*column);
    }

    for required in [Column::Date, Column::Close] {
        if !table.has_column(required) {
            return Err(SourceFormatError::MissingColumn {
                file: file.clone(),
                column: required,
            });
        }
    }

    // Rows 2 and 3 are metadata, data resumes on row 4.
    let mut dropped_dates = 0usize;
    for record in reader.records().skip(2) {
        let record = record?;
        let mut bar = RawBar::empty(ticker);

        for (idx, column) in layout.iter().enumerate() {
            let Some(column) = column else { continue };
            let Some(value) = record.get(idx) else {
                continue;
            };
            match column {
                Column::Date => bar.date = parse_date(value),
                Column::Ticker => {}
                _ => {
                    if let Some(parsed) = parse_numeric(value) {
                        bar.set(*column, parsed);
                    }
                }
            }
        }

        if bar.date.is_none() {
            dropped_dates += 1;
            continue;
        }
        table.rows.push(bar);
    }

    if dropped_dates > 0 {
        warn!(
            "{}: dropped {} row(s) with unparseable dates",
            file, dropped_dates
        );
    }
    Ok(table)
}

/// Lenient date parsing: plain dates, datetimes, and RFC 3339 stamps.
fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    None
}

fn parse_numeric(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
