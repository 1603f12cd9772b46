//! JSON price-history loader.
//!
//! The export is a map keyed by stringified 2-tuples of (field, ticker),
//! e.g. `"('Close', 'AAPL')"`, each holding an epoch-milliseconds ->
//! value map. All fields sharing a timestamp join into one row.

use crate::domain::bar::{Column, RawBar, RawTable};
use crate::domain::errors::SourceFormatError;
use chrono::{DateTime, NaiveDate};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Decodes the field name out of a tuple-shaped key.
///
/// The contract is narrow: the key must contain a non-empty first
/// single-quoted token (`"('Close', 'AAPL')"` -> `Close`). Anything else
/// is a decoding error, never a silent misparse.
pub fn parse_field_name(key: &str) -> Result<&str, SourceFormatError> {
    let mut parts = key.split('\'');
    // parts: before first quote, first token, rest
    let _ = parts.next();
    match parts.next() {
        Some(field) if !field.is_empty() && parts.next().is_some() => Ok(field),
        _ => Err(SourceFormatError::MalformedKey {
            key: key.to_string(),
        }),
    }
}

/// Parses one `stock_data_<TICKER>.json` file into an un-cleaned table.
pub fn load_json_file(path: &Path, ticker: &str) -> Result<RawTable, SourceFormatError> {
    let contents = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&contents)?;
    let file = path.display().to_string();

    let Value::Object(map) = value else {
        return Err(SourceFormatError::NotAnObject { file });
    };

    let mut table = RawTable::new();
    table.columns.insert(Column::Date);
    table.columns.insert(Column::Ticker);

    // Joined by timestamp; BTreeMap keeps the series date-ordered.
    let mut rows: BTreeMap<i64, RawBar> = BTreeMap::new();

    for (key, field_values) in map {
        let field = parse_field_name(&key)?;
        let Some(column) = Column::from_header(field) else {
            debug!("{}: ignoring unknown field '{}'", file, field);
            continue;
        };
        table.columns.insert(column);

        let Value::Object(by_timestamp) = field_values else {
            return Err(SourceFormatError::BadFieldValue {
                file: file.clone(),
                field: field.to_string(),
            });
        };

        for (timestamp, value) in by_timestamp {
            let Ok(millis) = timestamp.parse::<i64>() else {
                return Err(SourceFormatError::BadFieldValue {
                    file: file.clone(),
                    field: field.to_string(),
                });
            };
            let bar = rows.entry(millis).or_insert_with(|| {
                let mut bar = RawBar::empty(ticker);
                bar.date = date_from_millis(millis);
                bar
            });
            // Non-numeric readings are coerced to missing.
            if let Some(parsed) = value.as_f64().filter(|v| v.is_finite()) {
                bar.set(column, parsed);
            }
        }
    }

    if !table.has_column(Column::Close) {
        return Err(SourceFormatError::MissingColumn {
            file,
            column: Column::Close,
        });
    }

    table.rows = rows.into_values().collect();
    Ok(table)
}

fn date_from_millis(millis: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.date_naive())
}
