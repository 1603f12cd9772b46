//! Turns the combined un-cleaned table into per-ticker series with
//! validated columns and types.

use crate::domain::bar::{PriceBar, RawTable, TickerSeries};
use crate::domain::errors::PipelineError;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Cleans the combined table into date-sorted, duplicate-free ticker
/// series. Missing required columns are fatal; rows with null Date or
/// Close are dropped with a warning.
pub fn clean(table: &RawTable) -> Result<Vec<TickerSeries>, PipelineError> {
    info!("Cleaning stock data");

    let missing = table.missing_required_columns();
    if !missing.is_empty() {
        return Err(PipelineError::MissingColumns { columns: missing });
    }

    let mut dropped = 0usize;
    let mut duplicates = 0usize;
    // BTreeMap keeps tickers in lexical order.
    let mut by_ticker: BTreeMap<String, TickerSeries> = BTreeMap::new();

    for row in &table.rows {
        let (Some(date), Some(close)) = (row.date, row.close) else {
            dropped += 1;
            continue;
        };

        let series = by_ticker
            .entry(row.ticker.clone())
            .or_insert_with(|| TickerSeries::new(row.ticker.clone()));

        // The combined table is date-sorted per ticker, so a duplicate
        // date always lands next to its first occurrence.
        if series.bars.last().is_some_and(|last| last.date == date) {
            duplicates += 1;
            continue;
        }

        series.bars.push(PriceBar {
            date,
            open: row.open,
            high: row.high,
            low: row.low,
            close,
            volume: row
                .volume
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(|v| v.round() as u64),
        });
    }

    if dropped > 0 {
        warn!("Dropped {} rows with null Date/Close values", dropped);
    }
    if duplicates > 0 {
        warn!("Dropped {} duplicate (ticker, date) rows", duplicates);
    }

    let series: Vec<TickerSeries> = by_ticker.into_values().filter(|s| !s.is_empty()).collect();
    let total_rows: usize = series.iter().map(|s| s.len()).sum();
    info!("Cleaned data: {} rows from {} tickers", total_rows, series.len());

    Ok(series)
}
