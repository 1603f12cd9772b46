//! Merges the per-source tables into one ordered table and validates the
//! combined result.

use crate::domain::bar::{Column, RawTable};
use crate::domain::checks::CheckResult;
use crate::domain::errors::PipelineError;
use tracing::info;

/// Combines the CSV and JSON tables, sorted by (ticker lexical, date
/// ascending). An empty merge is fatal: no valid source file yielded any
/// rows and nothing downstream can run.
pub fn combine(csv_table: RawTable, json_table: RawTable) -> Result<RawTable, PipelineError> {
    info!("Combining CSV and JSON data");

    let mut combined = csv_table;
    if !json_table.is_empty() {
        combined.merge(json_table);
    }

    if combined.is_empty() {
        return Err(PipelineError::EmptyDataset {
            stage: "combine".to_string(),
        });
    }

    combined.sort();

    let tickers = combined.tickers();
    info!(
        "Combined dataset: {} rows from {} tickers: {:?}",
        combined.len(),
        tickers.len(),
        tickers
    );
    Ok(combined)
}

/// Validation pass over the combined table. Reported, not fatal: the
/// caller decides whether to abort on a failed check.
pub fn validate_combined(table: &RawTable) -> CheckResult {
    let mut check = CheckResult::new("combined_data_quality");

    // Check 1: data is not empty
    if table.is_empty() {
        check.fail("dataset is empty");
    } else {
        check.ok(format!("dataset contains {} rows", table.len()));
    }

    // Check 2: required columns are present
    let missing = table.missing_required_columns();
    if !missing.is_empty() {
        let names: Vec<String> = missing.iter().map(|c| c.to_string()).collect();
        check.fail(format!("missing columns: {:?}", names));
    } else {
        check.ok("all required columns present");
    }

    // Check 3: no null values in critical columns
    if check.passed {
        let null_dates = table.rows.iter().filter(|r| r.date.is_none()).count();
        let null_close = table.rows.iter().filter(|r| r.close.is_none()).count();
        if null_dates > 0 || null_close > 0 {
            check.fail(format!(
                "null values - Date: {}, Close: {}",
                null_dates, null_close
            ));
        } else {
            check.ok("no null values in critical columns");
        }
    }

    // Check 4: date range is reasonable
    if check.passed {
        let dates = table.rows.iter().filter_map(|r| r.date);
        match (dates.clone().min(), dates.max()) {
            (Some(min), Some(max)) if min <= max => {
                check.ok(format!("date range: {} to {}", min, max));
            }
            _ => check.fail("date range is not resolvable"),
        }
    }

    check.meta("row_count", table.len());
    check.meta(
        "ticker_count",
        if check.passed { table.tickers().len() } else { 0 },
    );
    check
}
