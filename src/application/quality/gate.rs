//! Independent quality gate over the persisted training artifact.
//!
//! The gate deliberately re-reads the file instead of trusting the
//! in-memory rows: it verifies what downstream training will actually
//! consume. It never mutates the dataset.

use crate::domain::checks::{CheckResult, QualityReport};
use crate::domain::errors::PipelineError;
use crate::domain::features::FeatureRow;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Minority-class share below this (or above its complement) is flagged
/// as a severe imbalance warning.
const CLASS_BALANCE_MIN_PCT: f64 = 20.0;

/// Runs the gate against a dataset file, producing a pass/fail report.
pub fn run_gate(path: &Path) -> Result<QualityReport, PipelineError> {
    info!("Running quality gate over {}", path.display());

    let mut reader = csv::Reader::from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    // Check 1: required feature columns
    let mut columns = CheckResult::new("required_features");
    let missing: Vec<&str> = FeatureRow::REQUIRED_FEATURES
        .iter()
        .copied()
        .filter(|name| !headers.iter().any(|h| h.as_str() == *name))
        .collect();
    if missing.is_empty() {
        columns.ok("all required features present");
    } else {
        columns.fail(format!("missing features: {:?}", missing));
    }
    let feature_count = FeatureRow::REQUIRED_FEATURES.len() - missing.len();
    columns.meta("feature_count", feature_count);

    let present: Vec<(usize, &str)> = headers
        .iter()
        .enumerate()
        .filter_map(|(idx, h)| {
            FeatureRow::REQUIRED_FEATURES
                .iter()
                .copied()
                .find(|&name| name == h.as_str())
                .map(|name| (idx, name))
        })
        .collect();
    let target_idx = headers.iter().position(|h| h == "target");

    // Single scan for checks 2 and 3.
    let mut row_count = 0usize;
    let mut bullish = 0usize;
    let mut non_finite: BTreeMap<&str, usize> = BTreeMap::new();

    for record in reader.records() {
        let record = record?;
        row_count += 1;

        for &(idx, name) in &present {
            let finite = record
                .get(idx)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .is_some_and(|v| v.is_finite());
            if !finite {
                *non_finite.entry(name).or_insert(0) += 1;
            }
        }

        if let Some(idx) = target_idx {
            if record.get(idx).map(str::trim) == Some("1") {
                bullish += 1;
            }
        }
    }

    // Check 2: no non-finite values in required feature columns
    let mut finite = CheckResult::new("finite_values");
    if columns.passed {
        if non_finite.is_empty() {
            finite.ok("no infinite values");
        } else {
            finite.fail(format!("non-finite values found: {:?}", non_finite));
        }
    } else {
        finite.ok("skipped: missing required features");
    }

    // Check 3: class balance (reported; imbalance is a warning, not a failure)
    let mut balance = CheckResult::new("class_balance");
    let (bullish_pct, bearish_pct) = if row_count > 0 && target_idx.is_some() {
        let bullish_pct = bullish as f64 / row_count as f64 * 100.0;
        let bearish_pct = 100.0 - bullish_pct;
        balance.ok(format!(
            "class balance - Bullish: {:.1}%, Bearish: {:.1}%",
            bullish_pct, bearish_pct
        ));
        if bullish_pct < CLASS_BALANCE_MIN_PCT || bullish_pct > 100.0 - CLASS_BALANCE_MIN_PCT {
            balance.warn("severe class imbalance detected");
        }
        (Some(bullish_pct), Some(bearish_pct))
    } else {
        balance.ok("class balance not computable");
        (None, None)
    };
    balance.meta("row_count", row_count);

    let checks = vec![columns, finite, balance];
    let report = QualityReport {
        passed: checks.iter().all(|c| c.passed),
        row_count,
        feature_count,
        bullish_pct,
        bearish_pct,
        checks,
    };

    for check in &report.checks {
        if check.passed {
            info!("{}", check);
        } else {
            warn!("{}", check);
        }
    }
    Ok(report)
}
