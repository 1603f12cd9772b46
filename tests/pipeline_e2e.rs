//! End-to-end runs of the stage graph over a temporary raw directory.

use chrono::{Duration, NaiveDate};
use serde_json::{Map, Value, json};
use std::fs;
use std::path::Path;
use trendpipe::application::pipeline::{self, Job};
use trendpipe::config::{Config, DataStorage, FeatureParams};
use trendpipe::domain::errors::PipelineError;
use trendpipe::domain::features::Trend;

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

/// Writes a price-history CSV with the real export's 3-line preamble and
/// the mislabeled "Price" date column.
fn write_csv(raw_dir: &Path, ticker: &str, start: NaiveDate, closes: &[f64]) {
    let mut contents = String::from("Price,Close,High,Low,Open,Volume\n");
    contents.push_str(&format!(
        "Ticker,{t},{t},{t},{t},{t}\nDate,,,,,\n",
        t = ticker
    ));
    for (i, close) in closes.iter().enumerate() {
        let day = start + Duration::days(i as i64);
        contents.push_str(&format!(
            "{},{:.2},{:.2},{:.2},{:.2},{}\n",
            day,
            close,
            close + 1.0,
            close - 1.0,
            close,
            1_000_000 + i
        ));
    }
    fs::write(raw_dir.join(format!("stock_data_{}.csv", ticker)), contents).unwrap();
}

/// Writes a tuple-keyed JSON export with all OHLCV fields.
fn write_json(raw_dir: &Path, ticker: &str, start_millis: i64, closes: &[f64]) {
    let mut root = Map::new();
    for field in ["Close", "Open", "High", "Low", "Volume"] {
        let mut by_ts = Map::new();
        for (i, close) in closes.iter().enumerate() {
            let ts = start_millis + i as i64 * 86_400_000;
            let value = match field {
                "Volume" => json!(1_000_000 + i),
                "High" => json!(close + 1.0),
                "Low" => json!(close - 1.0),
                _ => json!(close),
            };
            by_ts.insert(ts.to_string(), value);
        }
        root.insert(
            format!("('{}', '{}')", field, ticker),
            Value::Object(by_ts),
        );
    }
    fs::write(
        raw_dir.join(format!("stock_data_{}.json", ticker)),
        serde_json::to_string(&Value::Object(root)).unwrap(),
    )
    .unwrap();
}

fn config_for(base: &Path) -> Config {
    Config {
        storage: DataStorage::new(base),
        params: FeatureParams::default(),
    }
}

fn rising(n: usize, from: f64) -> Vec<f64> {
    (0..n).map(|i| from + i as f64).collect()
}

#[test]
fn test_full_run_over_csv_and_json_sources() {
    let dir = tempfile::tempdir().unwrap();
    let raw_dir = dir.path().join("data").join("raw");
    fs::create_dir_all(&raw_dir).unwrap();

    write_csv(&raw_dir, "NFLX", date("2021-01-01"), &rising(60, 100.0));
    // 1609459200000 = 2021-01-01
    write_json(&raw_dir, "AAPL", 1_609_459_200_000, &rising(60, 50.0));

    let config = config_for(dir.path());
    let ctx = pipeline::run_job(&config, Job::Full).unwrap();

    let dataset = ctx.dataset.expect("dataset produced");
    // Rising series: 60 bars leave 11 retained rows per ticker, of which
    // 5 survive the momentum window and the next-day shift.
    assert_eq!(dataset.len(), 10);

    // Ticker-major ordering, dates ascending within each ticker
    let tickers: Vec<&str> = dataset.rows.iter().map(|r| r.ticker.as_str()).collect();
    assert!(tickers[..5].iter().all(|t| *t == "AAPL"));
    assert!(tickers[5..].iter().all(|t| *t == "NFLX"));
    for per_ticker in dataset.rows.chunks(5) {
        assert!(per_ticker.windows(2).all(|w| w[0].date < w[1].date));
    }
    assert!(dataset.rows.iter().all(|r| r.trend == Trend::Bullish));

    // Artifacts persisted
    let artifact = config.storage.dataset_path();
    assert!(artifact.exists());
    let header = fs::read_to_string(&artifact)
        .unwrap()
        .lines()
        .next()
        .unwrap()
        .to_string();
    for column in ["ticker", "date", "sma_50", "volatility_5d", "next_day_target"] {
        assert!(header.contains(column), "header missing {}", column);
    }
    assert!(config.storage.report_path().exists());

    // All-Bullish data passes the gate with an imbalance warning.
    let report = ctx.quality.expect("quality report produced");
    assert!(report.passed);
    assert_eq!(report.bullish_pct, Some(100.0));
    assert_eq!(report.warnings().len(), 1);

    // Combined-data validation passed as well
    assert!(ctx.checks.iter().any(|c| c.name == "combined_data_quality" && c.passed));
}

#[test]
fn test_disjoint_date_ranges_sort_ticker_first() {
    let dir = tempfile::tempdir().unwrap();
    let raw_dir = dir.path().join("data").join("raw");
    fs::create_dir_all(&raw_dir).unwrap();

    // ZZZ trades years before AAA; ticker order must still win.
    write_csv(&raw_dir, "ZZZ", date("2020-01-01"), &rising(60, 10.0));
    write_csv(&raw_dir, "AAA", date("2022-06-01"), &rising(60, 500.0));

    let ctx = pipeline::run_job(&config_for(dir.path()), Job::Transformation).unwrap();

    let dataset = ctx.dataset.unwrap();
    let tickers: Vec<&str> = dataset.rows.iter().map(|r| r.ticker.as_str()).collect();
    let first_zzz = tickers.iter().position(|t| *t == "ZZZ").unwrap();
    assert!(tickers[..first_zzz].iter().all(|t| *t == "AAA"));
    assert!(dataset.rows[0].date > dataset.rows[first_zzz].date);
}

#[test]
fn test_unparseable_file_is_skipped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let raw_dir = dir.path().join("data").join("raw");
    fs::create_dir_all(&raw_dir).unwrap();

    write_csv(&raw_dir, "GOOD", date("2021-01-01"), &rising(60, 100.0));
    // Header lacks a Close column entirely
    fs::write(
        raw_dir.join("stock_data_BAD.csv"),
        "Price,Open\nTicker,BAD\nDate,\n2021-01-04,1.0\n",
    )
    .unwrap();
    // Outside the naming convention: ignored, not even parsed
    fs::write(raw_dir.join("notes.csv"), "hello").unwrap();

    let ctx = pipeline::run_job(&config_for(dir.path()), Job::Full).unwrap();

    let dataset = ctx.dataset.unwrap();
    assert!(!dataset.is_empty());
    assert!(dataset.rows.iter().all(|r| r.ticker == "GOOD"));
}

#[test]
fn test_empty_raw_dir_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let raw_dir = dir.path().join("data").join("raw");
    fs::create_dir_all(&raw_dir).unwrap();

    let err = pipeline::run_job(&config_for(dir.path()), Job::Full).unwrap_err();
    assert!(matches!(err, PipelineError::EmptyDataset { .. }));
}

#[test]
fn test_extraction_job_stops_after_combine() {
    let dir = tempfile::tempdir().unwrap();
    let raw_dir = dir.path().join("data").join("raw");
    fs::create_dir_all(&raw_dir).unwrap();

    write_csv(&raw_dir, "AMZN", date("2021-01-01"), &rising(10, 100.0));

    let config = config_for(dir.path());
    let ctx = pipeline::run_job(&config, Job::Extraction).unwrap();

    assert!(ctx.combined.is_some());
    assert_eq!(ctx.checks.len(), 1);
    assert!(ctx.dataset.is_none());
    assert!(!config.storage.dataset_path().exists());
}
