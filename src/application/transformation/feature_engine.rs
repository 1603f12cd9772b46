//! Per-ticker feature engineering.
//!
//! The SMA and trend label are computed over the original chronological
//! series; rows without enough history classify as Neutral and are
//! filtered out before any further feature is derived. All remaining
//! rolling and shift features operate on the retained-row sequence.

use crate::config::FeatureParams;
use crate::domain::bar::{PriceBar, TickerSeries};
use crate::domain::features::{FeatureRow, Trend};
use rayon::prelude::*;
use statrs::statistics::{Data, Distribution};
use tracing::info;

struct RetainedRow {
    bar_idx: usize,
    sma: f64,
    trend: Trend,
    target: u8,
}

/// Engineers features for every ticker in parallel. Output preserves the
/// input (lexical ticker) order regardless of completion order.
pub fn engineer_all(series: &[TickerSeries], params: &FeatureParams) -> Vec<FeatureRow> {
    info!("Engineering features for {} tickers", series.len());

    let per_ticker: Vec<Vec<FeatureRow>> = series
        .par_iter()
        .map(|s| engineer(s, params))
        .collect();

    for (s, rows) in series.iter().zip(&per_ticker) {
        info!("Engineered features for {}: {} rows", s.ticker, rows.len());
    }

    per_ticker.into_iter().flatten().collect()
}

/// Engineers one ticker's date-sorted series. Rows with any missing
/// derived value (insufficient window history or end-of-series shift)
/// are excluded from the output.
pub fn engineer(series: &TickerSeries, params: &FeatureParams) -> Vec<FeatureRow> {
    let bars = &series.bars;

    // Pass 1: SMA and trend over the full series, keeping non-Neutral rows.
    let mut retained: Vec<RetainedRow> = Vec::new();
    for i in 0..bars.len() {
        let sma = trailing_mean(bars, i, params.sma_period);
        let trend = Trend::classify(bars[i].close, sma);
        if let (Some(sma), Some(target)) = (sma, trend.target()) {
            retained.push(RetainedRow {
                bar_idx: i,
                sma,
                trend,
                target,
            });
        }
    }

    // Pass 2: rolling/shift features over the retained sequence.
    let closes: Vec<f64> = retained.iter().map(|r| bars[r.bar_idx].close).collect();
    let mut rows = Vec::with_capacity(retained.len());

    for (j, row) in retained.iter().enumerate() {
        let price_change = pct_change(&closes, j, 1);
        let momentum = pct_change(&closes, j, params.momentum_period);
        let volatility = trailing_std(&closes, j, params.volatility_period);
        let next_day_target = retained.get(j + 1).map(|next| next.target);

        let (Some(price_change), Some(momentum), Some(volatility), Some(next_day_target)) =
            (price_change, momentum, volatility, next_day_target)
        else {
            continue;
        };

        let bar = &bars[row.bar_idx];
        rows.push(FeatureRow {
            ticker: series.ticker.clone(),
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            sma_50: row.sma,
            trend: row.trend,
            target: row.target,
            price_change,
            distance_from_sma: (bar.close - row.sma) / row.sma * 100.0,
            momentum_5d: momentum,
            volatility_5d: volatility,
            next_day_target,
        });
    }

    rows
}

/// Mean of the trailing `window` closes ending at `i` (inclusive).
/// `None` until a full window of history exists.
fn trailing_mean(bars: &[PriceBar], i: usize, window: usize) -> Option<f64> {
    if i + 1 < window {
        return None;
    }
    let closes: Vec<f64> = bars[i + 1 - window..=i].iter().map(|b| b.close).collect();
    Data::new(closes).mean().filter(|m| m.is_finite())
}

/// Percentage change against the value `lag` observations earlier.
/// NaN (0/0) counts as missing, mirroring the dropped-NaN semantics of
/// the downstream dataset.
fn pct_change(values: &[f64], j: usize, lag: usize) -> Option<f64> {
    if j < lag {
        return None;
    }
    let prev = values[j - lag];
    let change = (values[j] - prev) / prev;
    (!change.is_nan()).then_some(change)
}

/// Sample standard deviation of the trailing `window` values ending at
/// `j` (inclusive). Needs the full window, like the SMA.
fn trailing_std(values: &[f64], j: usize, window: usize) -> Option<f64> {
    if j + 1 < window {
        return None;
    }
    let slice: Vec<f64> = values[j + 1 - window..=j].to_vec();
    Data::new(slice).std_dev().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::PriceBar;
    use chrono::{Duration, NaiveDate};

    fn series(ticker: &str, closes: &[f64]) -> TickerSeries {
        let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        TickerSeries {
            ticker: ticker.to_string(),
            bars: closes
                .iter()
                .enumerate()
                .map(|(i, &close)| PriceBar {
                    date: start + Duration::days(i as i64),
                    open: Some(close),
                    high: Some(close),
                    low: Some(close),
                    close,
                    volume: Some(100),
                })
                .collect(),
        }
    }

    fn small_params() -> FeatureParams {
        FeatureParams {
            sma_period: 1,
            momentum_period: 1,
            volatility_period: 2,
        }
    }

    #[test]
    fn test_series_shorter_than_sma_window_yields_nothing() {
        let closes: Vec<f64> = (1..=49).map(|i| i as f64).collect();
        let s = series("AAPL", &closes);

        let rows = engineer(&s, &FeatureParams::default());
        assert!(rows.is_empty());
    }

    #[test]
    fn test_sma_defined_from_the_fiftieth_row() {
        let closes: Vec<f64> = (1..=60).map(|i| i as f64).collect();
        let s = series("AAPL", &closes);

        let rows = engineer(&s, &FeatureParams::default());

        // Retained rows are bars 49..59 (11 of them). Momentum needs 5
        // retained predecessors and the last row has no next-day target,
        // so bars 54..58 survive.
        assert_eq!(rows.len(), 5);
        let first = &rows[0];
        assert_eq!(
            first.date,
            NaiveDate::from_ymd_opt(2021, 1, 1).unwrap() + Duration::days(54)
        );
        // SMA of closes 6..=55 at bar index 54
        assert!((first.sma_50 - 30.5).abs() < 1e-9);
        assert_eq!(first.trend, Trend::Bullish);
        assert_eq!(first.target, 1);
    }

    #[test]
    fn test_output_never_contains_neutral() {
        // A flat-then-rising series mixes Bullish and Bearish rows after
        // the warmup; Neutral must never be emitted.
        let mut closes = vec![100.0; 30];
        closes.extend((0..30).map(|i| 100.0 + (i as f64) * ((i % 2) as f64 - 0.5)));
        let s = series("AAPL", &closes);

        let params = FeatureParams {
            sma_period: 3,
            momentum_period: 2,
            volatility_period: 2,
        };
        let rows = engineer(&s, &params);

        assert!(!rows.is_empty());
        assert!(rows.iter().all(|r| r.trend != Trend::Neutral));
    }

    #[test]
    fn test_derived_values_over_retained_sequence() {
        // sma_period = 1 makes sma == close, so every row is Bearish
        // (close is not strictly above its own mean) and retained.
        let s = series("AAPL", &[10.0, 20.0, 30.0, 40.0, 50.0]);

        let rows = engineer(&s, &small_params());

        // j = 1..=3 survive: j=0 lacks price_change, j=4 lacks next target.
        assert_eq!(rows.len(), 3);
        let first = &rows[0];
        assert!((first.price_change - 1.0).abs() < 1e-12);
        assert!((first.momentum_5d - 1.0).abs() < 1e-12);
        // Sample std of [10, 20]
        assert!((first.volatility_5d - 50.0_f64.sqrt()).abs() < 1e-9);
        assert_eq!(first.distance_from_sma, 0.0);
        assert_eq!(first.target, 0);
        assert_eq!(first.next_day_target, 0);
    }

    #[test]
    fn test_next_day_target_links_to_following_retained_row() {
        // Alternating jumps around a short SMA flip the trend sign.
        let closes = [
            100.0, 100.0, 100.0, 120.0, 80.0, 130.0, 70.0, 140.0, 60.0, 150.0,
        ];
        let s = series("AAPL", &closes);
        let params = FeatureParams {
            sma_period: 3,
            momentum_period: 1,
            volatility_period: 2,
        };

        let rows = engineer(&s, &params);
        assert!(rows.len() >= 2);
        for pair in rows.windows(2) {
            assert_eq!(pair[0].next_day_target, pair[1].target);
        }
    }

    #[test]
    fn test_last_retained_row_is_dropped() {
        let s = series("AAPL", &[10.0, 20.0, 30.0]);

        let rows = engineer(&s, &small_params());

        // Bars 1 and 2 have derived values, but bar 2 has no next-day
        // target and must be absent.
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].date,
            NaiveDate::from_ymd_opt(2021, 1, 2).unwrap()
        );
    }

    #[test]
    fn test_engineer_all_preserves_ticker_order() {
        let a = series("AMZN", &[10.0, 20.0, 30.0, 40.0]);
        let b = series("NFLX", &[5.0, 6.0, 7.0, 8.0]);

        let rows = engineer_all(&[a, b], &small_params());

        let tickers: Vec<&str> = rows.iter().map(|r| r.ticker.as_str()).collect();
        let first_nflx = tickers.iter().position(|t| *t == "NFLX").unwrap();
        assert!(tickers[..first_nflx].iter().all(|t| *t == "AMZN"));
        assert!(tickers[first_nflx..].iter().all(|t| *t == "NFLX"));
    }
}
