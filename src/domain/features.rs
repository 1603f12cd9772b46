use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Directional label from comparing close price to its trailing SMA.
///
/// `Neutral` marks rows without enough history to compute the SMA; those
/// rows are filtered out before any training feature is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

impl Trend {
    /// Pure per-row classification on two scalars.
    pub fn classify(close: f64, sma: Option<f64>) -> Trend {
        match sma {
            None => Trend::Neutral,
            Some(sma) if close > sma => Trend::Bullish,
            Some(_) => Trend::Bearish,
        }
    }

    /// Binary training label. Defined only for non-Neutral rows.
    pub fn target(self) -> Option<u8> {
        match self {
            Trend::Bullish => Some(1),
            Trend::Bearish => Some(0),
            Trend::Neutral => None,
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// One fully engineered training row. The engine only emits rows whose
/// derived values are all defined, so the derived fields are concrete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<u64>,
    pub sma_50: f64,
    pub trend: Trend,
    pub target: u8,
    pub price_change: f64,
    pub distance_from_sma: f64,
    pub momentum_5d: f64,
    pub volatility_5d: f64,
    pub next_day_target: u8,
}

impl FeatureRow {
    /// Feature columns the quality gate requires in the persisted artifact.
    pub const REQUIRED_FEATURES: [&'static str; 6] = [
        "sma_50",
        "price_change",
        "distance_from_sma",
        "momentum_5d",
        "volatility_5d",
        "target",
    ];
}

/// The canonical training dataset: all tickers' feature rows sorted by
/// (ticker lexical, date ascending). Persisted once per run, never mutated.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub rows: Vec<FeatureRow>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn sort_canonical(&mut self) {
        self.rows
            .sort_by(|a, b| a.ticker.cmp(&b.ticker).then_with(|| a.date.cmp(&b.date)));
    }

    /// Share of rows labeled Bullish, in percent. `None` on an empty set.
    pub fn bullish_pct(&self) -> Option<f64> {
        if self.rows.is_empty() {
            return None;
        }
        let bullish = self.rows.iter().filter(|r| r.target == 1).count();
        Some(bullish as f64 / self.rows.len() as f64 * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_close_above_sma_is_bullish() {
        assert_eq!(Trend::classify(105.0, Some(100.0)), Trend::Bullish);
    }

    #[test]
    fn test_classify_close_at_or_below_sma_is_bearish() {
        assert_eq!(Trend::classify(95.0, Some(100.0)), Trend::Bearish);
        // Equality is not "above"
        assert_eq!(Trend::classify(100.0, Some(100.0)), Trend::Bearish);
    }

    #[test]
    fn test_classify_missing_sma_is_neutral() {
        assert_eq!(Trend::classify(100.0, None), Trend::Neutral);
        assert_eq!(Trend::Neutral.target(), None);
    }

    #[test]
    fn test_target_labels() {
        assert_eq!(Trend::Bullish.target(), Some(1));
        assert_eq!(Trend::Bearish.target(), Some(0));
    }
}
