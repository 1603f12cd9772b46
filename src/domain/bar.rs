use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Canonical columns of the raw tabular shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Column {
    Date,
    Open,
    High,
    Low,
    Close,
    Volume,
    Ticker,
}

impl Column {
    /// Maps a raw header name to a canonical column.
    ///
    /// The price-history CSV export mislabels the date column as "Price",
    /// so that header is treated as `Date`. Unknown headers map to `None`
    /// and are ignored by the loaders.
    pub fn from_header(name: &str) -> Option<Self> {
        match name.trim() {
            "Date" | "Price" => Some(Column::Date),
            "Open" => Some(Column::Open),
            "High" => Some(Column::High),
            "Low" => Some(Column::Low),
            "Close" => Some(Column::Close),
            "Volume" => Some(Column::Volume),
            "Ticker" => Some(Column::Ticker),
            _ => None,
        }
    }

    pub const REQUIRED: [Column; 3] = [Column::Date, Column::Close, Column::Ticker];
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// One un-cleaned row as parsed from a raw source file.
///
/// Unparseable or non-numeric source values are coerced to `None` and
/// resolved later: rows missing `date` or `close` are dropped by the
/// cleaning stage, other gaps survive until the assembler's final drop.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBar {
    pub ticker: String,
    pub date: Option<NaiveDate>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

impl RawBar {
    pub fn empty(ticker: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            date: None,
            open: None,
            high: None,
            low: None,
            close: None,
            volume: None,
        }
    }

    pub fn set(&mut self, column: Column, value: f64) {
        match column {
            Column::Open => self.open = Some(value),
            Column::High => self.high = Some(value),
            Column::Low => self.low = Some(value),
            Column::Close => self.close = Some(value),
            Column::Volume => self.volume = Some(value),
            Column::Date | Column::Ticker => {}
        }
    }
}

/// Un-cleaned combined table: rows plus the set of columns actually
/// observed in the sources. The column set drives the missing-column
/// validation check, which a purely typed row cannot express.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub rows: Vec<RawBar>,
    pub columns: BTreeSet<Column>,
}

impl RawTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    /// Columns from `REQUIRED` that this table lacks.
    pub fn missing_required_columns(&self) -> Vec<Column> {
        Column::REQUIRED
            .iter()
            .copied()
            .filter(|c| !self.has_column(*c))
            .collect()
    }

    /// Appends all rows of `other` and unions its column set.
    pub fn merge(&mut self, other: RawTable) {
        self.rows.extend(other.rows);
        self.columns.extend(other.columns);
    }

    /// Stable sort by (ticker lexical, date ascending). Rows with an
    /// unresolvable date sort last within their ticker, where the cleaning
    /// stage picks them off.
    pub fn sort(&mut self) {
        self.rows.sort_by(|a, b| {
            a.ticker
                .cmp(&b.ticker)
                .then_with(|| match (a.date, b.date) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                })
        });
    }

    pub fn tickers(&self) -> Vec<String> {
        let mut tickers: Vec<String> = self.rows.iter().map(|r| r.ticker.clone()).collect();
        tickers.sort();
        tickers.dedup();
        tickers
    }
}

/// One cleaned price bar. By construction `close` is finite and `date`
/// resolved; the remaining fields keep their gaps until assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<u64>,
}

/// Date-ordered series of cleaned bars for one ticker, strictly
/// increasing by date.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerSeries {
    pub ticker: String,
    pub bars: Vec<PriceBar>,
}

impl TickerSeries {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            bars: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}
