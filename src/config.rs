use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Base-directory layout for pipeline artifacts.
///
/// Mirrors the data/raw, data/processed, models convention of the source
/// project. Constructed once and passed into the stages explicitly; core
/// logic never reads the environment on its own.
#[derive(Debug, Clone)]
pub struct DataStorage {
    pub base_dir: PathBuf,
    raw_override: Option<PathBuf>,
    processed_override: Option<PathBuf>,
}

impl DataStorage {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            raw_override: None,
            processed_override: None,
        }
    }

    pub fn with_raw_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.raw_override = Some(dir.into());
        self
    }

    pub fn with_processed_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.processed_override = Some(dir.into());
        self
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.raw_override
            .clone()
            .unwrap_or_else(|| self.base_dir.join("data").join("raw"))
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.processed_override
            .clone()
            .unwrap_or_else(|| self.base_dir.join("data").join("processed"))
    }

    pub fn model_dir(&self) -> PathBuf {
        self.base_dir.join("models")
    }

    pub fn processed_path(&self, filename: &str) -> PathBuf {
        self.processed_dir().join(filename)
    }

    /// Canonical training artifact location.
    pub fn dataset_path(&self) -> PathBuf {
        self.processed_path("training_data.csv")
    }

    /// Quality report written next to the dataset.
    pub fn report_path(&self) -> PathBuf {
        self.processed_path("quality_report.json")
    }
}

/// Rolling-window sizes for the feature engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureParams {
    /// Trailing window for the simple moving average.
    pub sma_period: usize,
    /// Lag for the momentum percentage change.
    pub momentum_period: usize,
    /// Trailing window for the close-price standard deviation.
    pub volatility_period: usize,
}

impl Default for FeatureParams {
    fn default() -> Self {
        Self {
            sma_period: 50,
            momentum_period: 5,
            volatility_period: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub storage: DataStorage,
    pub params: FeatureParams,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let base_dir = env::var("TRENDPIPE_BASE_DIR").unwrap_or_else(|_| ".".to_string());
        let mut storage = DataStorage::new(base_dir);

        if let Ok(raw) = env::var("TRENDPIPE_RAW_DIR") {
            storage = storage.with_raw_dir(raw);
        }
        if let Ok(processed) = env::var("TRENDPIPE_PROCESSED_DIR") {
            storage = storage.with_processed_dir(processed);
        }

        let sma_period = parse_window("SMA_PERIOD", 50)?;
        let momentum_period = parse_window("MOMENTUM_PERIOD", 5)?;
        let volatility_period = parse_window("VOLATILITY_PERIOD", 5)?;

        Ok(Self {
            storage,
            params: FeatureParams {
                sma_period,
                momentum_period,
                volatility_period,
            },
        })
    }

    pub fn with_base_dir(mut self, dir: &Path) -> Self {
        self.storage = DataStorage::new(dir);
        self
    }
}

fn parse_window(var: &str, default: usize) -> Result<usize> {
    let value = env::var(var)
        .unwrap_or_else(|_| default.to_string())
        .parse::<usize>()
        .with_context(|| format!("Invalid {}: must be a positive integer", var))?;
    anyhow::ensure!(value > 0, "Invalid {}: window must be at least 1", var);
    Ok(value)
}
