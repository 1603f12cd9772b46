//! Raw source file discovery and loading.
//!
//! Per-ticker price files live in one raw directory, named
//! `stock_data_<TICKER>.csv` or `stock_data_<TICKER>.json`. A file that
//! cannot be parsed into the expected shape is skipped with a warning;
//! loading always continues with the remaining files.

pub mod csv_source;
pub mod json_source;

use crate::domain::bar::RawTable;
use crate::domain::errors::SourceFormatError;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const FILE_PREFIX: &str = "stock_data_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Csv,
    Json,
}

impl SourceKind {
    fn extension(self) -> &'static str {
        match self {
            SourceKind::Csv => "csv",
            SourceKind::Json => "json",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Csv => write!(f, "CSV"),
            SourceKind::Json => write!(f, "JSON"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub ticker: String,
    pub kind: SourceKind,
}

/// Extracts the ticker symbol from a raw filename, e.g.
/// `stock_data_AAPL.csv` -> `AAPL`. Files outside the naming convention
/// yield `None` and are ignored by discovery.
pub fn ticker_from_filename(name: &str, kind: SourceKind) -> Option<String> {
    let stem = name.strip_prefix(FILE_PREFIX)?;
    let ticker = stem.strip_suffix(&format!(".{}", kind.extension()))?;
    if ticker.is_empty() {
        return None;
    }
    Some(ticker.to_string())
}

/// Lists raw files of one kind in deterministic (filename) order.
pub fn discover(raw_dir: &Path, kind: SourceKind) -> std::io::Result<Vec<SourceFile>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(raw_dir)? {
        let entry = entry?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        match ticker_from_filename(name, kind) {
            Some(ticker) => files.push(SourceFile {
                path,
                ticker,
                kind,
            }),
            None => debug!("Ignoring {} (not a {} source file)", name, kind),
        }
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

/// Loads every source file of one kind under `raw_dir` into a combined
/// un-cleaned table. Files that fail to parse are skipped with a warning;
/// the result may be empty.
pub fn load_all(raw_dir: &Path, kind: SourceKind) -> std::io::Result<RawTable> {
    info!("Loading {} files from {}", kind, raw_dir.display());

    let mut combined = RawTable::new();
    let mut loaded_files = 0usize;

    for source in discover(raw_dir, kind)? {
        let result: Result<RawTable, SourceFormatError> = match kind {
            SourceKind::Csv => csv_source::load_csv_file(&source.path, &source.ticker),
            SourceKind::Json => json_source::load_json_file(&source.path, &source.ticker),
        };

        match result {
            Ok(table) => {
                info!(
                    "Loaded {} rows for {} from {}",
                    table.len(),
                    source.ticker,
                    kind
                );
                combined.merge(table);
                loaded_files += 1;
            }
            Err(e) => {
                warn!("Skipping {}: {}", source.path.display(), e);
            }
        }
    }

    info!(
        "Total {} data: {} rows from {} files",
        kind,
        combined.len(),
        loaded_files
    );
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticker_from_filename() {
        assert_eq!(
            ticker_from_filename("stock_data_AAPL.csv", SourceKind::Csv),
            Some("AAPL".to_string())
        );
        assert_eq!(
            ticker_from_filename("stock_data_BRK-B.json", SourceKind::Json),
            Some("BRK-B".to_string())
        );
    }

    #[test]
    fn test_ticker_from_filename_rejects_other_names() {
        assert_eq!(ticker_from_filename("notes.csv", SourceKind::Csv), None);
        assert_eq!(
            ticker_from_filename("stock_data_.csv", SourceKind::Csv),
            None
        );
        // Wrong extension for the requested kind
        assert_eq!(
            ticker_from_filename("stock_data_AAPL.json", SourceKind::Csv),
            None
        );
    }
}
