//! Persistence of pipeline artifacts: the training dataset CSV and the
//! quality report JSON.

use crate::domain::checks::QualityReport;
use crate::domain::errors::PipelineError;
use crate::domain::features::Dataset;
use std::fs::File;
use std::path::Path;
use tracing::info;

fn ensure_parent(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Writes the canonical training artifact with exactly the FeatureRow
/// column set, one row per (ticker, date).
pub fn write_dataset(path: &Path, dataset: &Dataset) -> Result<(), PipelineError> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    for row in &dataset.rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!(
        "Saved training dataset: {} ({} rows)",
        path.display(),
        dataset.len()
    );
    Ok(())
}

pub fn write_report(path: &Path, report: &QualityReport) -> Result<(), PipelineError> {
    ensure_parent(path)?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, report)?;
    info!("Saved quality report: {}", path.display());
    Ok(())
}
