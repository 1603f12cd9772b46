//! Final dataset assembly: concatenation, defensive missing-value drop,
//! canonical ordering.

use crate::domain::errors::PipelineError;
use crate::domain::features::{Dataset, FeatureRow};
use tracing::{info, warn};

/// Assembles the engineered rows into the canonical dataset.
///
/// The feature engine already guarantees complete derived values; the
/// remaining gaps are raw fields that never resolved (e.g. a source that
/// carried no Volume series). Those rows are dropped here, matching the
/// final whole-row drop of the reference output. An empty result is
/// fatal: there is nothing to train on.
pub fn assemble(rows: Vec<FeatureRow>) -> Result<Dataset, PipelineError> {
    let before = rows.len();
    let complete: Vec<FeatureRow> = rows.into_iter().filter(is_complete).collect();

    let dropped = before - complete.len();
    if dropped > 0 {
        warn!("Dropped {} rows with incomplete raw fields at assembly", dropped);
    }

    if complete.is_empty() {
        return Err(PipelineError::EmptyDataset {
            stage: "assemble_dataset".to_string(),
        });
    }

    let mut dataset = Dataset { rows: complete };
    dataset.sort_canonical();

    info!("Total engineered features: {} rows", dataset.len());
    Ok(dataset)
}

fn is_complete(row: &FeatureRow) -> bool {
    row.open.is_some() && row.high.is_some() && row.low.is_some() && row.volume.is_some()
}
