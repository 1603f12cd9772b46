use crate::config::{DataStorage, FeatureParams};
use crate::domain::bar::{RawTable, TickerSeries};
use crate::domain::checks::{CheckResult, QualityReport};
use crate::domain::errors::PipelineError;
use crate::domain::features::{Dataset, FeatureRow};

/// Shared state the stages read and write.
///
/// Each slot is the output of exactly one stage; the scheduler guarantees
/// producers run before consumers, so a missing input is a wiring bug and
/// surfaces as `MissingInput` instead of a panic.
#[derive(Debug)]
pub struct PipelineContext {
    pub storage: DataStorage,
    pub params: FeatureParams,

    pub csv_table: Option<RawTable>,
    pub json_table: Option<RawTable>,
    pub combined: Option<RawTable>,
    pub series: Option<Vec<TickerSeries>>,
    pub engineered: Option<Vec<FeatureRow>>,
    pub dataset: Option<Dataset>,

    /// Validation results surfaced along the way, in run order.
    pub checks: Vec<CheckResult>,
    pub quality: Option<QualityReport>,
}

impl PipelineContext {
    pub fn new(storage: DataStorage, params: FeatureParams) -> Self {
        Self {
            storage,
            params,
            csv_table: None,
            json_table: None,
            combined: None,
            series: None,
            engineered: None,
            dataset: None,
            checks: Vec::new(),
            quality: None,
        }
    }

    pub fn take_input<T>(
        slot: &mut Option<T>,
        stage: &str,
        input: &str,
    ) -> Result<T, PipelineError> {
        slot.take().ok_or_else(|| PipelineError::MissingInput {
            stage: stage.to_string(),
            input: input.to_string(),
        })
    }

    pub fn borrow_input<'a, T>(
        slot: &'a Option<T>,
        stage: &str,
        input: &str,
    ) -> Result<&'a T, PipelineError> {
        slot.as_ref().ok_or_else(|| PipelineError::MissingInput {
            stage: stage.to_string(),
            input: input.to_string(),
        })
    }
}
