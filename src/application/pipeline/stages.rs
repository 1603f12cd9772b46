//! The concrete ETL stages wired into the standard graph.

use super::context::PipelineContext;
use super::graph::Stage;
use crate::application::extraction::combiner;
use crate::application::quality::gate;
use crate::application::transformation::{assembler, cleaner, feature_engine};
use crate::domain::errors::PipelineError;
use crate::infrastructure::sources::{self, SourceKind};
use crate::infrastructure::storage;
use tracing::{error, info};

pub const EXTRACT_CSV: &str = "extract_csv";
pub const EXTRACT_JSON: &str = "extract_json";
pub const COMBINE: &str = "combine";
pub const CLEAN: &str = "clean";
pub const ENGINEER_FEATURES: &str = "engineer_features";
pub const ASSEMBLE_DATASET: &str = "assemble_dataset";
pub const QUALITY_GATE: &str = "quality_gate";

pub struct ExtractCsv;

impl Stage for ExtractCsv {
    fn name(&self) -> &'static str {
        EXTRACT_CSV
    }

    fn run(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let table = sources::load_all(&ctx.storage.raw_dir(), SourceKind::Csv)?;
        ctx.csv_table = Some(table);
        Ok(())
    }
}

pub struct ExtractJson;

impl Stage for ExtractJson {
    fn name(&self) -> &'static str {
        EXTRACT_JSON
    }

    fn run(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let table = sources::load_all(&ctx.storage.raw_dir(), SourceKind::Json)?;
        ctx.json_table = Some(table);
        Ok(())
    }
}

pub struct Combine;

impl Stage for Combine {
    fn name(&self) -> &'static str {
        COMBINE
    }

    fn deps(&self) -> &'static [&'static str] {
        &[EXTRACT_CSV, EXTRACT_JSON]
    }

    fn run(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let csv = PipelineContext::take_input(&mut ctx.csv_table, COMBINE, EXTRACT_CSV)?;
        let json = PipelineContext::take_input(&mut ctx.json_table, COMBINE, EXTRACT_JSON)?;

        let combined = combiner::combine(csv, json)?;

        // Reported, not fatal: a missing required column aborts at the
        // cleaning stage, null counts are resolved by cleaning itself.
        let check = combiner::validate_combined(&combined);
        if check.passed {
            info!("{}", check);
        } else {
            error!("{}", check);
        }
        ctx.checks.push(check);

        ctx.combined = Some(combined);
        Ok(())
    }
}

pub struct Clean;

impl Stage for Clean {
    fn name(&self) -> &'static str {
        CLEAN
    }

    fn deps(&self) -> &'static [&'static str] {
        &[COMBINE]
    }

    fn run(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let combined = PipelineContext::borrow_input(&ctx.combined, CLEAN, COMBINE)?;
        ctx.series = Some(cleaner::clean(combined)?);
        Ok(())
    }
}

pub struct EngineerFeatures;

impl Stage for EngineerFeatures {
    fn name(&self) -> &'static str {
        ENGINEER_FEATURES
    }

    fn deps(&self) -> &'static [&'static str] {
        &[CLEAN]
    }

    fn run(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let series = PipelineContext::borrow_input(&ctx.series, ENGINEER_FEATURES, CLEAN)?;
        ctx.engineered = Some(feature_engine::engineer_all(series, &ctx.params));
        Ok(())
    }
}

pub struct AssembleDataset;

impl Stage for AssembleDataset {
    fn name(&self) -> &'static str {
        ASSEMBLE_DATASET
    }

    fn deps(&self) -> &'static [&'static str] {
        &[ENGINEER_FEATURES]
    }

    fn run(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let rows = PipelineContext::take_input(
            &mut ctx.engineered,
            ASSEMBLE_DATASET,
            ENGINEER_FEATURES,
        )?;

        let dataset = assembler::assemble(rows)?;
        storage::write_dataset(&ctx.storage.dataset_path(), &dataset)?;
        ctx.dataset = Some(dataset);
        Ok(())
    }
}

pub struct QualityGate;

impl Stage for QualityGate {
    fn name(&self) -> &'static str {
        QUALITY_GATE
    }

    fn deps(&self) -> &'static [&'static str] {
        &[ASSEMBLE_DATASET]
    }

    fn run(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        // The gate inspects the persisted artifact, not the typed rows.
        let report = gate::run_gate(&ctx.storage.dataset_path())?;
        storage::write_report(&ctx.storage.report_path(), &report)?;

        for warning in report.warnings() {
            info!("quality gate: {}", warning);
        }

        let failed = !report.passed;
        let summary = report.summary();
        ctx.quality = Some(report);

        if failed {
            // Training must not proceed on a failed gate.
            return Err(PipelineError::QualityGateFailed { summary });
        }
        Ok(())
    }
}
