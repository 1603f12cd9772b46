use crate::domain::bar::Column;
use thiserror::Error;

/// Errors raised while parsing a single raw source file.
///
/// These are recovered locally: the offending file is skipped with a warning
/// and loading continues with the remaining files.
#[derive(Debug, Error)]
pub enum SourceFormatError {
    #[error("{file}: missing required column '{column}' after normalization")]
    MissingColumn { file: String, column: Column },

    #[error("malformed tuple key '{key}': expected \"('<field>', '<ticker>')\"")]
    MalformedKey { key: String },

    #[error("{file}: top-level JSON value is not an object")]
    NotAnObject { file: String },

    #[error("{file}: field '{field}' is not a timestamp-to-value mapping")]
    BadFieldValue { file: String, field: String },

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fatal pipeline-wide errors. Per-file problems never reach this level;
/// anything here aborts the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no rows available at stage '{stage}': nothing to process")]
    EmptyDataset { stage: String },

    #[error("missing required columns: {columns:?}")]
    MissingColumns { columns: Vec<Column> },

    #[error("stage '{stage}' requires output of '{input}', which has not run")]
    MissingInput { stage: String, input: String },

    #[error("quality gate failed: {summary}")]
    QualityGateFailed { summary: String },

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors in the stage-graph definition itself (not in the data).
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("stage '{name}' registered twice")]
    DuplicateStage { name: String },

    #[error("stage '{stage}' depends on unknown stage '{dep}'")]
    UnknownDependency { stage: String, dep: String },

    #[error("unknown stage in selection: '{name}'")]
    UnknownStage { name: String },

    #[error("dependency cycle involving stages {stages:?}")]
    Cycle { stages: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_formatting() {
        let err = SourceFormatError::MissingColumn {
            file: "stock_data_AAPL.csv".to_string(),
            column: Column::Close,
        };

        let msg = err.to_string();
        assert!(msg.contains("stock_data_AAPL.csv"));
        assert!(msg.contains("Close"));
    }

    #[test]
    fn test_cycle_formatting() {
        let err = GraphError::Cycle {
            stages: vec!["combine".to_string(), "clean".to_string()],
        };

        let msg = err.to_string();
        assert!(msg.contains("combine"));
        assert!(msg.contains("clean"));
    }
}
