use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Outcome of one data-quality check pass.
///
/// Checks report, they do not abort: a failed result carries enough detail
/// (which check, which column, counts) for the caller to decide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub lines: Vec<String>,
    pub metadata: BTreeMap<String, Value>,
}

impl CheckResult {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            lines: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn ok(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn fail(&mut self, line: impl Into<String>) {
        self.passed = false;
        self.lines.push(format!("ERROR: {}", line.into()));
    }

    pub fn warn(&mut self, line: impl Into<String>) {
        self.lines.push(format!("WARNING: {}", line.into()));
    }

    pub fn meta(&mut self, key: &str, value: impl Into<Value>) {
        self.metadata.insert(key.to_string(), value.into());
    }

    pub fn warnings(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|l| l.starts_with("WARNING:"))
            .map(|l| l.as_str())
            .collect()
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.passed { "passed" } else { "FAILED" };
        writeln!(f, "check '{}' {}", self.name, status)?;
        for line in &self.lines {
            writeln!(f, "  {}", line)?;
        }
        Ok(())
    }
}

/// Structured pass/fail result of the quality gate, persisted as JSON for
/// downstream alerting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub passed: bool,
    pub row_count: usize,
    pub feature_count: usize,
    pub bullish_pct: Option<f64>,
    pub bearish_pct: Option<f64>,
    pub checks: Vec<CheckResult>,
}

impl QualityReport {
    pub fn summary(&self) -> String {
        let failed: Vec<&str> = self
            .checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| c.name.as_str())
            .collect();
        if failed.is_empty() {
            format!("all checks passed over {} rows", self.row_count)
        } else {
            format!("failed checks: {}", failed.join(", "))
        }
    }

    pub fn warnings(&self) -> Vec<&str> {
        self.checks.iter().flat_map(|c| c.warnings()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_flips_passed() {
        let mut check = CheckResult::new("row_count");
        check.ok("dataset contains 10 rows");
        assert!(check.passed);

        check.fail("dataset is empty");
        assert!(!check.passed);
        assert!(check.lines.iter().any(|l| l.starts_with("ERROR:")));
    }

    #[test]
    fn test_warn_does_not_flip_passed() {
        let mut check = CheckResult::new("class_balance");
        check.warn("severe class imbalance detected");
        assert!(check.passed);
        assert_eq!(check.warnings().len(), 1);
    }
}
