// src/compare.rs

//! Baseline comparison
//!
//! A plan ordered from reduced headers is checked against a baseline ordered
//! from complete package headers. Both are compared line by line in their
//! one-key-per-line form.

use crate::error::Result;
use crate::transaction::TransactionPlan;
use std::path::Path;

/// Outcome of comparing a result plan against a baseline
#[derive(Debug, Clone)]
pub struct PlanComparison {
    baseline: String,
    result: String,
}

impl PlanComparison {
    /// Whether both plans list the same keys in the same order
    pub fn matches(&self) -> bool {
        self.baseline == self.result
    }

    /// Unified diff from baseline to result, empty when they match
    pub fn diff(&self) -> String {
        if self.matches() {
            return String::new();
        }
        diffy::create_patch(&self.baseline, &self.result).to_string()
    }

    /// Keys present in only one of the two plans
    pub fn missing_and_extra(&self) -> (Vec<&str>, Vec<&str>) {
        let base: Vec<&str> = self.baseline.lines().collect();
        let result: Vec<&str> = self.result.lines().collect();
        let missing = base.iter().copied().filter(|k| !result.contains(k)).collect();
        let extra = result.iter().copied().filter(|k| !base.contains(k)).collect();
        (missing, extra)
    }
}

pub fn compare_plans(baseline: &TransactionPlan, result: &TransactionPlan) -> PlanComparison {
    PlanComparison {
        baseline: baseline.to_lines(),
        result: result.to_lines(),
    }
}

/// Compare two plan files
pub fn compare_files(baseline: &Path, result: &Path) -> Result<PlanComparison> {
    Ok(compare_plans(
        &TransactionPlan::read_from(baseline)?,
        &TransactionPlan::read_from(result)?,
    ))
}
