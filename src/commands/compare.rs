// src/commands/compare.rs

//! Compare command

use anyhow::{Context, Result};
use std::path::Path;

/// Compare a result plan against its baseline
///
/// Returns whether the plans match; a mismatch prints the diff.
pub fn cmd_compare(baseline: &Path, result: &Path) -> Result<bool> {
    let comparison = rts::compare::compare_files(baseline, result).with_context(|| {
        format!(
            "Failed to compare {} with {}",
            baseline.display(),
            result.display()
        )
    })?;

    if comparison.matches() {
        println!("Install order matches {}.", baseline.display());
        return Ok(true);
    }

    let (missing, extra) = comparison.missing_and_extra();
    if !missing.is_empty() {
        println!("Missing from result: {}", missing.join(", "));
    }
    if !extra.is_empty() {
        println!("Not in baseline: {}", extra.join(", "));
    }
    print!("{}", comparison.diff());
    Ok(false)
}
