// src/commands/baseline.rs

//! Baseline command

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Order a directory of package files and print or write the plan
pub fn cmd_baseline(rpm_dir: &Path, output: Option<&Path>) -> Result<()> {
    let plan = rts::baseline::order_packages(rpm_dir)
        .with_context(|| format!("Failed to order packages in {}", rpm_dir.display()))?;

    match output {
        Some(path) => {
            plan.write_to(path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote baseline of {} keys to {}", plan.len(), path.display());
        }
        None => print!("{}", plan),
    }

    Ok(())
}
