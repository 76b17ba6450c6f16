// src/commands/order.rs

//! Order command

use super::builder;
use crate::cli::BuildArgs;
use anyhow::{Context, Result};
use rts::OrderingTransactionSet;
use std::path::Path;
use tracing::info;

/// Order the seed's install closure and print or write the plan
///
/// With `nevra` the packages are printed as NEVRAs in install order instead
/// of their keys; a written plan always holds keys.
pub fn cmd_order(args: &BuildArgs, output: Option<&Path>, nevra: bool) -> Result<()> {
    let builder = builder(args)?;

    let mut orderer = OrderingTransactionSet::new();
    let Some(plan) = builder
        .build_with(&mut orderer)
        .context("Failed to build the transaction order")?
    else {
        println!("No seed package found, nothing to order.");
        return Ok(());
    };

    if let Some(path) = output {
        plan.write_to(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote {} keys to {}", plan.len(), path.display());
    }

    if nevra {
        for line in orderer.nevras() {
            println!("{}", line);
        }
    } else if output.is_none() {
        print!("{}", plan);
    }

    Ok(())
}
