// src/commands/mod.rs

//! Command implementations for the rts CLI

mod baseline;
mod compare;
mod headers;
mod order;

pub use baseline::cmd_baseline;
pub use compare::cmd_compare;
pub use headers::cmd_headers;
pub use order::cmd_order;

use crate::cli::BuildArgs;
use anyhow::Result;
use rts::{ClosureResolver, ReducedTransactionBuilder, RepodataLoader};

/// Builder over the in-house collaborators, honouring `--no-cache`
fn builder(args: &BuildArgs) -> Result<ReducedTransactionBuilder> {
    let config = args.build_config()?;
    let loader = if args.no_cache {
        RepodataLoader::without_cache()
    } else {
        RepodataLoader::new()
    };
    Ok(ReducedTransactionBuilder::with_collaborators(
        config,
        loader,
        ClosureResolver::new(),
    ))
}
