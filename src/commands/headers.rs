// src/commands/headers.rs

//! Headers command

use super::builder;
use crate::cli::BuildArgs;
use anyhow::{Context, Result};

/// Print the reduced headers of the seed's install closure as JSON
pub fn cmd_headers(args: &BuildArgs) -> Result<()> {
    let builder = builder(args)?;

    let Some(headers) = builder.headers().context("Failed to build reduced headers")? else {
        println!("No seed package found.");
        return Ok(());
    };

    println!("{}", serde_json::to_string_pretty(&headers)?);
    Ok(())
}
