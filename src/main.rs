// src/main.rs

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Order {
            build,
            output,
            nevra,
        } => {
            commands::cmd_order(&build, output.as_deref(), nevra)?;
        }
        Commands::Headers { build } => {
            commands::cmd_headers(&build)?;
        }
        Commands::Baseline { rpm_dir, output } => {
            commands::cmd_baseline(&rpm_dir, output.as_deref())?;
        }
        Commands::Compare { baseline, result } => {
            if !commands::cmd_compare(&baseline, &result)? {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
