// src/cli/mod.rs

//! CLI definitions for the reduced transaction set builder
//!
//! Command implementations live in the `commands` module.
//!
//! - `order` - Order the install closure of a seed package
//! - `headers` - Print the reduced headers of the closure as JSON
//! - `baseline` - Order a directory of complete package files
//! - `compare` - Compare a result plan against a baseline

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rts::config::{DEFAULT_CONFIG_FILE, FileConfig};
use rts::BuildConfig;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "rts")]
#[command(version)]
#[command(about = "Build reduced transaction sets and check their install order", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Order the install closure of a seed package
    Order {
        #[command(flatten)]
        build: BuildArgs,

        /// Write the plan to this file, one key per line
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the NEVRA of each package in install order
        #[arg(long)]
        nevra: bool,
    },

    /// Print the reduced headers of a seed package's install closure
    Headers {
        #[command(flatten)]
        build: BuildArgs,
    },

    /// Order every *.rpm in a directory from its complete headers
    Baseline {
        /// Directory holding the package files
        #[arg(long)]
        rpm_dir: PathBuf,

        /// Write the plan to this file, one key per line
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare a result plan against a baseline plan
    Compare {
        /// Plan ordered from complete package headers
        baseline: PathBuf,

        /// Plan ordered from reduced headers
        result: PathBuf,
    },
}

/// Inputs shared by the building commands
///
/// Flags override values from the configuration file.
#[derive(Args, Debug, Default)]
pub struct BuildArgs {
    /// Configuration file (default: ./rts.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory holding repomd.xml, *primary.xml.gz and *filelists.xml.gz
    #[arg(long, conflicts_with_all = ["repomd", "primary", "filelists"])]
    pub repo_dir: Option<PathBuf>,

    /// Repository index file
    #[arg(long, requires_all = ["primary", "filelists"])]
    pub repomd: Option<PathBuf>,

    /// Primary metadata file
    #[arg(long, requires_all = ["repomd", "filelists"])]
    pub primary: Option<PathBuf>,

    /// File list metadata file
    #[arg(long, requires_all = ["repomd", "primary"])]
    pub filelists: Option<PathBuf>,

    /// Directory holding the seed source package
    #[arg(long, conflicts_with = "seed")]
    pub seed_dir: Option<PathBuf>,

    /// Seed source package
    #[arg(long)]
    pub seed: Option<PathBuf>,

    /// Target architecture
    #[arg(long)]
    pub arch: Option<String>,

    /// Repodata cache directory
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Follow weak dependencies (Recommends)
    #[arg(long)]
    pub weak_deps: bool,

    /// Parse the repodata even when a cached copy exists
    #[arg(long)]
    pub no_cache: bool,
}

impl BuildArgs {
    /// Merge the configuration file with the flags and bind the inputs
    pub fn build_config(&self) -> Result<BuildConfig> {
        let mut file = match &self.config {
            Some(path) => FileConfig::load(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                FileConfig::load(Path::new(DEFAULT_CONFIG_FILE))
                    .with_context(|| format!("Failed to load {}", DEFAULT_CONFIG_FILE))?
            }
            None => FileConfig::default(),
        };

        if let Some(dir) = &self.repo_dir {
            file.repository.dir = Some(dir.clone());
            file.repository.repomd = None;
            file.repository.primary = None;
            file.repository.filelists = None;
        }
        if self.repomd.is_some() {
            file.repository.dir = None;
            file.repository.repomd = self.repomd.clone();
            file.repository.primary = self.primary.clone();
            file.repository.filelists = self.filelists.clone();
        }

        if let Some(dir) = &self.seed_dir {
            file.seed.dir = Some(dir.clone());
            file.seed.package = None;
        }
        if let Some(package) = &self.seed {
            file.seed.dir = None;
            file.seed.package = Some(package.clone());
        }

        if let Some(arch) = &self.arch {
            file.build.arch = Some(arch.clone());
        }
        if let Some(dir) = &self.cache_dir {
            file.build.cache_dir = Some(dir.clone());
        }
        if self.weak_deps {
            file.build.ignore_weak_deps = Some(false);
        }

        Ok(file.into_build_config()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_file() {
        let temp = tempfile::tempdir().unwrap();
        let repo = temp.path().join("repo");
        std::fs::create_dir(&repo).unwrap();
        for name in ["repomd.xml", "a-primary.xml.gz", "a-filelists.xml.gz"] {
            std::fs::write(repo.join(name), b"").unwrap();
        }

        let config = temp.path().join("rts.toml");
        std::fs::write(&config, "[seed]\ndir = \"seed\"\n\n[build]\narch = \"aarch64\"\n").unwrap();

        let args = BuildArgs {
            config: Some(config),
            repo_dir: Some(repo.clone()),
            seed: Some(temp.path().join("x.src.rpm")),
            weak_deps: true,
            ..Default::default()
        };
        let built = args.build_config().unwrap();

        assert_eq!(built.repo.primary, repo.join("a-primary.xml.gz"));
        assert_eq!(built.seed, rts::SeedSource::Package(temp.path().join("x.src.rpm")));
        assert_eq!(built.arch, "aarch64");
        assert!(!built.ignore_weak_deps);
    }

    #[test]
    fn test_parse_order_command() {
        let cli = Cli::try_parse_from([
            "rts", "order", "--repo-dir", "repo", "--seed-dir", "seed", "-o", "plan.txt",
        ])
        .unwrap();
        match cli.command {
            Commands::Order {
                build,
                output,
                nevra,
            } => {
                assert_eq!(build.repo_dir, Some(PathBuf::from("repo")));
                assert_eq!(output, Some(PathBuf::from("plan.txt")));
                assert!(!build.weak_deps);
                assert!(!nevra);
            }
            _ => panic!("expected order"),
        }

        let cli = Cli::try_parse_from(["rts", "order", "--repo-dir", "repo", "--nevra"]).unwrap();
        assert!(matches!(cli.command, Commands::Order { nevra: true, .. }));

        assert!(Cli::try_parse_from(["rts", "order", "--repo-dir", "r", "--repomd", "x"]).is_err());
    }

    #[test]
    fn test_parse_baseline_command() {
        let cli = Cli::try_parse_from(["rts", "baseline", "--rpm-dir", "pkgs", "-o", "base.txt"]).unwrap();
        match cli.command {
            Commands::Baseline { rpm_dir, output } => {
                assert_eq!(rpm_dir, PathBuf::from("pkgs"));
                assert_eq!(output, Some(PathBuf::from("base.txt")));
            }
            _ => panic!("expected baseline"),
        }

        assert!(Cli::try_parse_from(["rts", "baseline"]).is_err());
    }
}
