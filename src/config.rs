// src/config.rs

//! Build configuration
//!
//! A build is described by a [`BuildConfig`]: the three repodata files, where
//! the seed package comes from, the cache directory, the target architecture
//! and whether weak dependencies are ignored. It can be written by hand or
//! loaded from an `rts.toml` file:
//!
//! ```toml
//! [repository]
//! dir = "repodata"
//!
//! [seed]
//! dir = "seed"
//!
//! [build]
//! arch = "x86_64"
//! cache_dir = ".rts-cache"
//! ignore_weak_deps = true
//! ```
//!
//! Relative paths in a file are taken relative to the file's directory.

use crate::error::{Error, Result};
use crate::repository::RepoFiles;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "rts.toml";

/// Default target architecture
pub const DEFAULT_ARCH: &str = "x86_64";

/// Default repodata cache directory
pub const DEFAULT_CACHE_DIR: &str = ".rts-cache";

/// File name suffix of source packages usable as a seed
pub const SEED_SUFFIX: &str = ".src.rpm";

/// Where the seed package comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedSource {
    /// An explicit package file
    Package(PathBuf),
    /// A directory expected to hold at most one source package
    Directory(PathBuf),
}

impl SeedSource {
    /// Find the seed package
    ///
    /// `Ok(None)` means there is nothing to build: the directory holds no
    /// source package. Several candidates are an error.
    pub fn locate(&self) -> Result<Option<PathBuf>> {
        match self {
            Self::Package(path) => {
                if path.is_file() {
                    Ok(Some(path.clone()))
                } else {
                    Err(Error::MissingInput(format!(
                        "seed package {} does not exist",
                        path.display()
                    )))
                }
            }
            Self::Directory(dir) => {
                if !dir.is_dir() {
                    return Err(Error::MissingInput(format!(
                        "seed directory {} does not exist",
                        dir.display()
                    )));
                }

                let mut found = Vec::new();
                for entry in fs::read_dir(dir)? {
                    let entry = entry?;
                    let name = entry.file_name().to_string_lossy().to_string();
                    if entry.file_type()?.is_file() && name.ends_with(SEED_SUFFIX) {
                        found.push(entry.path());
                    }
                }
                found.sort();

                match found.len() {
                    0 => {
                        debug!("No {} file in {}", SEED_SUFFIX, dir.display());
                        Ok(None)
                    }
                    1 => Ok(found.pop()),
                    n => Err(Error::AmbiguousInput(format!(
                        "{} seed packages in {}: {:?}",
                        n,
                        dir.display(),
                        found
                    ))),
                }
            }
        }
    }
}

/// Everything one builder invocation needs
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub repo: RepoFiles,
    pub seed: SeedSource,
    pub cache_dir: PathBuf,
    pub arch: String,
    pub ignore_weak_deps: bool,
}

impl BuildConfig {
    /// Configuration with default cache directory, arch and weak dependency
    /// handling
    pub fn new(repo: RepoFiles, seed: SeedSource) -> Self {
        Self {
            repo,
            seed,
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            arch: DEFAULT_ARCH.to_string(),
            ignore_weak_deps: true,
        }
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn with_arch(mut self, arch: impl Into<String>) -> Self {
        self.arch = arch.into();
        self
    }

    pub fn with_ignore_weak_deps(mut self, ignore: bool) -> Self {
        self.ignore_weak_deps = ignore;
        self
    }
}

/// `[repository]` section: a directory to scan, or the three files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositorySection {
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub repomd: Option<PathBuf>,
    #[serde(default)]
    pub primary: Option<PathBuf>,
    #[serde(default)]
    pub filelists: Option<PathBuf>,
}

/// `[seed]` section: a package file or a directory holding one
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedSection {
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub package: Option<PathBuf>,
}

/// `[build]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildSection {
    #[serde(default)]
    pub arch: Option<String>,
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    #[serde(default)]
    pub ignore_weak_deps: Option<bool>,
}

/// On-disk configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub repository: RepositorySection,
    #[serde(default)]
    pub seed: SeedSection,
    #[serde(default)]
    pub build: BuildSection,
}

impl FileConfig {
    /// Load a configuration file, resolving relative paths against its
    /// directory
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::parse(&content)?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.relative_to(base))
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    fn relative_to(mut self, base: &Path) -> Self {
        let fix = |p: &mut Option<PathBuf>| {
            if let Some(path) = p
                && path.is_relative()
            {
                *path = base.join(&*path);
            }
        };
        fix(&mut self.repository.dir);
        fix(&mut self.repository.repomd);
        fix(&mut self.repository.primary);
        fix(&mut self.repository.filelists);
        fix(&mut self.seed.dir);
        fix(&mut self.seed.package);
        fix(&mut self.build.cache_dir);
        self
    }

    fn repo_files(&self) -> Result<RepoFiles> {
        let repo = &self.repository;
        let explicit = [&repo.repomd, &repo.primary, &repo.filelists];

        match (&repo.dir, explicit) {
            (Some(_), _) if explicit.iter().any(|p| p.is_some()) => Err(Error::Config(
                "[repository] takes either dir or repomd/primary/filelists, not both".to_string(),
            )),
            (Some(dir), _) => RepoFiles::discover(dir),
            (None, [Some(repomd), Some(primary), Some(filelists)]) => {
                let files = RepoFiles::new(repomd.clone(), primary.clone(), filelists.clone());
                files.validate()?;
                Ok(files)
            }
            (None, _) => Err(Error::Config(
                "[repository] needs dir or all of repomd, primary and filelists".to_string(),
            )),
        }
    }

    fn seed_source(&self) -> Result<SeedSource> {
        match (&self.seed.dir, &self.seed.package) {
            (Some(_), Some(_)) => Err(Error::Config(
                "[seed] takes either dir or package, not both".to_string(),
            )),
            (Some(dir), None) => Ok(SeedSource::Directory(dir.clone())),
            (None, Some(package)) => Ok(SeedSource::Package(package.clone())),
            (None, None) => Err(Error::Config("[seed] needs dir or package".to_string())),
        }
    }

    /// Bind and validate the configured inputs
    pub fn into_build_config(self) -> Result<BuildConfig> {
        let mut config = BuildConfig::new(self.repo_files()?, self.seed_source()?);
        if let Some(arch) = self.build.arch {
            config.arch = arch;
        }
        if let Some(dir) = self.build.cache_dir {
            config.cache_dir = dir;
        }
        if let Some(ignore) = self.build.ignore_weak_deps {
            config.ignore_weak_deps = ignore;
        }
        Ok(config)
    }
}
