// src/repository/mod.rs

//! Repository metadata and the package universe
//!
//! This module provides:
//! - Binding of the three repodata files (`repomd.xml`, `primary.xml.gz`,
//!   `filelists.xml.gz`) with fail-fast validation
//! - The [`Loader`] seam and the in-house [`RepodataLoader`]
//! - The [`Sack`], the queryable package universe a resolution runs over
//! - An on-disk cache of parsed repodata, guarded by a file lock

mod cache;
mod loader;
mod primary;
mod repomd;
mod sack;

pub use cache::{CacheLock, RepodataCache};
pub use loader::RepodataLoader;
pub use primary::{parse_filelists, parse_primary};
pub use repomd::RepoMd;
pub use sack::{PackageId, Sack};

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Suffix of the compressed file-list metadata
pub const FILELISTS_SUFFIX: &str = "filelists.xml.gz";
/// Suffix of the compressed primary package metadata
pub const PRIMARY_SUFFIX: &str = "primary.xml.gz";
/// Suffix of the repository index
pub const REPOMD_SUFFIX: &str = ".xml";

/// Loads a package universe from repository metadata
pub trait Loader {
    fn load(&self, files: &RepoFiles, cache_dir: &Path, arch: &str) -> Result<Sack>;
}

/// Role a repository file plays, decided by its file name suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoFileKind {
    RepoMd,
    Filelists,
    Primary,
    Ignored,
}

impl RepoFileKind {
    pub fn classify(file_name: &str) -> Self {
        if file_name.ends_with(REPOMD_SUFFIX) {
            Self::RepoMd
        } else if file_name.ends_with(FILELISTS_SUFFIX) {
            Self::Filelists
        } else if file_name.ends_with(PRIMARY_SUFFIX) {
            Self::Primary
        } else {
            Self::Ignored
        }
    }
}

/// Paths of the three repodata files a universe is loaded from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoFiles {
    pub repomd: PathBuf,
    pub primary: PathBuf,
    pub filelists: PathBuf,
}

impl RepoFiles {
    pub fn new(
        repomd: impl Into<PathBuf>,
        primary: impl Into<PathBuf>,
        filelists: impl Into<PathBuf>,
    ) -> Self {
        Self {
            repomd: repomd.into(),
            primary: primary.into(),
            filelists: filelists.into(),
        }
    }

    /// Bind the repodata files found in a directory
    ///
    /// Every role must be matched by exactly one file; a missing or
    /// duplicated role is an error rather than a silent last-match.
    pub fn discover(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(Error::MissingInput(format!(
                "repository directory {} does not exist",
                dir.display()
            )));
        }

        let mut repomd = Vec::new();
        let mut primary = Vec::new();
        let mut filelists = Vec::new();

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            let file_name = entry.file_name().to_string_lossy().to_string();
            match RepoFileKind::classify(&file_name) {
                RepoFileKind::RepoMd => repomd.push(path),
                RepoFileKind::Filelists => filelists.push(path),
                RepoFileKind::Primary => primary.push(path),
                RepoFileKind::Ignored => debug!("Ignoring repository file {}", file_name),
            }
        }

        let files = Self {
            repomd: single(dir, "repomd index (*.xml)", repomd)?,
            primary: single(dir, "primary metadata (*primary.xml.gz)", primary)?,
            filelists: single(dir, "file lists (*filelists.xml.gz)", filelists)?,
        };
        debug!("Bound repository files: {:?}", files);
        Ok(files)
    }

    /// Check that every bound file exists
    pub fn validate(&self) -> Result<()> {
        for (role, path) in [
            ("repomd index", &self.repomd),
            ("primary metadata", &self.primary),
            ("file lists", &self.filelists),
        ] {
            if !path.is_file() {
                return Err(Error::MissingInput(format!(
                    "{} {} does not exist",
                    role,
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

fn single(dir: &Path, role: &str, mut matches: Vec<PathBuf>) -> Result<PathBuf> {
    match matches.len() {
        0 => Err(Error::MissingInput(format!(
            "no {} in {}",
            role,
            dir.display()
        ))),
        1 => Ok(matches.remove(0)),
        _ => {
            matches.sort();
            Err(Error::AmbiguousInput(format!(
                "{} files match {} in {}: {:?}",
                matches.len(),
                role,
                dir.display(),
                matches
            )))
        }
    }
}
