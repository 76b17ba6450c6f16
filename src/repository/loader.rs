// src/repository/loader.rs

//! Repodata loader

use super::cache::RepodataCache;
use super::primary::{open_metadata, parse_filelists, parse_primary};
use super::repomd::RepoMd;
use super::{Loader, RepoFiles, Sack};
use crate::error::Result;
use crate::packages::PackageRecord;
use std::path::Path;
use tracing::{debug, info, warn};

/// Architectures every target accepts
const COMPATIBLE_ARCHES: &[&str] = &["noarch"];

/// Loads a [`Sack`] from rpm-md repodata with an on-disk cache
#[derive(Debug, Clone)]
pub struct RepodataLoader {
    use_cache: bool,
}

impl RepodataLoader {
    pub fn new() -> Self {
        Self { use_cache: true }
    }

    /// Loader that always parses the repodata
    pub fn without_cache() -> Self {
        Self { use_cache: false }
    }

    fn parse(files: &RepoFiles, arch: &str) -> Result<Vec<PackageRecord>> {
        let repomd = RepoMd::parse_file(&files.repomd)?;
        info!(
            "Loading repodata revision {} ({} data entries)",
            repomd.revision.as_deref().unwrap_or("unknown"),
            repomd.data.len()
        );
        for role in ["primary", "filelists"] {
            match repomd.data(role).and_then(|d| d.location.as_deref()) {
                Some(location) => debug!("repomd.xml lists {} data at {}", role, location),
                None => warn!("repomd.xml does not list {} data", role),
            }
        }

        let mut packages = parse_primary(open_metadata(&files.primary)?)?;
        let mut filelists = parse_filelists(open_metadata(&files.filelists)?)?;

        let total = packages.len();
        packages.retain(|p| is_compatible(&p.arch, arch));
        debug!(
            "Kept {} of {} packages compatible with {}",
            packages.len(),
            total,
            arch
        );

        for pkg in &mut packages {
            if let Some(files) = filelists.remove(&pkg.nevra()) {
                pkg.files = files;
            }
        }

        Ok(packages)
    }
}

impl Default for RepodataLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn is_compatible(pkg_arch: &str, target: &str) -> bool {
    pkg_arch == target || COMPATIBLE_ARCHES.contains(&pkg_arch)
}

impl Loader for RepodataLoader {
    fn load(&self, files: &RepoFiles, cache_dir: &Path, arch: &str) -> Result<Sack> {
        files.validate()?;

        if !self.use_cache {
            return Ok(Sack::from_records(arch, Self::parse(files, arch)?));
        }

        let cache = RepodataCache::new(cache_dir);
        let lock = cache.lock()?;
        let key = RepodataCache::key(files, arch)?;
        debug!("Cache entry {} guarded by {}", key, lock.path().display());

        let packages = match cache.load(&lock, &key, arch)? {
            Some(packages) => packages,
            None => {
                let packages = Self::parse(files, arch)?;
                cache.store(&lock, &key, arch, &packages)?;
                packages
            }
        };

        info!("Loaded {} packages for {}", packages.len(), arch);
        Ok(Sack::from_records(arch, packages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_compatible() {
        assert!(is_compatible("x86_64", "x86_64"));
        assert!(is_compatible("noarch", "x86_64"));
        assert!(!is_compatible("aarch64", "x86_64"));
        assert!(!is_compatible("src", "x86_64"));
    }
}
