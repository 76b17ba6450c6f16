// src/repository/cache.rs

//! On-disk cache of parsed repodata
//!
//! Parsed universes are stored as JSON under the cache directory, one file
//! per (repodata contents, arch) pair. Readers and writers hold an exclusive
//! `flock` on `.rts-cache.lock` so builders sharing a directory serialise
//! instead of racing on half-written files.

use super::RepoFiles;
use crate::error::{Error, Result};
use crate::packages::PackageRecord;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const LOCK_FILE: &str = ".rts-cache.lock";
const CACHE_FORMAT: u32 = 1;

/// Exclusive lock on a cache directory, released on drop
pub struct CacheLock {
    #[allow(dead_code)]
    file: File,
    path: PathBuf,
}

impl CacheLock {
    /// Acquire the lock, blocking until available
    pub fn acquire(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(LOCK_FILE);
        let file = File::create(&path)?;

        file.lock_exclusive()
            .map_err(|e| Error::Cache(format!("Failed to lock {}: {}", path.display(), e)))?;
        debug!("Acquired cache lock at {}", path.display());

        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    format: u32,
    arch: String,
    packages: Vec<PackageRecord>,
}

/// Cache of parsed repodata keyed by content hash and architecture
#[derive(Debug, Clone)]
pub struct RepodataCache {
    dir: PathBuf,
}

impl RepodataCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn lock(&self) -> Result<CacheLock> {
        CacheLock::acquire(&self.dir)
    }

    /// Key derived from the bytes of the three repodata files and the arch
    pub fn key(files: &RepoFiles, arch: &str) -> Result<String> {
        let mut hasher = Sha256::new();
        hasher.update(arch.as_bytes());
        for path in [&files.repomd, &files.primary, &files.filelists] {
            hasher.update([0u8]);
            let mut file = File::open(path).map_err(|e| {
                Error::MissingInput(format!("Cannot open {}: {}", path.display(), e))
            })?;
            io::copy(&mut file, &mut hasher)?;
        }
        Ok(hex::encode(hasher.finalize()))
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Read a cached universe; a stale or unreadable entry counts as a miss
    pub fn load(&self, _lock: &CacheLock, key: &str, arch: &str) -> Result<Option<Vec<PackageRecord>>> {
        let path = self.entry_path(key);
        if !path.exists() {
            debug!("Cache miss for {}", key);
            return Ok(None);
        }

        let reader = BufReader::new(File::open(&path)?);
        match serde_json::from_reader::<_, CacheEntry>(reader) {
            Ok(entry) if entry.format == CACHE_FORMAT && entry.arch == arch => {
                info!(
                    "Loaded {} packages from cache {}",
                    entry.packages.len(),
                    path.display()
                );
                Ok(Some(entry.packages))
            }
            Ok(_) => {
                debug!("Ignoring cache entry {} with other format or arch", key);
                Ok(None)
            }
            Err(e) => {
                warn!("Ignoring unreadable cache entry {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    /// Write a universe to the cache through a temporary file and rename
    pub fn store(&self, _lock: &CacheLock, key: &str, arch: &str, packages: &[PackageRecord]) -> Result<()> {
        let path = self.entry_path(key);
        let tmp = self.dir.join(format!(".{}.tmp", key));

        let entry = CacheEntry {
            format: CACHE_FORMAT,
            arch: arch.to_string(),
            packages: packages.to_vec(),
        };

        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer(&mut writer, &entry)
                .map_err(|e| Error::Cache(format!("Failed to serialize cache entry: {}", e)))?;
            writer.flush()?;
        }
        fs::rename(&tmp, &path)?;

        debug!("Stored {} packages in cache {}", packages.len(), path.display());
        Ok(())
    }
}
