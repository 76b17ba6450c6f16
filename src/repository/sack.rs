// src/repository/sack.rs

//! The package universe

use crate::error::{Error, Result};
use crate::packages::{self, PackageRecord};
use std::fmt;
use std::path::Path;
use tracing::info;

/// Handle to a package inside a [`Sack`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageId(usize);

impl PackageId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Repository packages plus any ad hoc packages added for one resolution
#[derive(Debug, Clone)]
pub struct Sack {
    arch: String,
    packages: Vec<PackageRecord>,
    ad_hoc: Vec<PackageId>,
}

impl Sack {
    pub fn new(arch: impl Into<String>) -> Self {
        Self {
            arch: arch.into(),
            packages: Vec::new(),
            ad_hoc: Vec::new(),
        }
    }

    pub fn from_records(arch: impl Into<String>, records: Vec<PackageRecord>) -> Self {
        Self {
            arch: arch.into(),
            packages: records,
            ad_hoc: Vec::new(),
        }
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }

    pub fn add(&mut self, record: PackageRecord) -> PackageId {
        self.packages.push(record);
        PackageId(self.packages.len() - 1)
    }

    /// Register a package file given on the command line
    pub fn add_ad_hoc_package(&mut self, path: &Path) -> Result<PackageId> {
        let record = packages::rpm::read_package(path)?;
        info!("Added command-line package {}", record.nevra());
        let id = self.add(record);
        self.ad_hoc.push(id);
        Ok(id)
    }

    pub fn get(&self, id: PackageId) -> Option<&PackageRecord> {
        self.packages.get(id.0)
    }

    /// Look up a package, failing for handles from another sack
    pub fn package(&self, id: PackageId) -> Result<&PackageRecord> {
        self.get(id)
            .ok_or_else(|| Error::Metadata(format!("No package with handle {}", id)))
    }

    pub fn is_ad_hoc(&self, id: PackageId) -> bool {
        self.ad_hoc.contains(&id)
    }

    /// All packages with their handles, in load order
    pub fn iter(&self) -> impl Iterator<Item = (PackageId, &PackageRecord)> {
        self.packages
            .iter()
            .enumerate()
            .map(|(i, p)| (PackageId(i), p))
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
