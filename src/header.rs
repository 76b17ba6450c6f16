// src/header.rs

//! Reduced package headers
//!
//! A reduced header carries only what transaction ordering looks at: the
//! package identity and its provide/require triples (name, version, sense
//! flags). Each triple is index-aligned. A triple whose source list is empty
//! is left out entirely instead of being stored empty, since the orderer
//! treats an absent tag differently from an empty one.

use crate::dependency::DependencySpecifier;
use crate::error::Result;
use crate::packages::record::format_nevra;
use crate::packages::PackageRecord;
use rpm::DependencyFlags;
use serde::{Deserialize, Serialize};

/// Operating system every reduced header targets
pub const HEADER_OS: &str = "linux";

/// Index-aligned names, versions and sense flags of one dependency kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyTriple {
    pub names: Vec<String>,
    pub versions: Vec<String>,
    pub flags: Vec<u32>,
}

impl DependencyTriple {
    fn push(&mut self, spec: &DependencySpecifier, flags: DependencyFlags) {
        self.names.push(spec.name.clone());
        self.versions.push(spec.qualified_version());
        self.flags.push(flags.bits());
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate entries as (name, version, flags)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, DependencyFlags)> {
        self.names
            .iter()
            .zip(&self.versions)
            .zip(&self.flags)
            .map(|((n, v), f)| (n.as_str(), v.as_str(), DependencyFlags::from_bits_truncate(*f)))
    }

    fn into_present(self) -> Option<Self> {
        if self.is_empty() { None } else { Some(self) }
    }
}

/// Minimal header submitted to a transaction orderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReducedHeader {
    pub name: String,
    pub version: String,
    pub release: String,
    pub epoch: String,
    pub arch: String,
    pub os: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub provides: Option<DependencyTriple>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub requires: Option<DependencyTriple>,
}

impl ReducedHeader {
    /// Build the reduced header of a resolved package
    ///
    /// Ordinary requirements come first, then pre-requirements with PREREQ
    /// added to their flags; each group keeps the package's own order.
    pub fn from_record(record: &PackageRecord) -> Result<Self> {
        let mut provides = DependencyTriple::default();
        for expr in &record.provides {
            let spec = DependencySpecifier::parse(expr)?;
            provides.push(&spec, spec.flags);
        }

        let mut requires = DependencyTriple::default();
        for expr in record.plain_requires() {
            let spec = DependencySpecifier::parse(expr)?;
            requires.push(&spec, spec.flags);
        }
        for expr in record.pre_requires() {
            let spec = DependencySpecifier::parse(expr)?;
            requires.push(&spec, spec.flags | DependencyFlags::PREREQ);
        }

        Ok(Self {
            name: record.name.clone(),
            version: record.version.clone(),
            release: record.release.clone(),
            epoch: record.epoch.clone(),
            arch: record.arch.clone(),
            os: HEADER_OS.to_string(),
            provides: provides.into_present(),
            requires: requires.into_present(),
        })
    }

    /// `name-[epoch:]version-release.arch`
    pub fn nevra(&self) -> String {
        format_nevra(&self.name, &self.epoch, &self.version, &self.release, &self.arch)
    }

    /// Provide entries, empty when the tag is absent
    pub fn provide_entries(&self) -> impl Iterator<Item = (&str, &str, DependencyFlags)> {
        self.provides.iter().flat_map(|t| t.iter())
    }

    /// Require entries, empty when the tag is absent
    pub fn require_entries(&self) -> impl Iterator<Item = (&str, &str, DependencyFlags)> {
        self.requires.iter().flat_map(|t| t.iter())
    }
}
