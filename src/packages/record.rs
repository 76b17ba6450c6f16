// src/packages/record.rs

//! Resolved package identity and raw dependency lists

use serde::{Deserialize, Serialize};
use std::fmt;

/// A requirement expression, tagged with whether it must be installed
/// strictly before the requiring package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub expression: String,
    #[serde(default)]
    pub pre: bool,
}

impl Requirement {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            pre: false,
        }
    }

    pub fn pre(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            pre: true,
        }
    }
}

/// A package known to the universe
///
/// Provides and requires are kept as raw dependency expressions in the order
/// the metadata lists them; they are parsed when a header is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub name: String,
    pub version: String,
    pub release: String,
    pub epoch: String,
    pub arch: String,
    #[serde(default)]
    pub provides: Vec<String>,
    #[serde(default)]
    pub requires: Vec<Requirement>,
    /// Weak forward dependencies
    #[serde(default)]
    pub recommends: Vec<String>,
    /// Paths from the file lists
    #[serde(default)]
    pub files: Vec<String>,
    /// Package location relative to the repository root
    #[serde(default)]
    pub location: Option<String>,
}

impl PackageRecord {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        release: impl Into<String>,
        arch: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            release: release.into(),
            epoch: "0".to_string(),
            arch: arch.into(),
            provides: Vec::new(),
            requires: Vec::new(),
            recommends: Vec::new(),
            files: Vec::new(),
            location: None,
        }
    }

    pub fn with_provide(mut self, expression: impl Into<String>) -> Self {
        self.provides.push(expression.into());
        self
    }

    pub fn with_require(mut self, expression: impl Into<String>) -> Self {
        self.requires.push(Requirement::new(expression));
        self
    }

    pub fn with_pre_require(mut self, expression: impl Into<String>) -> Self {
        self.requires.push(Requirement::pre(expression));
        self
    }

    pub fn with_recommend(mut self, expression: impl Into<String>) -> Self {
        self.recommends.push(expression.into());
        self
    }

    pub fn with_file(mut self, path: impl Into<String>) -> Self {
        self.files.push(path.into());
        self
    }

    /// `[epoch:]version-release`, the form rpm uses in dependency entries
    pub fn evr(&self) -> String {
        format_evr(&self.epoch, &self.version, &self.release)
    }

    /// Canonical `name-[epoch:]version-release.arch`
    pub fn nevra(&self) -> String {
        format_nevra(&self.name, &self.epoch, &self.version, &self.release, &self.arch)
    }

    /// Ordinary requirements, in metadata order
    pub fn plain_requires(&self) -> impl Iterator<Item = &str> {
        self.requires
            .iter()
            .filter(|r| !r.pre)
            .map(|r| r.expression.as_str())
    }

    /// Pre-requirements, in metadata order
    pub fn pre_requires(&self) -> impl Iterator<Item = &str> {
        self.requires
            .iter()
            .filter(|r| r.pre)
            .map(|r| r.expression.as_str())
    }
}

/// `[epoch:]version-release`, leaving out a zero or empty epoch
pub fn format_evr(epoch: &str, version: &str, release: &str) -> String {
    if epoch.is_empty() || epoch == "0" {
        format!("{}-{}", version, release)
    } else {
        format!("{}:{}-{}", epoch, version, release)
    }
}

/// `name-[epoch:]version-release.arch`
pub fn format_nevra(name: &str, epoch: &str, version: &str, release: &str, arch: &str) -> String {
    format!("{}-{}.{}", name, format_evr(epoch, version, release), arch)
}

impl fmt::Display for PackageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.nevra())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nevra_omits_zero_epoch() {
        let pkg = PackageRecord::new("bash", "5.2.26", "3.fc40", "x86_64");
        assert_eq!(pkg.nevra(), "bash-5.2.26-3.fc40.x86_64");

        let mut pkg = pkg;
        pkg.epoch = "1".to_string();
        assert_eq!(pkg.evr(), "1:5.2.26-3.fc40");
    }

    #[test]
    fn test_requirement_split() {
        let pkg = PackageRecord::new("c", "1", "1", "noarch")
            .with_require("libfoo")
            .with_pre_require("d")
            .with_require("libbar");

        assert_eq!(pkg.plain_requires().collect::<Vec<_>>(), ["libfoo", "libbar"]);
        assert_eq!(pkg.pre_requires().collect::<Vec<_>>(), ["d"]);
    }
}
