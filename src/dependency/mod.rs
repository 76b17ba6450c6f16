// src/dependency/mod.rs

//! Dependency expression parsing
//!
//! A dependency expression is either a bare capability name (`libfoo`) or a
//! versioned capability (`libfoo >= 1.0`). The version part is split at its
//! first two dots into version, release and epoch fields, and the sense flags
//! the ordering code works with are derived from the comparator and name.

use crate::error::{Error, Result};
use crate::version::RpmVersion;
use rpm::DependencyFlags;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Name prefix that marks rpmlib feature dependencies
const RPMLIB_PREFIX: &str = "rpmlib";

/// Comparison operator of a versioned dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    Equal,
    Greater,
    Less,
    GreaterOrEqual,
    LessOrEqual,
}

impl Comparator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::Greater => ">",
            Self::Less => "<",
            Self::GreaterOrEqual => ">=",
            Self::LessOrEqual => "<=",
        }
    }

    /// Sense flags contributed by this operator
    pub fn flags(&self) -> DependencyFlags {
        let op = self.as_str();
        let mut flags = DependencyFlags::ANY;
        if op.contains('=') {
            flags |= DependencyFlags::EQUAL;
        }
        if op.contains('>') {
            flags |= DependencyFlags::GREATER;
        }
        if op.contains('<') {
            flags |= DependencyFlags::LESS;
        }
        flags
    }

    /// Operator encoded by the sense bits of `flags`, if any
    pub fn from_flags(flags: DependencyFlags) -> Option<Self> {
        let less = flags.contains(DependencyFlags::LESS);
        let greater = flags.contains(DependencyFlags::GREATER);
        let equal = flags.contains(DependencyFlags::EQUAL);
        match (less, greater, equal) {
            (true, false, true) => Some(Self::LessOrEqual),
            (false, true, true) => Some(Self::GreaterOrEqual),
            (true, false, false) => Some(Self::Less),
            (false, true, false) => Some(Self::Greater),
            (false, false, true) => Some(Self::Equal),
            _ => None,
        }
    }
}

impl FromStr for Comparator {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "=" => Ok(Self::Equal),
            ">" => Ok(Self::Greater),
            "<" => Ok(Self::Less),
            ">=" => Ok(Self::GreaterOrEqual),
            "<=" => Ok(Self::LessOrEqual),
            other => Err(format!("unknown comparator '{}'", other)),
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed dependency expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySpecifier {
    pub name: String,
    pub comparator: Option<Comparator>,
    pub version: String,
    pub release: String,
    pub epoch: String,
    pub flags: DependencyFlags,
}

impl DependencySpecifier {
    /// Parse a whitespace-separated dependency expression
    ///
    /// Accepts exactly one token (`name`) or three (`name op version`).
    pub fn parse(expression: &str) -> Result<Self> {
        let tokens: Vec<&str> = expression.split_whitespace().collect();

        let (name, comparator, version_expr) = match tokens.as_slice() {
            [name] => (*name, None, ""),
            [name, op, version] => {
                let comparator = op
                    .parse::<Comparator>()
                    .map_err(|reason| Error::malformed(expression, reason))?;
                (*name, Some(comparator), *version)
            }
            other => {
                return Err(Error::malformed(
                    expression,
                    format!("expected 1 or 3 tokens, found {}", other.len()),
                ));
            }
        };

        let mut parts = version_expr.splitn(3, '.');
        let version = parts.next().unwrap_or_default().to_string();
        let release = parts.next().unwrap_or_default().to_string();
        let epoch = parts.next().unwrap_or_default().to_string();

        let mut flags = comparator.map_or(DependencyFlags::ANY, |c| c.flags());
        if name.starts_with(RPMLIB_PREFIX) {
            flags |= DependencyFlags::RPMLIB;
        }

        Ok(Self {
            name: name.to_string(),
            comparator,
            version,
            release,
            epoch,
            flags,
        })
    }

    /// Rebuild a specifier from one header entry (name, version, flags)
    pub fn from_entry(name: &str, version: &str, flags: DependencyFlags) -> Self {
        let comparator = if version.is_empty() {
            None
        } else {
            Comparator::from_flags(flags)
        };
        let mut parts = version.splitn(3, '.');
        let mut field = || {
            if comparator.is_some() {
                parts.next().unwrap_or_default().to_string()
            } else {
                String::new()
            }
        };
        let (version, release, epoch) = (field(), field(), field());

        Self {
            name: name.to_string(),
            comparator,
            version,
            release,
            epoch,
            flags,
        }
    }

    /// Version fields joined back as `version[.release[.epoch]]`
    pub fn qualified_version(&self) -> String {
        let mut s = self.version.clone();
        if !self.release.is_empty() {
            s.push('.');
            s.push_str(&self.release);
        }
        if !self.epoch.is_empty() {
            s.push('.');
            s.push_str(&self.epoch);
        }
        s
    }

    /// Expression text `name [op version]`, comparable with orderer keys
    pub fn expression(&self) -> String {
        match self.comparator {
            Some(op) => format!("{} {} {}", self.name, op, self.qualified_version()),
            None => self.name.clone(),
        }
    }

    pub fn is_versioned(&self) -> bool {
        self.comparator.is_some()
    }

    /// Whether this name is an rpmlib feature dependency
    pub fn is_rpmlib(&self) -> bool {
        self.flags.contains(DependencyFlags::RPMLIB)
    }

    /// Whether the capability `provided` (with its own flags) satisfies this
    /// requirement
    ///
    /// Names must match exactly. Unversioned requirements or provides always
    /// match; otherwise the two version ranges must overlap.
    pub fn is_satisfied_by(&self, provided: &DependencySpecifier) -> bool {
        if self.name != provided.name {
            return false;
        }
        if !self.is_versioned() || !provided.is_versioned() {
            return true;
        }

        let (Ok(have), Ok(want)) = (
            RpmVersion::parse(&provided.qualified_version()),
            RpmVersion::parse(&self.qualified_version()),
        ) else {
            return false;
        };

        ranges_overlap(provided.flags, &have, self.flags, &want)
    }
}

/// Range overlap test between a provided and a required version
pub(crate) fn ranges_overlap(
    provide_flags: DependencyFlags,
    have: &RpmVersion,
    require_flags: DependencyFlags,
    want: &RpmVersion,
) -> bool {
    let sense = DependencyFlags::LESS | DependencyFlags::GREATER | DependencyFlags::EQUAL;
    let p = provide_flags & sense;
    let r = require_flags & sense;

    match have.match_cmp(want) {
        Ordering::Less => {
            p.contains(DependencyFlags::GREATER) || r.contains(DependencyFlags::LESS)
        }
        Ordering::Greater => {
            p.contains(DependencyFlags::LESS) || r.contains(DependencyFlags::GREATER)
        }
        Ordering::Equal => !(p & r).is_empty(),
    }
}

impl FromStr for DependencySpecifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for DependencySpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression())
    }
}
