// src/resolver/mod.rs

//! Dependency resolution
//!
//! The builder only needs the set of packages an install of the seed pulls
//! in; it never relies on the order the resolver reports them in. The
//! [`DependencyResolver`] trait is that seam. [`ClosureResolver`] is a
//! breadth-first requirement closure, enough for repositories without
//! competing providers; it does not backtrack.

use crate::dependency::DependencySpecifier;
use crate::error::{Error, Result};
use crate::packages::PackageRecord;
use crate::repository::{PackageId, Sack};
use crate::version::RpmVersion;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, info, warn};

/// Computes the packages an install of `seed` requires
pub trait DependencyResolver {
    /// Packages to install, seed included; order is not an install order
    fn resolve_install(
        &self,
        sack: &Sack,
        seed: PackageId,
        ignore_weak_deps: bool,
    ) -> Result<Vec<PackageId>>;
}

/// Breadth-first requirement closure over a sack
#[derive(Debug, Clone, Default)]
pub struct ClosureResolver;

impl ClosureResolver {
    pub fn new() -> Self {
        Self
    }
}

/// Capability and file lookup tables for one sack
///
/// A package provides its own name at its own version, every declared
/// provide, and every file it ships. Provides are parsed once; a lookup
/// compares only the entries sharing the wanted name.
struct ProviderIndex<'a> {
    capabilities: HashMap<String, Vec<(PackageId, DependencySpecifier)>>,
    files: HashMap<&'a str, Vec<PackageId>>,
}

impl<'a> ProviderIndex<'a> {
    fn build(sack: &'a Sack) -> Result<Self> {
        let mut capabilities: HashMap<String, Vec<(PackageId, DependencySpecifier)>> =
            HashMap::new();
        let mut files: HashMap<&'a str, Vec<PackageId>> = HashMap::new();

        for (id, record) in sack.iter() {
            let own = DependencySpecifier::parse(&format!("{} = {}", record.name, record.evr()))?;
            capabilities
                .entry(own.name.clone())
                .or_default()
                .push((id, own));

            for expr in &record.provides {
                let provided = DependencySpecifier::parse(expr)?;
                capabilities
                    .entry(provided.name.clone())
                    .or_default()
                    .push((id, provided));
            }

            for path in &record.files {
                files.entry(path.as_str()).or_default().push(id);
            }
        }

        debug!(
            "Indexed {} capability names and {} file paths",
            capabilities.len(),
            files.len()
        );
        Ok(Self { capabilities, files })
    }

    /// Every package providing `want`, in load order
    fn providers(&self, want: &DependencySpecifier) -> Vec<PackageId> {
        let mut found: Vec<PackageId> = self
            .capabilities
            .get(&want.name)
            .into_iter()
            .flatten()
            .filter(|(_, provided)| want.is_satisfied_by(provided))
            .map(|(id, _)| *id)
            .collect();

        if want.name.starts_with('/')
            && let Some(owners) = self.files.get(want.name.as_str())
        {
            found.extend(owners.iter().copied());
        }

        found.sort_unstable();
        found.dedup();
        found
    }
}

/// Packages chosen so far, in selection order
struct Selection<'a> {
    order: Vec<PackageId>,
    ids: HashSet<PackageId>,
    names: HashSet<&'a str>,
}

impl<'a> Selection<'a> {
    fn new() -> Self {
        Self {
            order: Vec::new(),
            ids: HashSet::new(),
            names: HashSet::new(),
        }
    }

    fn insert(&mut self, id: PackageId, record: &'a PackageRecord) {
        if self.ids.insert(id) {
            self.order.push(id);
            self.names.insert(record.name.as_str());
        }
    }
}

fn record_version(record: &PackageRecord) -> Option<RpmVersion> {
    RpmVersion::parse(&record.evr()).ok()
}

impl ClosureResolver {
    /// Choose a provider among `providers` for the capability `capability`
    ///
    /// Packages named like the capability win, then the highest version,
    /// then load order. Candidates sharing a name with an already selected
    /// package are skipped since both cannot be installed.
    fn best_provider(
        &self,
        sack: &Sack,
        selection: &Selection<'_>,
        providers: &[PackageId],
        capability: &str,
    ) -> Result<Option<PackageId>> {
        let mut best: Option<(PackageId, &PackageRecord)> = None;

        for &id in providers {
            if sack.is_ad_hoc(id) || selection.ids.contains(&id) {
                continue;
            }
            let record = sack.package(id)?;
            if selection.names.contains(record.name.as_str()) {
                continue;
            }

            best = match best {
                Some((_, best_rec)) if prefer(record, best_rec, capability) != Ordering::Greater => {
                    best
                }
                _ => Some((id, record)),
            };
        }

        Ok(best.map(|(id, _)| id))
    }
}

fn prefer(a: &PackageRecord, b: &PackageRecord, capability: &str) -> Ordering {
    let named = (a.name == capability).cmp(&(b.name == capability));
    named.then_with(|| match (record_version(a), record_version(b)) {
        (Some(va), Some(vb)) if a.name == b.name => va.cmp(&vb),
        _ => Ordering::Equal,
    })
}

impl DependencyResolver for ClosureResolver {
    fn resolve_install(
        &self,
        sack: &Sack,
        seed: PackageId,
        ignore_weak_deps: bool,
    ) -> Result<Vec<PackageId>> {
        let seed_record = sack.package(seed)?;
        info!("Resolving install of {}", seed_record.nevra());

        let index = ProviderIndex::build(sack)?;
        let mut selection = Selection::new();
        selection.insert(seed, seed_record);
        let mut queue = VecDeque::from([seed]);

        while let Some(id) = queue.pop_front() {
            let record = sack.package(id)?;

            let strong = record.requires.iter().map(|r| (r.expression.as_str(), false));
            let weak = record
                .recommends
                .iter()
                .filter(|_| !ignore_weak_deps)
                .map(|r| (r.as_str(), true));

            for (expr, is_weak) in strong.chain(weak) {
                let want = DependencySpecifier::parse(expr)?;
                if want.is_rpmlib() {
                    continue;
                }

                let providers = index.providers(&want);
                if providers.iter().any(|p| selection.ids.contains(p)) {
                    continue;
                }

                match self.best_provider(sack, &selection, &providers, &want.name)? {
                    Some(provider) => {
                        let provider_record = sack.package(provider)?;
                        debug!(
                            "{} needs '{}': selecting {}",
                            record.nevra(),
                            expr,
                            provider_record.nevra()
                        );
                        selection.insert(provider, provider_record);
                        queue.push_back(provider);
                    }
                    None if is_weak => {
                        warn!("Skipping weak dependency '{}' of {}", expr, record.nevra());
                    }
                    None => {
                        return Err(Error::Unresolvable {
                            package: record.nevra(),
                            requirement: expr.to_string(),
                        });
                    }
                }
            }
        }

        info!("Resolved {} packages to install", selection.order.len());
        Ok(selection.order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(sack: &Sack, ids: &[PackageId]) -> Vec<String> {
        ids.iter().map(|id| sack.get(*id).unwrap().name.clone()).collect()
    }

    #[test]
    fn test_closure_follows_provides() {
        let mut sack = Sack::new("x86_64");
        sack.add(PackageRecord::new("a", "1.0", "1", "x86_64").with_provide("libfoo = 1.0"));
        sack.add(PackageRecord::new("unrelated", "1", "1", "noarch"));
        let b = sack.add(PackageRecord::new("b", "1", "1", "x86_64").with_require("libfoo"));

        let resolved = ClosureResolver::new().resolve_install(&sack, b, true).unwrap();
        assert_eq!(names(&sack, &resolved), ["b", "a"]);
    }

    #[test]
    fn test_versioned_requirement_picks_matching_provider() {
        let mut sack = Sack::new("x86_64");
        sack.add(PackageRecord::new("old", "1", "1", "noarch").with_provide("api = 1"));
        sack.add(PackageRecord::new("new", "1", "1", "noarch").with_provide("api = 2"));
        let seed = sack.add(PackageRecord::new("s", "1", "1", "noarch").with_require("api >= 2"));

        let resolved = ClosureResolver::new().resolve_install(&sack, seed, true).unwrap();
        assert_eq!(names(&sack, &resolved), ["s", "new"]);
    }

    #[test]
    fn test_highest_version_of_same_name_wins() {
        let mut sack = Sack::new("x86_64");
        sack.add(PackageRecord::new("lib", "1.2", "1", "noarch"));
        let newer = sack.add(PackageRecord::new("lib", "1.10", "1", "noarch"));
        let seed = sack.add(PackageRecord::new("s", "1", "1", "noarch").with_require("lib"));

        let resolved = ClosureResolver::new().resolve_install(&sack, seed, true).unwrap();
        assert_eq!(resolved, vec![seed, newer]);
    }

    #[test]
    fn test_file_requirement() {
        let mut sack = Sack::new("x86_64");
        sack.add(PackageRecord::new("bash", "5", "1", "x86_64").with_file("/bin/sh"));
        let seed = sack.add(PackageRecord::new("s", "1", "1", "noarch").with_pre_require("/bin/sh"));

        let resolved = ClosureResolver::new().resolve_install(&sack, seed, true).unwrap();
        assert_eq!(names(&sack, &resolved), ["s", "bash"]);
    }

    #[test]
    fn test_rpmlib_requirements_skipped() {
        let mut sack = Sack::new("x86_64");
        let seed = sack.add(
            PackageRecord::new("s", "1", "1", "noarch")
                .with_require("rpmlib(CompressedFileNames) <= 3.0.4-1"),
        );

        let resolved = ClosureResolver::new().resolve_install(&sack, seed, true).unwrap();
        assert_eq!(resolved, vec![seed]);
    }

    #[test]
    fn test_unresolvable() {
        let mut sack = Sack::new("x86_64");
        let seed = sack.add(PackageRecord::new("s", "1", "1", "noarch").with_require("missing"));

        let err = ClosureResolver::new().resolve_install(&sack, seed, true).unwrap_err();
        assert!(matches!(err, Error::Unresolvable { ref requirement, .. } if requirement == "missing"));
    }

    #[test]
    fn test_weak_dependencies() {
        let mut sack = Sack::new("x86_64");
        sack.add(PackageRecord::new("docs", "1", "1", "noarch"));
        let seed = sack.add(
            PackageRecord::new("s", "1", "1", "noarch")
                .with_recommend("docs")
                .with_recommend("absent"),
        );

        let resolver = ClosureResolver::new();
        let ignored = resolver.resolve_install(&sack, seed, true).unwrap();
        assert_eq!(names(&sack, &ignored), ["s"]);

        let followed = resolver.resolve_install(&sack, seed, false).unwrap();
        assert_eq!(names(&sack, &followed), ["s", "docs"]);
    }

    #[test]
    fn test_same_name_as_selected_is_skipped() {
        let mut sack = Sack::new("x86_64");
        sack.add(PackageRecord::new("lib", "1", "1", "noarch").with_provide("api = 1"));
        sack.add(PackageRecord::new("lib", "2", "1", "noarch"));
        let other = sack.add(PackageRecord::new("compat", "1", "1", "noarch").with_provide("api = 1"));
        let seed = sack.add(
            PackageRecord::new("s", "1", "1", "noarch")
                .with_require("lib >= 2")
                .with_require("api"),
        );

        let resolved = ClosureResolver::new().resolve_install(&sack, seed, true).unwrap();
        assert_eq!(names(&sack, &resolved), ["s", "lib", "compat"]);
        assert_eq!(resolved[2], other);
    }

    #[test]
    fn test_large_sack_resolves_quickly() {
        let mut sack = Sack::new("x86_64");
        for i in 0..4000 {
            sack.add(
                PackageRecord::new(format!("noise{}", i), "1", "1", "noarch")
                    .with_provide(format!("noise-cap{} = 1", i))
                    .with_file(format!("/usr/share/noise/{}", i)),
            );
        }
        sack.add(PackageRecord::new("link0", "1", "1", "noarch").with_file("/usr/lib/link0"));
        for i in 1..2000 {
            sack.add(
                PackageRecord::new(format!("link{}", i), "1", "1", "noarch")
                    .with_provide(format!("cap{} = 1", i))
                    .with_require(if i % 2 == 0 {
                        format!("cap{}", i - 1)
                    } else {
                        format!("link{}", i - 1)
                    }),
            );
        }
        sack.add(PackageRecord::new("link1", "0.5", "1", "noarch"));
        let seed = sack.add(
            PackageRecord::new("s", "1", "1", "noarch")
                .with_require("cap1999 >= 1")
                .with_require("link1")
                .with_pre_require("/usr/lib/link0"),
        );

        let started = std::time::Instant::now();
        let resolved = ClosureResolver::new().resolve_install(&sack, seed, true).unwrap();
        let elapsed = started.elapsed();

        assert_eq!(resolved.len(), 2001);
        let names = names(&sack, &resolved);
        assert_eq!(names[0], "s");
        assert!(names.iter().all(|n| !n.starts_with("noise")));
        assert_eq!(names.iter().filter(|n| *n == "link1").count(), 1);
        let link1 = resolved
            .iter()
            .find(|id| sack.get(**id).unwrap().name == "link1")
            .unwrap();
        assert_eq!(sack.get(*link1).unwrap().version, "1");
        assert!(elapsed.as_secs() < 5, "closure took {:?}", elapsed);
    }

    #[test]
    fn test_cycles_terminate() {
        let mut sack = Sack::new("x86_64");
        sack.add(PackageRecord::new("x", "1", "1", "noarch").with_require("y"));
        sack.add(PackageRecord::new("y", "1", "1", "noarch").with_require("x"));
        let seed = sack.add(PackageRecord::new("s", "1", "1", "noarch").with_require("x"));

        let resolved = ClosureResolver::new().resolve_install(&sack, seed, true).unwrap();
        assert_eq!(names(&sack, &resolved), ["s", "x", "y"]);
    }
}
