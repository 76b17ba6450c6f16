// src/builder.rs

//! Reduced transaction builder
//!
//! Ties the collaborators together for one seed package:
//!
//! 1. load the package universe from the configured repodata
//! 2. locate the seed and register it as a command-line package
//! 3. resolve the install closure of the seed
//! 4. build a reduced header per resolved package and submit it to an orderer
//! 5. order once and read back the keys
//!
//! A missing seed is a normal outcome (`Ok(None)`). Collaborator errors
//! propagate unchanged; nothing is retried.

use crate::config::BuildConfig;
use crate::error::Result;
use crate::header::ReducedHeader;
use crate::repository::{Loader, PackageId, RepodataLoader, Sack};
use crate::resolver::{ClosureResolver, DependencyResolver};
use crate::transaction::{InstallMode, OrderingTransactionSet, TransactionOrderer, TransactionPlan};
use tracing::{debug, info};

/// Builds the reduced transaction set of one seed package
pub struct ReducedTransactionBuilder<L = RepodataLoader, R = ClosureResolver> {
    config: BuildConfig,
    loader: L,
    resolver: R,
}

impl ReducedTransactionBuilder {
    /// Builder using the in-house repodata loader and closure resolver
    pub fn new(config: BuildConfig) -> Self {
        Self::with_collaborators(config, RepodataLoader::new(), ClosureResolver::new())
    }
}

impl<L: Loader, R: DependencyResolver> ReducedTransactionBuilder<L, R> {
    pub fn with_collaborators(config: BuildConfig, loader: L, resolver: R) -> Self {
        Self {
            config,
            loader,
            resolver,
        }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Order the seed's install closure with the in-house orderer
    pub fn build(&self) -> Result<Option<TransactionPlan>> {
        self.build_with(&mut OrderingTransactionSet::new())
    }

    /// Order the seed's install closure with the given orderer
    ///
    /// The orderer must be fresh: every resolved package is added to it and
    /// it is ordered exactly once.
    pub fn build_with<O: TransactionOrderer>(&self, orderer: &mut O) -> Result<Option<TransactionPlan>> {
        let Some(headers) = self.headers()? else {
            return Ok(None);
        };

        for header in headers {
            let key = header.name.clone();
            orderer.add_install(header, &key, InstallMode::Install)?;
        }
        orderer.order()?;

        let plan = TransactionPlan::new(orderer.keys());
        info!("Transaction order has {} packages", plan.len());
        Ok(Some(plan))
    }

    /// Reduced headers of the seed's install closure, in resolver order
    pub fn headers(&self) -> Result<Option<Vec<ReducedHeader>>> {
        let Some((sack, resolved)) = self.resolve()? else {
            return Ok(None);
        };

        let mut headers = Vec::with_capacity(resolved.len());
        for id in resolved {
            let record = sack.package(id)?;
            let header = ReducedHeader::from_record(record)?;
            debug!(
                "Header {}: {} provides, {} requires",
                header.nevra(),
                header.provides.as_ref().map_or(0, |t| t.len()),
                header.requires.as_ref().map_or(0, |t| t.len())
            );
            headers.push(header);
        }
        Ok(Some(headers))
    }

    fn resolve(&self) -> Result<Option<(Sack, Vec<PackageId>)>> {
        let config = &self.config;

        let mut sack = self
            .loader
            .load(&config.repo, &config.cache_dir, &config.arch)?;

        let Some(seed_path) = config.seed.locate()? else {
            info!("No seed package found, nothing to order");
            return Ok(None);
        };

        info!("Universe has {} packages for {}", sack.len(), sack.arch());
        let seed = sack.add_ad_hoc_package(&seed_path)?;
        let resolved = self
            .resolver
            .resolve_install(&sack, seed, config.ignore_weak_deps)?;

        Ok(Some((sack, resolved)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeedSource;
    use crate::error::Error;
    use crate::packages::PackageRecord;
    use crate::repository::RepoFiles;
    use std::path::Path;

    /// Loader returning a fixed universe
    struct FixedLoader(Vec<PackageRecord>);

    impl Loader for FixedLoader {
        fn load(&self, _files: &RepoFiles, _cache_dir: &Path, arch: &str) -> Result<Sack> {
            Ok(Sack::from_records(arch, self.0.clone()))
        }
    }

    struct FailingLoader;

    impl Loader for FailingLoader {
        fn load(&self, files: &RepoFiles, _cache_dir: &Path, _arch: &str) -> Result<Sack> {
            Err(Error::MissingInput(files.primary.display().to_string()))
        }
    }

    /// Resolver returning every package of the universe, seed last
    struct EverythingResolver;

    impl DependencyResolver for EverythingResolver {
        fn resolve_install(&self, sack: &Sack, seed: PackageId, _ignore: bool) -> Result<Vec<PackageId>> {
            let mut ids: Vec<PackageId> = sack.iter().map(|(id, _)| id).filter(|id| *id != seed).collect();
            ids.push(seed);
            Ok(ids)
        }
    }

    /// Orderer recording what it was given
    #[derive(Default)]
    struct RecordingOrderer {
        added: Vec<(String, InstallMode)>,
        orders: usize,
    }

    impl TransactionOrderer for RecordingOrderer {
        fn add_install(&mut self, _header: ReducedHeader, key: &str, mode: InstallMode) -> Result<()> {
            self.added.push((key.to_string(), mode));
            Ok(())
        }

        fn order(&mut self) -> Result<()> {
            self.orders += 1;
            Ok(())
        }

        fn keys(&self) -> Vec<String> {
            self.added.iter().rev().map(|(k, _)| k.clone()).collect()
        }
    }

    fn config(seed: SeedSource) -> BuildConfig {
        BuildConfig::new(RepoFiles::new("repomd.xml", "primary.xml.gz", "filelists.xml.gz"), seed)
    }

    #[test]
    fn test_no_seed_is_not_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let builder = ReducedTransactionBuilder::with_collaborators(
            config(SeedSource::Directory(temp.path().to_path_buf())),
            FixedLoader(vec![PackageRecord::new("a", "1", "1", "noarch")]),
            EverythingResolver,
        );

        assert!(builder.build().unwrap().is_none());
        assert!(builder.headers().unwrap().is_none());
    }

    #[test]
    fn test_loader_failure_propagates() {
        let temp = tempfile::tempdir().unwrap();
        let builder = ReducedTransactionBuilder::with_collaborators(
            config(SeedSource::Directory(temp.path().to_path_buf())),
            FailingLoader,
            EverythingResolver,
        );

        assert!(matches!(builder.build(), Err(Error::MissingInput(_))));
    }

    #[test]
    fn test_missing_seed_package_fails() {
        let temp = tempfile::tempdir().unwrap();
        let builder = ReducedTransactionBuilder::with_collaborators(
            config(SeedSource::Package(temp.path().join("gone.src.rpm"))),
            FixedLoader(Vec::new()),
            EverythingResolver,
        );

        let mut orderer = RecordingOrderer::default();
        assert!(builder.build_with(&mut orderer).is_err());
        assert!(orderer.added.is_empty());
        assert_eq!(orderer.orders, 0);
    }

    #[test]
    fn test_orderer_receives_every_package_once() {
        let temp = tempfile::tempdir().unwrap();
        let seed = temp.path().join("seed-1-1.src.rpm");
        let pkg = rpm::PackageBuilder::new("seed", "1", "MIT", "noarch", "seed package")
            .release("1")
            .requires(rpm::Dependency::any("a"))
            .build()
            .unwrap();
        pkg.write(&mut std::fs::File::create(&seed).unwrap()).unwrap();

        let builder = ReducedTransactionBuilder::with_collaborators(
            config(SeedSource::Package(seed)),
            FixedLoader(vec![
                PackageRecord::new("a", "1", "1", "noarch"),
                PackageRecord::new("b", "1", "1", "noarch"),
            ]),
            EverythingResolver,
        );

        let mut orderer = RecordingOrderer::default();
        let plan = builder.build_with(&mut orderer).unwrap().unwrap();

        assert_eq!(orderer.orders, 1);
        assert_eq!(
            orderer.added,
            vec![
                ("a".to_string(), InstallMode::Install),
                ("b".to_string(), InstallMode::Install),
                ("seed".to_string(), InstallMode::Install),
            ]
        );
        assert_eq!(plan.keys(), ["seed", "b", "a"]);
    }
}
