// src/lib.rs

//! Reduced transaction sets
//!
//! Builds the minimal package metadata needed to reproduce the install
//! order a full resolve-and-order pipeline produces for one seed package
//! added to a repository's package universe.
//!
//! # Architecture
//!
//! - `dependency`: strict parsing of `name [op version]` dependency text
//! - `header`: reduced headers carrying identity and provide/require triples
//! - `repository`: rpm-md repodata loading into a `Sack`, with an on-disk cache
//! - `resolver`: the install closure of the seed
//! - `transaction`: ordering of reduced headers into a `TransactionPlan`
//! - `builder`: the orchestration of all of the above for one seed
//! - `baseline`: plans ordered from complete package files, for comparison

pub mod baseline;
pub mod builder;
pub mod compare;
pub mod config;
pub mod dependency;
mod error;
pub mod header;
pub mod packages;
pub mod repository;
pub mod resolver;
pub mod transaction;
pub mod version;

pub use builder::ReducedTransactionBuilder;
pub use compare::{compare_plans, PlanComparison};
pub use config::{BuildConfig, SeedSource};
pub use dependency::{Comparator, DependencySpecifier};
pub use error::{Error, Result};
pub use header::{DependencyTriple, ReducedHeader};
pub use packages::{PackageRecord, Requirement};
pub use repository::{Loader, PackageId, RepoFiles, RepodataLoader, Sack};
pub use resolver::{ClosureResolver, DependencyResolver};
pub use transaction::{InstallMode, OrderingTransactionSet, TransactionOrderer, TransactionPlan};
pub use version::RpmVersion;
