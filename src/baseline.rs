// src/baseline.rs

//! Baseline plans from complete package files
//!
//! A baseline orders the full headers of a directory of `*.rpm` files, as a
//! real install of those packages would see them. A reduced plan built from
//! repodata is then compared against it.

use crate::error::{Error, Result};
use crate::header::ReducedHeader;
use crate::packages;
use crate::transaction::{InstallMode, OrderingTransactionSet, TransactionOrderer, TransactionPlan};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const PACKAGE_SUFFIX: &str = ".rpm";

/// `*.rpm` files directly inside `dir`, sorted by file name
pub fn package_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::MissingInput(format!(
            "package directory {} does not exist",
            dir.display()
        )));
    }

    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if entry.file_type()?.is_file() && name.ends_with(PACKAGE_SUFFIX) {
            found.push(entry.path());
        }
    }
    found.sort();

    if found.is_empty() {
        return Err(Error::MissingInput(format!(
            "no {} files in {}",
            PACKAGE_SUFFIX,
            dir.display()
        )));
    }
    Ok(found)
}

/// Headers of every package in `dir`, in file name order
pub fn read_headers(dir: &Path) -> Result<Vec<ReducedHeader>> {
    let mut headers = Vec::new();
    for path in package_files(dir)? {
        let record = packages::rpm::read_package(&path)?;
        debug!("Baseline package {} from {}", record.nevra(), path.display());
        headers.push(ReducedHeader::from_record(&record)?);
    }
    Ok(headers)
}

/// Order every package in `dir` with `orderer`, keyed by package name
///
/// The orderer must be fresh. Two files of the same name are
/// `Error::DuplicateKey`.
pub fn order_packages_with<O: TransactionOrderer>(
    dir: &Path,
    orderer: &mut O,
) -> Result<TransactionPlan> {
    let headers = read_headers(dir)?;
    info!(
        "Ordering baseline of {} packages from {}",
        headers.len(),
        dir.display()
    );

    for header in headers {
        let key = header.name.clone();
        orderer.add_install(header, &key, InstallMode::Install)?;
    }
    orderer.order()?;

    Ok(TransactionPlan::new(orderer.keys()))
}

/// Order every package in `dir` with the in-house orderer
pub fn order_packages(dir: &Path) -> Result<TransactionPlan> {
    order_packages_with(dir, &mut OrderingTransactionSet::new())
}
