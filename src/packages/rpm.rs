// src/packages/rpm.rs

//! RPM header reader for ad hoc (command-line) packages

use crate::error::{Error, Result};
use crate::packages::record::{PackageRecord, Requirement};
use rpm::{Dependency, DependencyFlags, Package};
use std::path::Path;
use tracing::debug;

/// Flags that make a requirement a pre-requirement
fn pre_flags() -> DependencyFlags {
    DependencyFlags::PREREQ | DependencyFlags::SCRIPT_PRE | DependencyFlags::SCRIPT_POST
}

/// Render an rpm dependency as a `name [op version]` expression
pub fn dependency_expression(dep: &Dependency) -> String {
    let operator = flags_to_operator(dep.flags);
    if operator.is_empty() || dep.version.is_empty() {
        dep.name.clone()
    } else {
        format!("{} {} {}", dep.name, operator, dep.version)
    }
}

/// Convert RPM DependencyFlags to constraint operator string
fn flags_to_operator(flags: DependencyFlags) -> &'static str {
    if flags.contains(DependencyFlags::LESS) && flags.contains(DependencyFlags::EQUAL) {
        "<="
    } else if flags.contains(DependencyFlags::GREATER) && flags.contains(DependencyFlags::EQUAL) {
        ">="
    } else if flags.contains(DependencyFlags::LESS) {
        "<"
    } else if flags.contains(DependencyFlags::GREATER) {
        ">"
    } else if flags.contains(DependencyFlags::EQUAL) {
        "="
    } else {
        ""
    }
}

/// Read the header of an RPM file into a package record
pub fn read_package(path: &Path) -> Result<PackageRecord> {
    debug!("Reading RPM header: {}", path.display());

    let pkg = Package::open(path).map_err(|e| {
        Error::Metadata(format!("Failed to parse RPM {}: {}", path.display(), e))
    })?;
    let md = &pkg.metadata;

    let field = |name: &str, value: std::result::Result<&str, rpm::Error>| {
        value.map(str::to_string).map_err(|e| {
            Error::Metadata(format!(
                "Failed to get package {} from {}: {}",
                name,
                path.display(),
                e
            ))
        })
    };

    let name = field("name", md.get_name())?;
    let version = field("version", md.get_version())?;
    let release = field("release", md.get_release())?;
    // Source packages carry no arch tag of their own
    let arch = md.get_arch().map(str::to_string).unwrap_or_else(|_| "src".to_string());
    let epoch = md.get_epoch().map(|e| e.to_string()).unwrap_or_else(|_| "0".to_string());

    let provides = md
        .get_provides()
        .unwrap_or_default()
        .iter()
        .map(dependency_expression)
        .collect();

    let requires = md
        .get_requires()
        .unwrap_or_default()
        .iter()
        .map(|dep| Requirement {
            expression: dependency_expression(dep),
            pre: dep.flags.intersects(pre_flags()),
        })
        .collect();

    let recommends = md
        .get_recommends()
        .unwrap_or_default()
        .iter()
        .map(dependency_expression)
        .collect();

    let files = md
        .get_file_paths()
        .unwrap_or_default()
        .into_iter()
        .map(|p| p.to_string_lossy().to_string())
        .collect();

    let record = PackageRecord {
        name,
        version,
        release,
        epoch,
        arch,
        provides,
        requires,
        recommends,
        files,
        location: Some(path.display().to_string()),
    };

    debug!(
        "Read RPM: {} ({} provides, {} requires)",
        record.nevra(),
        record.provides.len(),
        record.requires.len()
    );

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpm::PackageBuilder;

    #[test]
    fn test_dependency_expression() {
        assert_eq!(dependency_expression(&Dependency::any("libfoo")), "libfoo");
        assert_eq!(
            dependency_expression(&Dependency::greater_eq("libfoo", "1.0")),
            "libfoo >= 1.0"
        );
        assert_eq!(
            dependency_expression(&Dependency::less("libfoo", "2")),
            "libfoo < 2"
        );
    }

    #[test]
    fn test_read_built_package() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("seed-1.0-1.src.rpm");

        let pkg = PackageBuilder::new("seed", "1.0", "MIT", "x86_64", "seed package")
            .release("1")
            .requires(Dependency::any("libfoo"))
            .requires(Dependency::greater_eq("libbar", "2.0"))
            .build()
            .unwrap();
        let mut file = std::fs::File::create(&path).unwrap();
        pkg.write(&mut file).unwrap();

        let record = read_package(&path).unwrap();
        assert_eq!(record.name, "seed");
        assert_eq!(record.version, "1.0");
        assert_eq!(record.release, "1");

        let exprs: Vec<&str> = record.requires.iter().map(|r| r.expression.as_str()).collect();
        assert!(exprs.contains(&"libfoo"));
        assert!(exprs.contains(&"libbar >= 2.0"));
    }

    #[test]
    fn test_read_nonexistent_file() {
        let result = read_package(Path::new("/nonexistent/file.rpm"));
        assert!(matches!(result, Err(Error::Metadata(_))));
    }
}
