// tests/common/mod.rs

//! Shared test utilities for integration tests.
//!
//! Builds small rpm-md repositories (repomd.xml plus gzipped primary and
//! filelists) and seed packages inside a temporary directory.

#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use rts::{BuildConfig, RepoFiles, SeedSource};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// One package of a test repository
#[derive(Debug, Clone)]
pub struct RepoPackage {
    name: String,
    version: String,
    release: String,
    epoch: String,
    arch: String,
    provides: Vec<String>,
    requires: Vec<String>,
    recommends: Vec<String>,
    files: Vec<String>,
}

/// `<rpm:entry>` for an optional `(flags, version)` constraint
fn entry(name: &str, constraint: Option<(&str, &str)>, pre: bool) -> String {
    let pre = if pre { r#" pre="1""# } else { "" };
    match constraint {
        Some((flags, ver)) => format!(
            r#"<rpm:entry name="{}" flags="{}" epoch="0" ver="{}"{}/>"#,
            name, flags, ver, pre
        ),
        None => format!(r#"<rpm:entry name="{}"{}/>"#, name, pre),
    }
}

impl RepoPackage {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            release: "1".to_string(),
            epoch: "0".to_string(),
            arch: "x86_64".to_string(),
            provides: Vec::new(),
            requires: Vec::new(),
            recommends: Vec::new(),
            files: Vec::new(),
        }
    }

    pub fn arch(mut self, arch: &str) -> Self {
        self.arch = arch.to_string();
        self
    }

    pub fn provides(mut self, name: &str, constraint: Option<(&str, &str)>) -> Self {
        self.provides.push(entry(name, constraint, false));
        self
    }

    pub fn requires(mut self, name: &str, constraint: Option<(&str, &str)>) -> Self {
        self.requires.push(entry(name, constraint, false));
        self
    }

    pub fn pre_requires(mut self, name: &str) -> Self {
        self.requires.push(entry(name, None, true));
        self
    }

    pub fn recommends(mut self, name: &str) -> Self {
        self.recommends.push(entry(name, None, false));
        self
    }

    pub fn file(mut self, path: &str) -> Self {
        self.files.push(path.to_string());
        self
    }

    fn primary_xml(&self) -> String {
        let mut format = String::new();
        for (tag, entries) in [
            ("provides", &self.provides),
            ("requires", &self.requires),
            ("recommends", &self.recommends),
        ] {
            if !entries.is_empty() {
                format.push_str(&format!("<rpm:{}>{}</rpm:{}>", tag, entries.concat(), tag));
            }
        }

        format!(
            r#"<package type="rpm"><name>{name}</name><arch>{arch}</arch><version epoch="{epoch}" ver="{ver}" rel="{rel}"/><location href="Packages/{name}-{ver}-{rel}.{arch}.rpm"/><format>{format}</format></package>"#,
            name = self.name,
            arch = self.arch,
            epoch = self.epoch,
            ver = self.version,
            rel = self.release,
            format = format,
        )
    }

    fn filelists_xml(&self) -> String {
        let files: String = self
            .files
            .iter()
            .map(|f| format!("<file>{}</file>", f))
            .collect();
        format!(
            r#"<package pkgid="{name}" name="{name}" arch="{arch}"><version epoch="{epoch}" ver="{ver}" rel="{rel}"/>{files}</package>"#,
            name = self.name,
            arch = self.arch,
            epoch = self.epoch,
            ver = self.version,
            rel = self.release,
            files = files,
        )
    }
}

fn write_gz(path: &Path, content: &str) {
    let mut encoder = GzEncoder::new(File::create(path).unwrap(), Compression::default());
    encoder.write_all(content.as_bytes()).unwrap();
    encoder.finish().unwrap();
}

/// Write repodata for `packages` into `dir`
pub fn write_repo(dir: &Path, packages: &[RepoPackage]) -> RepoFiles {
    fs::create_dir_all(dir).unwrap();

    let primary: String = packages.iter().map(RepoPackage::primary_xml).collect();
    let primary = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata xmlns="http://linux.duke.edu/metadata/common" xmlns:rpm="http://linux.duke.edu/metadata/rpm" packages="{}">{}</metadata>"#,
        packages.len(),
        primary
    );

    let filelists: String = packages.iter().map(RepoPackage::filelists_xml).collect();
    let filelists = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<filelists xmlns="http://linux.duke.edu/metadata/filelists" packages="{}">{}</filelists>"#,
        packages.len(),
        filelists
    );

    let repomd = r#"<?xml version="1.0" encoding="UTF-8"?>
<repomd xmlns="http://linux.duke.edu/metadata/repo">
  <revision>1700000000</revision>
  <data type="primary"><location href="repodata/test-primary.xml.gz"/></data>
  <data type="filelists"><location href="repodata/test-filelists.xml.gz"/></data>
</repomd>"#;

    fs::write(dir.join("repomd.xml"), repomd).unwrap();
    write_gz(&dir.join("test-primary.xml.gz"), &primary);
    write_gz(&dir.join("test-filelists.xml.gz"), &filelists);

    RepoFiles::discover(dir).unwrap()
}

/// Write an rpm built with the rpm crate into `dir` as `file_name`
pub fn write_rpm(
    dir: &Path,
    file_name: &str,
    name: &str,
    version: &str,
    provides: Vec<rpm::Dependency>,
    requires: Vec<rpm::Dependency>,
) -> PathBuf {
    fs::create_dir_all(dir).unwrap();

    let mut builder = rpm::PackageBuilder::new(name, version, "MIT", "x86_64", "test package")
        .release("1");
    for dep in provides {
        builder = builder.provides(dep);
    }
    for dep in requires {
        builder = builder.requires(dep);
    }
    let pkg = builder.build().unwrap();

    let path = dir.join(file_name);
    let mut file = File::create(&path).unwrap();
    pkg.write(&mut file).unwrap();
    path
}

/// Write a seed package named `name` requiring `requires` into `dir`
pub fn write_seed(dir: &Path, name: &str, requires: Vec<rpm::Dependency>) -> PathBuf {
    write_rpm(
        dir,
        &format!("{}-1.0-1.src.rpm", name),
        name,
        "1.0",
        Vec::new(),
        requires,
    )
}

/// A repository, seed directory and cache directory under one temp dir
pub struct Workspace {
    pub temp: TempDir,
    pub repo: RepoFiles,
}

impl Workspace {
    pub fn new(packages: &[RepoPackage]) -> Self {
        let temp = tempfile::tempdir().unwrap();
        let repo = write_repo(&temp.path().join("repodata"), packages);
        fs::create_dir_all(temp.path().join("seed")).unwrap();
        Self { temp, repo }
    }

    pub fn seed_dir(&self) -> PathBuf {
        self.temp.path().join("seed")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.temp.path().join("cache")
    }

    pub fn add_seed(&self, name: &str, requires: Vec<rpm::Dependency>) -> PathBuf {
        write_seed(&self.seed_dir(), name, requires)
    }

    pub fn config(&self) -> BuildConfig {
        BuildConfig::new(self.repo.clone(), SeedSource::Directory(self.seed_dir()))
            .with_cache_dir(self.cache_dir())
    }
}
