// src/repository/primary.rs

//! Readers for `primary.xml.gz` and `filelists.xml.gz`
//!
//! Dependency entries (`<rpm:entry name=".." flags="GE" epoch=".." ver=".."
//! rel=".."/>`) are rendered back to `name op [epoch:]version[-release]`
//! expressions, the same text form rpm headers produce.

use super::repomd::attr;
use crate::error::{Error, Result};
use crate::packages::record::format_nevra;
use crate::packages::{PackageRecord, Requirement};
use flate2::read::GzDecoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// Open a metadata file, decompressing `.gz` transparently
pub(crate) fn open_metadata(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).map_err(|e| {
        Error::MissingInput(format!("Cannot open {}: {}", path.display(), e))
    })?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Dependency section of a package's `<format>` block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Provides,
    Requires,
    Recommends,
    Other,
}

impl Section {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"provides" => Some(Self::Provides),
            b"requires" => Some(Self::Requires),
            b"recommends" => Some(Self::Recommends),
            b"conflicts" | b"obsoletes" | b"suggests" | b"supplements" | b"enhances" => {
                Some(Self::Other)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextField {
    Name,
    Arch,
    File,
}

fn xml_error<R>(reader: &Reader<R>, e: quick_xml::Error) -> Error {
    Error::Metadata(format!(
        "Invalid metadata XML at position {}: {}",
        reader.buffer_position(),
        e
    ))
}

fn flags_to_operator(flags: &str) -> Result<&'static str> {
    match flags {
        "EQ" => Ok("="),
        "LT" => Ok("<"),
        "GT" => Ok(">"),
        "LE" => Ok("<="),
        "GE" => Ok(">="),
        other => Err(Error::Metadata(format!(
            "Unknown dependency flags '{}'",
            other
        ))),
    }
}

/// Render an `<rpm:entry>` element as a dependency expression
fn entry_expression(e: &BytesStart<'_>) -> Result<String> {
    let name = attr(e, b"name")?
        .ok_or_else(|| Error::Metadata("Dependency entry without a name".to_string()))?;

    let Some(flags) = attr(e, b"flags")? else {
        return Ok(name);
    };
    let operator = flags_to_operator(&flags)?;

    let mut evr = String::new();
    if let Some(epoch) = attr(e, b"epoch")?
        && !epoch.is_empty()
        && epoch != "0"
    {
        evr.push_str(&epoch);
        evr.push(':');
    }
    evr.push_str(&attr(e, b"ver")?.unwrap_or_default());
    if let Some(rel) = attr(e, b"rel")?
        && !rel.is_empty()
    {
        evr.push('-');
        evr.push_str(&rel);
    }

    Ok(format!("{} {} {}", name, operator, evr))
}

/// Parse primary metadata into package records, in document order
pub fn parse_primary<R: BufRead>(input: R) -> Result<Vec<PackageRecord>> {
    let mut reader = Reader::from_reader(input);
    reader.trim_text(true);

    let mut packages = Vec::new();
    let mut current: Option<PackageRecord> = None;
    let mut section: Option<Section> = None;
    let mut text_field: Option<TextField> = None;
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| xml_error(&reader, e))?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_start = matches!(event, Event::Start(_));
                let tag = e.local_name();
                match tag.as_ref() {
                    b"package" => current = Some(PackageRecord::new("", "", "", "")),
                    b"name" if is_start && current.is_some() && section.is_none() => {
                        text_field = Some(TextField::Name)
                    }
                    b"arch" if is_start && current.is_some() => text_field = Some(TextField::Arch),
                    b"file" if is_start && current.is_some() => text_field = Some(TextField::File),
                    b"version" => {
                        if let Some(pkg) = current.as_mut() {
                            pkg.epoch = attr(e, b"epoch")?.unwrap_or_else(|| "0".to_string());
                            pkg.version = attr(e, b"ver")?.unwrap_or_default();
                            pkg.release = attr(e, b"rel")?.unwrap_or_default();
                        }
                    }
                    b"location" => {
                        if let Some(pkg) = current.as_mut() {
                            pkg.location = attr(e, b"href")?;
                        }
                    }
                    b"entry" => {
                        if let (Some(pkg), Some(sec)) = (current.as_mut(), section) {
                            let expression = entry_expression(e)?;
                            match sec {
                                Section::Provides => pkg.provides.push(expression),
                                Section::Requires => {
                                    let pre = attr(e, b"pre")?
                                        .is_some_and(|v| v == "1" || v == "true");
                                    pkg.requires.push(Requirement { expression, pre });
                                }
                                Section::Recommends => pkg.recommends.push(expression),
                                Section::Other => {}
                            }
                        }
                    }
                    other => {
                        if let Some(sec) = Section::from_tag(other)
                            && is_start
                        {
                            section = Some(sec);
                        }
                    }
                }
            }
            Event::Text(ref t) => {
                if let (Some(field), Some(pkg)) = (text_field, current.as_mut()) {
                    let text = t.unescape().map_err(|e| xml_error(&reader, e))?.to_string();
                    match field {
                        TextField::Name => pkg.name = text,
                        TextField::Arch => pkg.arch = text,
                        TextField::File => pkg.files.push(text),
                    }
                }
            }
            Event::End(ref e) => {
                text_field = None;
                let tag = e.local_name();
                if tag.as_ref() == b"package" {
                    if let Some(pkg) = current.take() {
                        if pkg.name.is_empty() {
                            return Err(Error::Metadata(
                                "Package entry without a name".to_string(),
                            ));
                        }
                        packages.push(pkg);
                    }
                } else if Section::from_tag(tag.as_ref()).is_some() {
                    section = None;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    debug!("Parsed {} packages from primary metadata", packages.len());
    Ok(packages)
}

/// Parse file lists, keyed by package NEVRA
pub fn parse_filelists<R: BufRead>(input: R) -> Result<HashMap<String, Vec<String>>> {
    let mut reader = Reader::from_reader(input);
    reader.trim_text(true);

    let mut lists = HashMap::new();
    let mut name = String::new();
    let mut arch = String::new();
    let mut files: Vec<String> = Vec::new();
    let mut key: Option<String> = None;
    let mut in_file = false;
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| xml_error(&reader, e))?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => match e.local_name().as_ref() {
                b"package" => {
                    name = attr(e, b"name")?.unwrap_or_default();
                    arch = attr(e, b"arch")?.unwrap_or_default();
                    files.clear();
                    key = None;
                }
                b"version" => {
                    let epoch = attr(e, b"epoch")?.unwrap_or_else(|| "0".to_string());
                    let ver = attr(e, b"ver")?.unwrap_or_default();
                    let rel = attr(e, b"rel")?.unwrap_or_default();
                    key = Some(format_nevra(&name, &epoch, &ver, &rel, &arch));
                }
                b"file" => in_file = matches!(event, Event::Start(_)),
                _ => {}
            },
            Event::Text(ref t) if in_file => {
                files.push(t.unescape().map_err(|e| xml_error(&reader, e))?.to_string());
            }
            Event::End(ref e) => {
                in_file = false;
                if e.local_name().as_ref() == b"package"
                    && let Some(k) = key.take()
                {
                    lists.insert(k, std::mem::take(&mut files));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    debug!("Parsed file lists for {} packages", lists.len());
    Ok(lists)
}
