// src/repository/repomd.rs

//! Repository index (`repomd.xml`) reader

use crate::error::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// One `<data>` entry of the index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoMdData {
    pub data_type: String,
    pub location: Option<String>,
    pub checksum: Option<String>,
}

/// Parsed repository index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoMd {
    pub revision: Option<String>,
    pub data: Vec<RepoMdData>,
}

impl RepoMd {
    pub fn parse_file(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::parse(BufReader::new(file))
            .map_err(|e| Error::Metadata(format!("{}: {}", path.display(), e)))
    }

    pub fn parse<R: std::io::BufRead>(input: R) -> Result<Self> {
        let mut reader = Reader::from_reader(input);
        reader.trim_text(true);

        let mut repomd = RepoMd::default();
        let mut current: Option<RepoMdData> = None;
        let mut text_target: Option<&'static str> = None;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                    b"data" => {
                        let data_type = attr(&e, b"type")?.unwrap_or_default();
                        current = Some(RepoMdData {
                            data_type,
                            ..Default::default()
                        });
                    }
                    b"location" => {
                        if let Some(data) = current.as_mut() {
                            data.location = attr(&e, b"href")?;
                        }
                    }
                    b"revision" => text_target = Some("revision"),
                    b"checksum" if current.is_some() => text_target = Some("checksum"),
                    _ => {}
                },
                Ok(Event::Text(t)) => {
                    let text = t
                        .unescape()
                        .map_err(|e| Error::Metadata(format!("Invalid repomd text: {}", e)))?
                        .to_string();
                    match text_target {
                        Some("revision") => repomd.revision = Some(text),
                        Some("checksum") => {
                            if let Some(data) = current.as_mut() {
                                data.checksum = Some(text);
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Event::End(e)) => {
                    text_target = None;
                    if e.local_name().as_ref() == b"data"
                        && let Some(data) = current.take()
                    {
                        repomd.data.push(data);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::Metadata(format!(
                        "Invalid repomd XML at position {}: {}",
                        reader.buffer_position(),
                        e
                    )));
                }
                _ => {}
            }
            buf.clear();
        }

        Ok(repomd)
    }

    pub fn data(&self, data_type: &str) -> Option<&RepoMdData> {
        self.data.iter().find(|d| d.data_type == data_type)
    }
}

pub(crate) fn attr(e: &quick_xml::events::BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    let attribute = e
        .try_get_attribute(key)
        .map_err(|err| Error::Metadata(format!("Invalid XML attribute: {}", err)))?;
    match attribute {
        Some(a) => {
            let value = a
                .unescape_value()
                .map_err(|err| Error::Metadata(format!("Invalid XML attribute value: {}", err)))?;
            Ok(Some(value.to_string()))
        }
        None => Ok(None),
    }
}
