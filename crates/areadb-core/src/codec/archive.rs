// crates/areadb-core/src/codec/archive.rs
//! Zip packing for the shapefile parts.
//!
//! Entries are deflated and stamped with a fixed 1980-01-01 timestamp, so
//! the same input always yields the same archive bytes.

use crate::error::Result;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// One file inside the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipEntry {
    pub name: String,
    pub data: Vec<u8>,
}

impl ZipEntry {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        ZipEntry {
            name: name.into(),
            data,
        }
    }
}

/// Packs `entries` into one zip archive in memory, in the given order.
pub fn zip(entries: &[ZipEntry]) -> Result<Vec<u8>> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for entry in entries {
        writer.start_file(entry.name.as_str(), options)?;
        writer.write_all(&entry.data)?;
    }
    Ok(writer.finish()?.into_inner())
}

/// Reads an archive back into entries, in stored order.
#[cfg(test)]
pub(crate) fn unzip(bytes: &[u8]) -> Vec<ZipEntry> {
    use std::io::Read;

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut data = Vec::new();
            file.read_to_end(&mut data).unwrap();
            ZipEntry::new(file.name(), data)
        })
        .collect()
}
