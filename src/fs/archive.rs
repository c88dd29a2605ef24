//! ZIP encoding and decoding of logical file trees.

use crate::error::Result;
use crate::fs::util::clean_path;
use std::io::{Read, Seek, Write};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Streams files into a ZIP archive.
pub struct ArchiveWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    options: SimpleFileOptions,
    entries: usize,
}

impl<W: Write + Seek> ArchiveWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            zip: ZipWriter::new(writer),
            options: SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .unix_permissions(0o644),
            entries: 0,
        }
    }

    /// Adds a file; `path` is a `/`-separated relative path.
    pub fn add(&mut self, path: &str, content: &[u8]) -> Result<()> {
        self.zip.start_file(path, self.options)?;
        self.zip.write_all(content).map_err(ZipError::from)?;
        self.entries += 1;
        Ok(())
    }

    /// Writes the central directory and returns the underlying writer.
    pub fn finish(self) -> Result<W> {
        log::debug!("Finished ZIP archive with {} files", self.entries);
        Ok(self.zip.finish()?)
    }
}

/// Reads all file entries of an archive as `(path, content)` pairs.
///
/// Directory entries and entries whose names would escape the extraction
/// root are skipped.
pub fn read_entries<R: Read + Seek>(reader: R) -> Result<Vec<(String, Vec<u8>)>> {
    let mut archive = ZipArchive::new(reader)?;
    let mut entries = Vec::with_capacity(archive.len());

    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        if file.is_dir() {
            continue;
        }
        let Some(name) = file.enclosed_name() else {
            log::warn!("Skipping ZIP entry with unsafe name '{}'", file.name());
            continue;
        };
        let path = clean_path(&name.to_string_lossy());
        if path.is_empty() {
            continue;
        }

        let mut content = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
        file.read_to_end(&mut content).map_err(ZipError::from)?;
        entries.push((path, content));
    }

    Ok(entries)
}
