//! Archive reader: unpacks the embedded archive into named entries.

use std::borrow::Cow;
use std::io::{Cursor, Read};

use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::Result;

/// One named entry extracted from the embedded archive.
///
/// Paths are slash-separated and archive-internal. Directory entries are
/// skipped at read time, so every `ArchiveEntry` carries content. Sessions
/// are small; entries are read fully into memory, no streaming.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    /// Slash-separated path inside the archive.
    pub path: String,
    /// Full entry content.
    pub bytes: Vec<u8>,
}

impl ArchiveEntry {
    /// Returns the entry content as text, replacing invalid UTF-8.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    /// Returns the path component after the last slash.
    pub fn base_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Reads every file entry out of the archive starting at `bytes[0]`.
///
/// Entries are returned in the archive's internal order; that order is the
/// tie-break the classifier relies on. Fails with
/// [`DecodeError::CorruptArchive`](crate::DecodeError::CorruptArchive) when
/// the region is not a well-formed archive.
pub fn read_archive(bytes: &[u8]) -> Result<Vec<ArchiveEntry>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut entries = Vec::with_capacity(archive.len());

    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        if file.is_dir() {
            continue;
        }

        let mut content = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut content).map_err(ZipError::Io)?;

        entries.push(ArchiveEntry {
            path: file.name().to_string(),
            bytes: content,
        });
    }

    tracing::debug!(entry_count = entries.len(), "read embedded archive");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    use super::*;
    use crate::error::DecodeError;

    fn build_archive(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (path, content) in files {
            writer
                .start_file(path.to_string(), SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn reads_entries_in_archive_order() {
        let bytes = build_archive(&[("state.spt", b"zap;"), ("model.pdb", b"ATOM      1")]);
        let entries = read_archive(&bytes).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].path, "state.spt");
        assert_eq!(entries[1].path, "model.pdb");
        assert_eq!(entries[1].bytes, b"ATOM      1");
    }

    #[test]
    fn skips_directory_entries() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .add_directory("nested/", SimpleFileOptions::default())
            .unwrap();
        writer
            .start_file("nested/file.txt", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"content").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let entries = read_archive(&bytes).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "nested/file.txt");
        assert_eq!(entries[0].base_name(), "file.txt");
    }

    #[test]
    fn garbage_region_is_corrupt() {
        let result = read_archive(b"PK\x03\x04 but nothing resembling an archive");
        assert!(matches!(result, Err(DecodeError::CorruptArchive(_))));
    }

    #[test]
    fn lossy_text_access() {
        let bytes = build_archive(&[("blob", &[0x41, 0xFF, 0x42])]);
        let entries = read_archive(&bytes).unwrap();
        assert_eq!(entries[0].text(), "A\u{FFFD}B");
    }
}
