use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// A publication file written to a temporary directory, removed on drop.
pub struct TestFile {
    _dir: TempDir,
    path: PathBuf,
}

impl TestFile {
    /// Zips `entries` into a file named `name`.
    ///
    /// Entries are stored uncompressed, so that their archive length is their actual length.
    pub fn zip(name: &str, entries: &[(&str, &[u8])]) -> Self {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        for (path, data) in entries {
            zip.start_file(*path, stored).unwrap();
            zip.write_all(data).unwrap();
        }
        let bytes = zip.finish().unwrap().into_inner();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        Self { _dir: dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
