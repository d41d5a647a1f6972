use crate::archive::errors::{ArchiveError, ArchiveResult};
use crate::archive::{EntryInfo, ReadSeek, copy_range};
use crate::util::sync::Lock;
use crate::util::uri;
use std::collections::HashMap;
use std::io::{self, Write};
use std::ops::Range;
use std::path::Path;
use zip::ZipArchive as Zip;
use zip::result::ZipError;

type Source = Zip<Box<dyn ReadSeek>>;

pub(super) struct ZipArchive {
    // `None` once closed
    zip: Lock<Option<Source>>,
    entries: Vec<EntryInfo>,
    by_path: HashMap<String, usize>,
}

impl ZipArchive {
    /// `reader` (and optional `path` for a more descriptive error message).
    pub(super) fn new(reader: Box<dyn ReadSeek>, path: Option<&Path>) -> ArchiveResult<Self> {
        let unreadable = |error: ZipError| ArchiveError::UnreadableArchive {
            source: io::Error::from(error),
            path: path.map(Path::to_path_buf),
        };
        let mut zip = Zip::new(reader).map_err(unreadable)?;
        let mut entries = Vec::with_capacity(zip.len());

        for index in 0..zip.len() {
            // Raw access avoids failing on encrypted entries
            let file = zip.by_index_raw(index).map_err(unreadable)?;
            if file.is_dir() {
                continue;
            }
            let relative = uri::normalize(file.name().trim_start_matches('/'));
            if relative.is_empty() || relative.starts_with("../") {
                log::warn!("Skipping zip entry outside of the archive root: {}", file.name());
                continue;
            }
            log::trace!("Zip entry #{index}: {relative}");

            entries.push(EntryInfo {
                path: format!("/{relative}"),
                length: file.size(),
                compressed_length: match file.compression() {
                    zip::CompressionMethod::Stored => 0,
                    _ => file.compressed_size(),
                },
                index: Some(index),
            });
        }

        let by_path = entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.path.clone(), position))
            .collect();

        Ok(Self {
            zip: Lock::new(Some(zip)),
            entries,
            by_path,
        })
    }

    pub(super) fn entries(&self) -> Vec<EntryInfo> {
        self.entries.clone()
    }

    pub(super) fn entry(&self, relative: &str) -> ArchiveResult<EntryInfo> {
        let path = format!("/{relative}");

        self.by_path
            .get(&path)
            .map(|&position| self.entries[position].clone())
            .ok_or(ArchiveError::EntryNotFound { path })
    }

    pub(super) fn stream(
        &self,
        entry: &EntryInfo,
        range: Range<u64>,
        writer: &mut dyn Write,
    ) -> ArchiveResult<u64> {
        let mut lock = self.zip.lock().map_err(|_| ArchiveError::Closed)?;
        let zip = lock.as_mut().ok_or(ArchiveError::Closed)?;
        let index = entry.index.ok_or_else(|| ArchiveError::EntryNotFound {
            path: entry.path.clone(),
        })?;
        let mut file = zip
            .by_index(index)
            .map_err(|error| ArchiveError::cannot_read(&entry.path, error))?;

        copy_range(&mut file, range, writer)
            .map_err(|error| ArchiveError::cannot_read(&entry.path, error))
    }

    pub(super) fn close(&self) {
        if let Ok(mut zip) = self.zip.lock() {
            zip.take();
        }
    }
}
