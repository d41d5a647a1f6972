//! Uniform access to the entries of a ZIP file or an exploded directory.
//!
//! # Overview
//! An [`Archive`] is an immutable set of [entries](Entry) keyed by a clean,
//! forward-slash absolute path (e.g., `/OEBPS/content.opf`).
//! Opening a directory yields an exploded archive, while any other file is read as a ZIP.
//!
//! # Ranges
//! [`Entry::read`] and [`Entry::stream`] accept an inclusive `start..=end` range:
//! - `start = 0, end = 0` selects the entire entry.
//! - A negative `start` is clamped to `0`.
//! - An `end` past the end of the entry is clamped to the last byte.
//! - `end < start` fails with [`ArchiveError::RangeNotSatisfiable`].
//!
//! ```no_run
//! # use rpub::archive::Archive;
//! let archive = Archive::open("childrens-literature.epub").unwrap();
//! let mimetype = archive.entry("/mimetype").unwrap();
//!
//! assert_eq!(b"application", mimetype.read(0, 10).unwrap().as_slice());
//! ```

mod directory;
mod errors;
mod zip;

use crate::archive::directory::DirectoryArchive;
use crate::archive::zip::ZipArchive;
use crate::util::sync::{SendAndSync, Shared};
use crate::util::uri;
use std::fmt::{Debug, Formatter};
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, Write};
use std::ops::Range;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

pub use self::errors::{ArchiveError, ArchiveResult};

/// A readable and seekable source for a ZIP archive.
pub trait ReadSeek: Read + Seek + SendAndSync {}

impl<T: Read + Seek + SendAndSync> ReadSeek for T {}

enum ArchiveKind {
    Zip(ZipArchive),
    Directory(DirectoryArchive),
}

struct ArchiveInner {
    kind: ArchiveKind,
    closed: AtomicBool,
}

/// An immutable, shareable set of [entries](Entry).
///
/// Cloning an [`Archive`] is cheap; all clones share the same underlying source,
/// and [closing](Archive::close) any of them closes them all.
#[derive(Clone)]
pub struct Archive(Shared<ArchiveInner>);

impl Archive {
    /// Opens the archive at `path`.
    ///
    /// A directory is opened as an exploded archive, and any other file as a ZIP.
    ///
    /// # Errors
    /// [`ArchiveError::UnreadableArchive`] if the path does not exist or is not a valid ZIP.
    pub fn open(path: impl AsRef<Path>) -> ArchiveResult<Self> {
        let path = path.as_ref();
        let kind = if path.is_dir() {
            log::debug!("Opening exploded archive: {}", path.display());
            ArchiveKind::Directory(DirectoryArchive::new(path)?)
        } else {
            log::debug!("Opening zip archive: {}", path.display());
            let file = File::open(path).map_err(|source| ArchiveError::UnreadableArchive {
                source,
                path: Some(path.to_path_buf()),
            })?;
            ArchiveKind::Zip(ZipArchive::new(Box::new(BufReader::new(file)), Some(path))?)
        };
        Ok(Self::from_kind(kind))
    }

    /// Reads an in-memory ZIP archive.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> ArchiveResult<Self> {
        Self::from_reader(Cursor::new(bytes.into()))
    }

    /// Reads a ZIP archive from any `reader`.
    pub fn from_reader(reader: impl ReadSeek + 'static) -> ArchiveResult<Self> {
        ZipArchive::new(Box::new(reader), None).map(|zip| Self::from_kind(ArchiveKind::Zip(zip)))
    }

    fn from_kind(kind: ArchiveKind) -> Self {
        Self(Shared::new(ArchiveInner {
            kind,
            closed: AtomicBool::new(false),
        }))
    }

    /// Returns `true` if the archive is an exploded directory.
    pub fn is_exploded(&self) -> bool {
        matches!(self.0.kind, ArchiveKind::Directory(_))
    }

    /// All file entries, in ZIP order or directory-walk order.
    /// Directory entries are never included.
    pub fn entries(&self) -> ArchiveResult<Vec<Entry>> {
        self.ensure_open()?;
        let infos = match &self.0.kind {
            ArchiveKind::Zip(zip) => zip.entries(),
            ArchiveKind::Directory(directory) => directory.entries()?,
        };
        Ok(infos.into_iter().map(|info| self.to_entry(info)).collect())
    }

    /// The entry at `path`, with or without a leading slash.
    ///
    /// # Errors
    /// - [`ArchiveError::InvalidEntryPath`] if `path` escapes the archive root.
    /// - [`ArchiveError::EntryNotFound`] if no file exists at `path`.
    pub fn entry(&self, path: &str) -> ArchiveResult<Entry> {
        self.ensure_open()?;
        let path = clean_path(path)?;
        let info = match &self.0.kind {
            ArchiveKind::Zip(zip) => zip.entry(&path),
            ArchiveKind::Directory(directory) => directory.entry(&path),
        }?;
        Ok(self.to_entry(info))
    }

    /// Closes the archive, invalidating all of its [entries](Entry).
    ///
    /// Closing is idempotent.
    pub fn close(&self) {
        if !self.0.closed.swap(true, Ordering::SeqCst) {
            if let ArchiveKind::Zip(zip) = &self.0.kind {
                zip.close();
            }
        }
    }

    /// Returns `true` once [`Self::close`] is called.
    pub fn is_closed(&self) -> bool {
        self.0.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> ArchiveResult<()> {
        if self.is_closed() {
            Err(ArchiveError::Closed)
        } else {
            Ok(())
        }
    }

    fn to_entry(&self, info: EntryInfo) -> Entry {
        Entry {
            archive: self.clone(),
            info,
        }
    }
}

impl Debug for Archive {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("exploded", &self.is_exploded())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Backend-specific knowledge of an entry.
#[derive(Clone, Debug)]
pub(crate) struct EntryInfo {
    /// Absolute, `/`-prefixed path.
    path: String,
    length: u64,
    compressed_length: u64,
    /// The ZIP index, if applicable.
    index: Option<usize>,
}

/// A file within an [`Archive`].
#[derive(Clone, Debug)]
pub struct Entry {
    archive: Archive,
    info: EntryInfo,
}

impl Entry {
    /// The absolute path to the entry within the archive (e.g., `/EPUB/package.opf`).
    pub fn path(&self) -> &str {
        &self.info.path
    }

    /// The uncompressed data length.
    pub fn length(&self) -> u64 {
        self.info.length
    }

    /// The compressed data length, or `0` if the entry is stored uncompressed.
    pub fn compressed_length(&self) -> u64 {
        self.info.compressed_length
    }

    /// Returns `true` if the entry is stored compressed.
    pub fn is_compressed(&self) -> bool {
        self.info.compressed_length > 0
    }

    /// Reads the inclusive `start..=end` byte range.
    ///
    /// See the [module documentation](self#ranges) for range semantics.
    pub fn read(&self, start: i64, end: i64) -> ArchiveResult<Vec<u8>> {
        let mut data = Vec::new();
        self.stream(&mut data, start, end)?;
        Ok(data)
    }

    /// Writes the inclusive `start..=end` byte range into `writer`,
    /// returning the number of bytes written.
    pub fn stream(&self, writer: &mut dyn Write, start: i64, end: i64) -> ArchiveResult<u64> {
        let range = byte_range(start, end, self.info.length)
            .ok_or(ArchiveError::RangeNotSatisfiable { start, end })?;
        self.archive.ensure_open()?;

        match &self.archive.0.kind {
            ArchiveKind::Zip(zip) => zip.stream(&self.info, range, writer),
            ArchiveKind::Directory(directory) => directory.stream(&self.info, range, writer),
        }
    }
}

/// Resolves an inclusive `start..=end` request against `length` into an exclusive range.
///
/// Returns [`None`] when `end < start`.
pub(crate) fn byte_range(start: i64, end: i64, length: u64) -> Option<Range<u64>> {
    if end < start {
        return None;
    }
    let start = start.max(0) as u64;
    let end = end.max(0) as u64;

    if start == 0 && end == 0 {
        return Some(0..length);
    }
    let end = end.saturating_add(1).min(length);
    Some(start.min(end)..end)
}

/// Skips to `range.start` within `reader` and copies the range into `writer`.
fn copy_range(
    reader: &mut dyn Read,
    range: Range<u64>,
    writer: &mut dyn Write,
) -> io::Result<u64> {
    io::copy(&mut (&mut *reader).take(range.start), &mut io::sink())?;
    io::copy(&mut reader.take(range.end - range.start), writer)
}

/// Cleans `path` into its relative, forward-slash form (without a leading slash).
fn clean_path(path: &str) -> ArchiveResult<String> {
    let separated = path.replace('\\', "/");
    // Normalized as a relative path so that escaping `..` segments are retained
    let relative = uri::normalize(separated.trim_start_matches('/'));

    if relative.is_empty() || relative == ".." || relative.starts_with("../") {
        return Err(ArchiveError::InvalidEntryPath {
            path: path.to_owned(),
        });
    }
    Ok(relative)
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_byte_range() {
        #[rustfmt::skip]
        let expected = [
            (Some(0..20), (0, 0)),
            (Some(0..11), (0, 10)),
            (Some(0..20), (-5, 60)),
            (Some(0..20), (-5, 0)),
            (Some(5..6), (5, 5)),
            (Some(19..20), (19, 100)),
            (Some(20..20), (25, 30)),
            (None, (10, 5)),
        ];

        for (expect, (start, end)) in expected {
            assert_eq!(expect, super::byte_range(start, end, 20), "{start}..={end}");
        }
    }

    #[test]
    fn test_clean_path() {
        #[rustfmt::skip]
        let expected = [
            (Some("mimetype"), "/mimetype"),
            (Some("OEBPS/text/c1.xhtml"), "OEBPS/./text/../text/c1.xhtml"),
            (Some("OEBPS/a b.xhtml"), "\\OEBPS\\a b.xhtml"),
            (None, "../secret"),
            (None, "/OEBPS/../../secret"),
            (None, "/"),
        ];

        for (expect, path) in expected {
            assert_eq!(expect, super::clean_path(path).ok().as_deref(), "{path}");
        }
    }
}
