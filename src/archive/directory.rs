use crate::archive::errors::{ArchiveError, ArchiveResult};
use crate::archive::{EntryInfo, copy_range};
use std::fs::File;
use std::io::{self, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub(super) struct DirectoryArchive(PathBuf);

impl DirectoryArchive {
    pub(super) fn new(file: &Path) -> ArchiveResult<Self> {
        match file.canonicalize() {
            Ok(dir) if dir.is_dir() => Ok(Self(dir)),
            Ok(_) => Err(ArchiveError::UnreadableArchive {
                path: Some(file.to_path_buf()),
                source: io::Error::from(io::ErrorKind::NotADirectory),
            }),
            Err(source) => Err(ArchiveError::UnreadableArchive {
                path: Some(file.to_path_buf()),
                source,
            }),
        }
    }

    fn get_path(&self, relative: &str) -> ArchiveResult<PathBuf> {
        let not_found = || ArchiveError::EntryNotFound {
            path: format!("/{relative}"),
        };
        let resolved = self
            .0
            .join(relative)
            .canonicalize()
            .map_err(|_| not_found())?;

        // Path traversal mitigation
        if !resolved.starts_with(&self.0) {
            Err(ArchiveError::InvalidEntryPath {
                path: format!("/{relative}"),
            })
        } else if resolved.is_file() {
            Ok(resolved)
        } else {
            Err(not_found())
        }
    }

    pub(super) fn entry(&self, relative: &str) -> ArchiveResult<EntryInfo> {
        let path = self.get_path(relative)?;
        let metadata = path
            .metadata()
            .map_err(|error| ArchiveError::cannot_read(relative, error))?;

        Ok(EntryInfo {
            path: format!("/{relative}"),
            length: metadata.len(),
            compressed_length: 0,
            index: None,
        })
    }

    pub(super) fn entries(&self) -> ArchiveResult<Vec<EntryInfo>> {
        fn traverse(entries: &mut Vec<EntryInfo>, prefix: &Path, path: &Path) -> ArchiveResult<()> {
            fn unreadable(source: io::Error, path: PathBuf) -> ArchiveError {
                ArchiveError::UnreadableArchive {
                    path: Some(path),
                    source,
                }
            }

            let mut read_dir = path
                .read_dir()
                .map_err(|err| unreadable(err, path.to_path_buf()))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| unreadable(err, path.to_path_buf()))?;
            // Walk in lexical order for a deterministic listing
            read_dir.sort_by_key(|entry| entry.file_name());

            for entry in read_dir {
                let metadata = entry
                    .metadata()
                    .map_err(|err| unreadable(err, entry.path()))?;

                // Symlinks are skipped to avoid path traversal
                if metadata.is_symlink() {
                    continue;
                }

                let path = entry.path();
                if metadata.is_dir() {
                    traverse(entries, prefix, &path)?;
                } else if let Ok(path) = path.strip_prefix(prefix)
                    // Only UTF8 paths are supported.
                    && let Some(utf8_path) = path.to_str()
                {
                    // Enforce forward slashes
                    let value = format!("/{}", utf8_path.replace('\\', "/"));
                    log::trace!("Directory entry: {value}");

                    entries.push(EntryInfo {
                        path: value,
                        length: metadata.len(),
                        compressed_length: 0,
                        index: None,
                    });
                }
            }
            Ok(())
        }

        let mut entries = Vec::new();
        traverse(&mut entries, &self.0, &self.0)?;
        Ok(entries)
    }

    pub(super) fn stream(
        &self,
        entry: &EntryInfo,
        range: Range<u64>,
        writer: &mut dyn Write,
    ) -> ArchiveResult<u64> {
        let path = self.get_path(entry.path.trim_start_matches('/'))?;
        let mut file = File::open(&path).map_err(|error| ArchiveError::cannot_read(&entry.path, error))?;

        copy_range(&mut file, range, writer)
            .map_err(|error| ArchiveError::cannot_read(&entry.path, error))
    }
}
