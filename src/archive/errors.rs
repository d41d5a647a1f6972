use std::io;
use std::path::PathBuf;

/// Alias for `Result<T, ArchiveError>`.
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Possible errors from an [`Archive`](super::Archive) or one of its
/// [entries](super::Entry).
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum ArchiveError {
    /// The archive itself is unreadable due to not existing,
    /// unsupported format, or malformed state.
    ///
    /// Path is [`None`] when the archive was opened from bytes or a reader.
    #[error("[UnreadableArchive - `{path:?}`]: {source}")]
    UnreadableArchive {
        /// The root cause of this error.
        source: io::Error,
        /// The path responsible for triggering the error, if applicable.
        path: Option<PathBuf>,
    },

    /// No entry exists at the requested path.
    #[error("[EntryNotFound - `{path}`]: No such entry within the archive")]
    EntryNotFound {
        /// The requested path.
        path: String,
    },

    /// The requested path escapes the root of the archive or is otherwise unusable.
    #[error("[InvalidEntryPath - `{path}`]: Path must stay within the archive")]
    InvalidEntryPath {
        /// The requested path.
        path: String,
    },

    /// The entry exists, although is unable to be read, typically I/O.
    #[error("[CannotRead - `{path}`]: {source}")]
    CannotRead {
        /// The root cause of the error.
        source: io::Error,
        /// The path of the entry responsible for triggering the error.
        path: String,
    },

    /// The archive was closed, invalidating all its entries.
    #[error("[Closed]: The archive is closed")]
    Closed,

    /// The requested range ends before it starts.
    #[error("[RangeNotSatisfiable - `{start}..={end}`]: End of range smaller than start")]
    RangeNotSatisfiable {
        /// The requested start.
        start: i64,
        /// The requested (inclusive) end.
        end: i64,
    },
}

impl ArchiveError {
    pub(crate) fn cannot_read(path: &str, source: impl Into<io::Error>) -> Self {
        Self::CannotRead {
            source: source.into(),
            path: path.to_owned(),
        }
    }
}
