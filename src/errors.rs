//! Error-related types for a [`Publication`](crate::publication::Publication).
//!
//! Each module has its own error type, all of which convert into [`PublicationError`].

pub use crate::archive::{ArchiveError, ArchiveResult};
pub use crate::epub::errors::{EpubError, EpubResult};
pub use crate::fetcher::{ResourceError, ResourceResult};
pub use crate::manifest::{ManifestError, ManifestResult};
pub use crate::mediatype::{MediaTypeError, MediaTypeResult};
pub use crate::parser::XmlError;
pub use crate::util::UtfError;
pub use crate::util::href::{HrefError, HrefResult};
pub use crate::util::url::{UrlError, UrlResult};

/// Alias for `Result<T, PublicationError>`.
pub type PublicationResult<T> = Result<T, PublicationError>;

/// Unified error type.
/// Possible errors when opening a [`Publication`](crate::publication::Publication).
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum PublicationError {
    /// The file is not a supported publication format.
    #[error("[UnsupportedFormat - `{0}`]: Not a supported publication format")]
    UnsupportedFormat(String),

    /// The publication container is unreadable.
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// A resource of the publication is unreadable.
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// The EPUB is malformed.
    #[error(transparent)]
    Epub(#[from] EpubError),

    /// The Readium Web Publication Manifest is malformed.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    MediaType(#[from] MediaTypeError),

    #[error(transparent)]
    Href(#[from] HrefError),

    #[error(transparent)]
    Url(#[from] UrlError),
}

#[cfg(test)]
mod tests {
    use super::{ArchiveError, EpubError, PublicationError};

    #[test]
    fn test_conversions() {
        let error = PublicationError::from(EpubError::NoPackageFound);
        assert!(matches!(error, PublicationError::Epub(EpubError::NoPackageFound)));
        assert_eq!("Missing `package` element", error.to_string());

        let error = PublicationError::from(ArchiveError::EntryNotFound {
            path: "/mimetype".to_owned(),
        });
        assert!(matches!(error, PublicationError::Archive(_)));

        let error = PublicationError::UnsupportedFormat("text/plain".to_owned());
        assert_eq!(
            "[UnsupportedFormat - `text/plain`]: Not a supported publication format",
            error.to_string(),
        );
    }
}
