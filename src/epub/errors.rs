//! Error-related types for the [EPUB parser](super::EpubParser).

use crate::fetcher::ResourceError;
use crate::parser::XmlError;

/// Alias for `Result<T, EpubError>`.
pub type EpubResult<T> = Result<T, EpubError>;

/// Possible errors while parsing an EPUB.
///
/// # Variants
/// When parsing, error variants flagged with `*` are only raised when
/// [`EpubSettings::strict`](super::EpubSettings::strict) is enabled.
/// Otherwise, the offending element is dropped with a warning.
///
/// ## Container Errors (`container.xml`)
/// Occurs within `/META-INF/container.xml`:
/// - [`NoOpfReference`](EpubError::NoOpfReference)
/// ## OPF (`.opf`) Package Errors
/// Occurs within the package `.opf` file:
/// - [`NoPackageFound`](EpubError::NoPackageFound)
/// - [`InvalidVersion`](EpubError::InvalidVersion)
/// - [`NoMetadataFound`](EpubError::NoMetadataFound)
/// - [`NoManifestFound`](EpubError::NoManifestFound)
/// - [`NoSpineFound`](EpubError::NoSpineFound)
/// - [`MissingAttribute`](EpubError::MissingAttribute)*
/// ## Media Overlay Errors (`.smil`)
/// Occurs within SMIL files:
/// - [`NoSmilFound`](EpubError::NoSmilFound)
/// - [`NoSmilBody`](EpubError::NoSmilBody)
/// - [`EmptySmilBody`](EpubError::EmptySmilBody)
/// - [`MissingElement`](EpubError::MissingElement)
/// - [`MissingAttribute`](EpubError::MissingAttribute)
/// ## General Errors
/// Occurs in any file:
/// - [`Xml`](EpubError::Xml)
/// - [`Resource`](EpubError::Resource)
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum EpubError {
    ////////////////////////////////////////////////////////////////////////////////
    // General
    ////////////////////////////////////////////////////////////////////////////////
    /// A required attribute is missing from an element.
    #[error("Required attribute missing: {0}")]
    MissingAttribute(String),

    /// A required child element is missing.
    #[error("Required element missing: {0}")]
    MissingElement(String),

    /// A file is not well-formed XML.
    #[error(transparent)]
    Xml(#[from] XmlError),

    /// A required file could not be read.
    #[error(transparent)]
    Resource(#[from] ResourceError),

    ////////////////////////////////////////////////////////////////////////////////
    // Within `META-INF/container.xml`
    ////////////////////////////////////////////////////////////////////////////////
    /// The container does not contain a `rootfile` pointing to an `.opf` file.
    ///
    /// Error Source: `META-INF/container.xml`
    #[error("Missing `rootfile` element referencing an `.opf` file in `META-INF/container.xml`")]
    NoOpfReference,

    ////////////////////////////////////////////////////////////////////////////////
    // Package-specific errors
    ////////////////////////////////////////////////////////////////////////////////
    /// The `package` element is not found.
    ///
    /// Error Source: `.opf` file
    #[error("Missing `package` element")]
    NoPackageFound,

    /// The `version` attribute on the `package` element is not a number.
    ///
    /// Error Source: `.opf` file
    #[error("Invalid package epub `version`: {0}")]
    InvalidVersion(String),

    /// The `metadata` element is not found.
    ///
    /// Error Source: `.opf` file
    #[error("Missing `metadata` element")]
    NoMetadataFound,

    /// The `manifest` element is not found.
    ///
    /// Error Source: `.opf` file
    #[error("Missing `manifest` element")]
    NoManifestFound,

    /// The `spine` element is not found.
    ///
    /// Error Source: `.opf` file
    #[error("Missing `spine` element")]
    NoSpineFound,

    ////////////////////////////////////////////////////////////////////////////////
    // Within `.smil` media overlays
    ////////////////////////////////////////////////////////////////////////////////
    /// The root `smil` element is not found.
    ///
    /// Error Source: `.smil` file
    #[error("Missing `smil` root element")]
    NoSmilFound,

    /// The `body` element is not found.
    ///
    /// Error Source: `.smil` file
    #[error("Missing SMIL `body` element")]
    NoSmilBody,

    /// The `body` element contains no `par` or `seq` element.
    ///
    /// Error Source: `.smil` file
    #[error("SMIL `body` contains no `par` or `seq` element")]
    EmptySmilBody,
}
