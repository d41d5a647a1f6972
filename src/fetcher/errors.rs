use crate::archive::ArchiveError;
use crate::parser::XmlError;
use crate::util::UtfError;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::io;
use std::sync::Arc;

/// Alias for `Result<T, ResourceError>`.
pub type ResourceResult<T> = Result<T, ResourceError>;

/// The shared root cause of a [`ResourceError`].
///
/// Cloning a cause is cheap, which lets a
/// [`FailureResource`](super::FailureResource) return the same error on every call.
#[derive(Clone)]
pub struct ErrorCause(Arc<dyn Error + Send + Sync>);

impl ErrorCause {
    pub fn new(cause: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self(Arc::from(cause.into()))
    }

    /// The underlying error.
    pub fn get(&self) -> &(dyn Error + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

impl Debug for ErrorCause {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for ErrorCause {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Error for ErrorCause {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.0.source()
    }
}

macro_rules! resource_errors {
    {
        $(
            $(#[$meta:meta])*
            $variant:ident($constructor:ident) => $status:literal,
        )+
    } => {
        /// Possible errors while reading a [`Resource`](super::Resource).
        ///
        /// Errors are never raised when a resource is retrieved from a
        /// [`Fetcher`](super::Fetcher), only once it is read.
        #[non_exhaustive]
        #[derive(thiserror::Error, Debug, Clone)]
        pub enum ResourceError {
            $(
                $(#[$meta])*
                #[error("[{name} - `{status}`]: {cause}", name = stringify!($variant), status = $status)]
                $variant {
                    /// The root cause of this error.
                    cause: ErrorCause,
                },
            )+
        }

        impl ResourceError {
            $(
                #[doc = concat!("Creates a [`ResourceError::", stringify!($variant), "`].")]
                pub fn $constructor(cause: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
                    Self::$variant { cause: ErrorCause::new(cause) }
                }
            )+

            /// The HTTP status code equivalent to this error,
            /// for servers exposing resources over HTTP.
            ///
            /// ```
            /// # use rpub::fetcher::ResourceError;
            /// assert_eq!(404, ResourceError::not_found("missing").http_status());
            /// assert_eq!(416, ResourceError::range_not_satisfiable("10..=5").http_status());
            /// ```
            pub fn http_status(&self) -> u16 {
                match self {
                    $(Self::$variant { .. } => $status,)+
                }
            }

            /// The root cause of this error.
            pub fn cause(&self) -> &ErrorCause {
                match self {
                    $(Self::$variant { cause })|+ => cause,
                }
            }
        }
    };
}

resource_errors! {
    /// The request parameters are malformed.
    BadRequest(bad_request) => 400,
    /// The resource does not exist.
    NotFound(not_found) => 404,
    /// Access to the resource is denied, e.g. DRM-locked content.
    Forbidden(forbidden) => 403,
    /// The source is temporarily unreachable.
    Unavailable(unavailable) => 503,
    /// The requested range is too large to load in memory.
    OutOfMemory(out_of_memory) => 507,
    /// The requested range ends before it starts.
    RangeNotSatisfiable(range_not_satisfiable) => 416,
    /// An upstream read took too long.
    Timeout(timeout) => 504,
    /// The network is required but unavailable.
    Offline(offline) => 500,
    /// The caller cancelled the request.
    Cancelled(cancelled) => 500,
    /// Any other failure.
    Other(other) => 500,
}

impl From<io::Error> for ResourceError {
    fn from(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::not_found(error),
            io::ErrorKind::PermissionDenied => Self::forbidden(error),
            io::ErrorKind::TimedOut => Self::timeout(error),
            _ => Self::other(error),
        }
    }
}

impl From<ArchiveError> for ResourceError {
    fn from(error: ArchiveError) -> Self {
        match error {
            ArchiveError::EntryNotFound { .. } | ArchiveError::InvalidEntryPath { .. } => {
                Self::not_found(error)
            }
            ArchiveError::RangeNotSatisfiable { .. } => Self::range_not_satisfiable(error),
            ArchiveError::CannotRead { source, .. } => source.into(),
            error => Self::other(error),
        }
    }
}

impl From<UtfError> for ResourceError {
    fn from(error: UtfError) -> Self {
        Self::other(error)
    }
}

impl From<XmlError> for ResourceError {
    fn from(error: XmlError) -> Self {
        Self::other(error)
    }
}

impl From<serde_json::Error> for ResourceError {
    fn from(error: serde_json::Error) -> Self {
        Self::other(error)
    }
}

#[cfg(test)]
mod tests {
    use super::ResourceError;
    use crate::archive::ArchiveError;
    use std::io;

    #[test]
    fn test_http_status() {
        #[rustfmt::skip]
        let expected = [
            (400, ResourceError::bad_request("")),
            (403, ResourceError::forbidden("")),
            (503, ResourceError::unavailable("")),
            (507, ResourceError::out_of_memory("")),
            (504, ResourceError::timeout("")),
            (500, ResourceError::cancelled("")),
            (500, ResourceError::other("")),
        ];

        for (expect, error) in expected {
            assert_eq!(expect, error.http_status(), "{error}");
        }
    }

    #[test]
    fn test_from_io() {
        #[rustfmt::skip]
        let expected = [
            (404, io::ErrorKind::NotFound),
            (403, io::ErrorKind::PermissionDenied),
            (504, io::ErrorKind::TimedOut),
            (500, io::ErrorKind::UnexpectedEof),
        ];

        for (expect, kind) in expected {
            assert_eq!(expect, ResourceError::from(io::Error::from(kind)).http_status());
        }
    }

    #[test]
    fn test_from_archive() {
        let not_found = ArchiveError::EntryNotFound { path: "/a".to_owned() };
        let range = ArchiveError::RangeNotSatisfiable { start: 5, end: 1 };

        assert!(matches!(ResourceError::from(not_found), ResourceError::NotFound { .. }));
        assert!(matches!(ResourceError::from(range), ResourceError::RangeNotSatisfiable { .. }));
        assert!(matches!(ResourceError::from(ArchiveError::Closed), ResourceError::Other { .. }));
    }

    #[test]
    fn test_display() {
        let error = ResourceError::not_found("No such entry");
        assert_eq!("[NotFound - `404`]: No such entry", error.to_string());
    }
}
