//! Absolute and relative URLs.
//!
//! # Overview
//! [`Url`] is either an [`AbsoluteUrl`], whose scheme must be one of the
//! supported [`Scheme`]s, or a [`RelativeUrl`] (a path with an optional query and fragment).
//! Paths are exposed percent-decoded, while [`Url::to_string`] yields the encoded form.
//!
//! ```
//! # use rpub::util::url::Url;
//! let base = Url::parse("http://example.com/foo/").unwrap();
//! let child = Url::parse("http://example.com/foo/quz/baz").unwrap();
//!
//! assert_eq!("quz/baz", base.relativize(&child).to_string());
//! assert_eq!(child, base.resolve(&Url::parse("quz/baz").unwrap()));
//! ```

use crate::util::uri;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use std::fmt;
use std::path::Path;

const PATH_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Alias for `Result<T, UrlError>`.
pub type UrlResult<T> = Result<T, UrlError>;

/// Possible errors when creating a [`Url`].
#[non_exhaustive]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UrlError {
    /// The value is not a valid URL.
    #[error("[InvalidUrl - `{url}`]: {reason}")]
    InvalidUrl {
        /// The offending value.
        url: String,
        /// Why the value is unusable.
        reason: String,
    },

    /// The URL is absolute, although its scheme is not supported.
    #[error("[UnsupportedScheme - `{url}`]: `{scheme}` is not supported")]
    UnsupportedScheme {
        /// The offending value.
        url: String,
        /// The unsupported scheme.
        scheme: String,
    },
}

/// The closed set of schemes an [`AbsoluteUrl`] may carry.
#[non_exhaustive]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// `http`
    Http,
    /// `https`
    Https,
    /// `file`
    File,
    /// `ftp`
    Ftp,
    /// `data`
    Data,
    /// `s3` (Amazon S3-compatible storage)
    S3,
    /// `gs` (Google Cloud Storage)
    Gs,
    /// `opds`
    Opds,
}

impl Scheme {
    /// Returns the [`Scheme`] matching `scheme`, ignoring case.
    pub fn parse(scheme: &str) -> Option<Self> {
        Some(match scheme.to_ascii_lowercase().as_str() {
            "http" => Self::Http,
            "https" => Self::Https,
            "file" => Self::File,
            "ftp" => Self::Ftp,
            "data" => Self::Data,
            "s3" => Self::S3,
            "gs" => Self::Gs,
            "opds" => Self::Opds,
            _ => return None,
        })
    }

    /// The lowercase string form, such as `https`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
            Self::File => "file",
            Self::Ftp => "ftp",
            Self::Data => "data",
            Self::S3 => "s3",
            Self::Gs => "gs",
            Self::Opds => "opds",
        }
    }

    /// Returns `true` for `http` and `https`.
    pub fn is_http(&self) -> bool {
        matches!(self, Self::Http | Self::Https)
    }

    /// Returns `true` for cloud storage schemes (`s3` and `gs`).
    pub fn is_cloud(&self) -> bool {
        matches!(self, Self::S3 | Self::Gs)
    }
}

/// An absolute or relative URL.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Url {
    /// A URL with a supported [`Scheme`].
    Absolute(AbsoluteUrl),
    /// A URL without a scheme.
    Relative(RelativeUrl),
}

/// A URL carrying a supported [`Scheme`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AbsoluteUrl {
    inner: url::Url,
    scheme: Scheme,
}

/// A path relative to an unknown base, with an optional query and fragment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct RelativeUrl {
    /// Percent-decoded path.
    path: String,
    /// Encoded query, without the leading `?`.
    query: Option<String>,
    /// Encoded fragment, without the leading `#`.
    fragment: Option<String>,
}

impl Url {
    /// Parses an encoded URL.
    ///
    /// # Errors
    /// - [`UrlError::InvalidUrl`] if the value cannot be parsed.
    /// - [`UrlError::UnsupportedScheme`] if the value is absolute with an unsupported scheme.
    pub fn parse(url: &str) -> UrlResult<Self> {
        if uri::has_scheme(url) {
            AbsoluteUrl::parse(url).map(Self::Absolute)
        } else {
            Ok(Self::Relative(RelativeUrl::parse(url)))
        }
    }

    /// Creates a [`RelativeUrl`] from a percent-decoded path.
    pub fn from_decoded_path(path: &str) -> Self {
        Self::Relative(RelativeUrl {
            path: path.to_owned(),
            ..RelativeUrl::default()
        })
    }

    /// Creates a `file` URL from a local filesystem path.
    ///
    /// # Errors
    /// [`UrlError::InvalidUrl`] if `path` is not absolute.
    pub fn from_filepath(path: impl AsRef<Path>) -> UrlResult<Self> {
        let path = path.as_ref();

        url::Url::from_file_path(path)
            .map_err(|_| UrlError::InvalidUrl {
                url: path.to_string_lossy().into_owned(),
                reason: "file paths must be absolute".to_owned(),
            })
            .map(|inner| {
                Self::Absolute(AbsoluteUrl {
                    inner,
                    scheme: Scheme::File,
                })
            })
    }

    /// Creates a URL from an href found in an EPUB package.
    ///
    /// EPUB hrefs ought to be percent-encoded, yet many are not (`my chapter.html`).
    /// Values that fail to parse as URLs are treated as decoded paths.
    pub fn from_epub_href(href: &str) -> Self {
        Self::parse(href).unwrap_or_else(|_| Self::from_decoded_path(href))
    }

    /// The percent-decoded path.
    pub fn path(&self) -> String {
        match self {
            Self::Absolute(url) => url.path(),
            Self::Relative(url) => url.path.clone(),
        }
    }

    /// The last path segment, or an empty string if the path ends with a slash.
    pub fn filename(&self) -> String {
        let path = self.path();

        if path.ends_with('/') {
            String::new()
        } else {
            path.rsplit('/').next().unwrap_or_default().to_owned()
        }
    }

    /// The extension of [`Self::filename`], without the dot.
    pub fn extension(&self) -> Option<String> {
        let filename = self.filename();

        filename
            .rfind('.')
            .filter(|&index| index + 1 < filename.len())
            .map(|index| filename[index + 1..].to_owned())
    }

    /// The encoded query, without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        match self {
            Self::Absolute(url) => url.inner.query(),
            Self::Relative(url) => url.query.as_deref(),
        }
    }

    /// The query parameters, in the order they appear.
    pub fn query_parameters(&self) -> Vec<(String, String)> {
        self.query()
            .map(|query| {
                url::form_urlencoded::parse(query.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The encoded fragment, without the leading `#`.
    pub fn fragment(&self) -> Option<&str> {
        match self {
            Self::Absolute(url) => url.inner.fragment(),
            Self::Relative(url) => url.fragment.as_deref(),
        }
    }

    /// Returns a copy of this URL without its query.
    pub fn remove_query(&self) -> Self {
        let mut url = self.clone();
        match &mut url {
            Self::Absolute(absolute) => absolute.inner.set_query(None),
            Self::Relative(relative) => relative.query = None,
        }
        url
    }

    /// Returns a copy of this URL without its fragment.
    pub fn remove_fragment(&self) -> Self {
        let mut url = self.clone();
        match &mut url {
            Self::Absolute(absolute) => absolute.inner.set_fragment(None),
            Self::Relative(relative) => relative.fragment = None,
        }
        url
    }

    /// The scheme, when absolute.
    pub fn scheme(&self) -> Option<Scheme> {
        match self {
            Self::Absolute(url) => Some(url.scheme),
            Self::Relative(_) => None,
        }
    }

    /// Returns `true` if this is an `http` or `https` URL.
    pub fn is_http(&self) -> bool {
        self.scheme().is_some_and(|scheme| scheme.is_http())
    }

    /// Returns `true` if this is a `file` URL.
    pub fn is_file(&self) -> bool {
        self.scheme() == Some(Scheme::File)
    }

    /// Resolves `other` against this URL.
    ///
    /// An absolute `other` is returned unchanged.
    pub fn resolve(&self, other: &Url) -> Url {
        match (self, other) {
            (_, Self::Absolute(_)) => other.clone(),
            (Self::Absolute(base), Self::Relative(relative)) => base
                .inner
                .join(&relative.to_string())
                .map(|inner| {
                    Self::Absolute(AbsoluteUrl {
                        inner,
                        scheme: base.scheme,
                    })
                })
                .unwrap_or_else(|_| other.clone()),
            (Self::Relative(base), Self::Relative(relative)) => {
                Self::Relative(base.resolve(relative))
            }
        }
    }

    /// Relativizes `other` against this URL.
    ///
    /// `other` is returned unchanged when both URLs do not share the same root,
    /// or when `other` is not a descendant of this URL.
    pub fn relativize(&self, other: &Url) -> Url {
        let (base_path, other_path, query, fragment) = match (self, other) {
            (Self::Absolute(base), Self::Absolute(target)) => {
                if base.inner.scheme() != target.inner.scheme()
                    || base.inner.host_str() != target.inner.host_str()
                    || base.inner.port() != target.inner.port()
                {
                    return other.clone();
                }
                (
                    base.path(),
                    target.path(),
                    target.inner.query().map(str::to_owned),
                    target.inner.fragment().map(str::to_owned),
                )
            }
            (Self::Relative(base), Self::Relative(target)) => (
                base.path.clone(),
                target.path.clone(),
                target.query.clone(),
                target.fragment.clone(),
            ),
            _ => return other.clone(),
        };

        let mut base_path = clean(&base_path);
        let other_path = clean(&other_path);

        if base_path != other_path {
            if !base_path.ends_with('/') {
                base_path.push('/');
            }
            if !other_path.starts_with(&base_path) {
                return other.clone();
            }
        }

        Self::Relative(RelativeUrl {
            path: other_path
                .get(base_path.len()..)
                .unwrap_or_default()
                .to_owned(),
            query,
            fragment,
        })
    }

    /// Normalizes this URL.
    ///
    /// - `.` and `..` segments are resolved; a trailing slash is kept.
    /// - The scheme is lowercase and the host is converted to ASCII using IDNA.
    pub fn normalize(&self) -> Url {
        match self {
            Self::Absolute(url) => {
                let mut inner = url.inner.clone();
                let path = uri::normalize(inner.path());
                inner.set_path(&path);
                Self::Absolute(AbsoluteUrl {
                    inner,
                    scheme: url.scheme,
                })
            }
            Self::Relative(url) => Self::Relative(RelativeUrl {
                path: uri::normalize(&url.path),
                ..url.clone()
            }),
        }
    }

    /// Returns `true` if both URLs are equal once normalized.
    pub fn is_equivalent(&self, other: &Url) -> bool {
        self.normalize() == other.normalize()
    }
}

impl AbsoluteUrl {
    fn parse(url: &str) -> UrlResult<Self> {
        let inner = url::Url::parse(url).map_err(|error| UrlError::InvalidUrl {
            url: url.to_owned(),
            reason: error.to_string(),
        })?;
        let scheme = Scheme::parse(inner.scheme()).ok_or_else(|| UrlError::UnsupportedScheme {
            url: url.to_owned(),
            scheme: inner.scheme().to_owned(),
        })?;

        Ok(Self { inner, scheme })
    }

    /// The percent-decoded path.
    pub fn path(&self) -> String {
        uri::decode(self.inner.path()).into_owned()
    }

    /// The [`Scheme`] of this URL.
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Converts a `file` URL to a local path.
    pub fn to_filepath(&self) -> Option<std::path::PathBuf> {
        match self.scheme {
            Scheme::File => self.inner.to_file_path().ok(),
            _ => None,
        }
    }
}

impl RelativeUrl {
    fn parse(url: &str) -> Self {
        let (rest, fragment) = match url.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment.to_owned())),
            None => (url, None),
        };
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query.to_owned())),
            None => (rest, None),
        };

        Self {
            path: uri::decode(path).into_owned(),
            query,
            fragment,
        }
    }

    fn resolve(&self, other: &RelativeUrl) -> RelativeUrl {
        if other.path.is_empty() {
            return RelativeUrl {
                path: self.path.clone(),
                query: other.query.clone().or_else(|| self.query.clone()),
                fragment: other.fragment.clone(),
            };
        }
        let path = if other.path.starts_with('/') {
            uri::normalize(&other.path)
        } else {
            uri::normalize(&format!("{}{}", uri::directory(&self.path), other.path))
        };

        RelativeUrl {
            path,
            query: other.query.clone(),
            fragment: other.fragment.clone(),
        }
    }
}

/// Like [`uri::normalize`], although a trailing slash is dropped (except for the root).
fn clean(path: &str) -> String {
    let normalized = uri::normalize(path);

    match normalized.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped.to_owned(),
        _ => normalized,
    }
}

impl fmt::Display for RelativeUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", utf8_percent_encode(&self.path, PATH_ENCODE_SET))?;

        if let Some(query) = &self.query {
            write!(f, "?{query}")?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}

impl fmt::Display for AbsoluteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.inner.as_str())
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absolute(url) => url.fmt(f),
            Self::Relative(url) => url.fmt(f),
        }
    }
}
