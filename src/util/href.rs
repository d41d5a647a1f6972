//! Resolution of publication references against a base.
//!
//! # Overview
//! An [`Href`] pairs a raw reference, as found in a manifest, package document, or
//! navigation document, with the base it is relative to.
//! [`Href::string`] yields the normalized, percent-decoded form used internally
//! (such as keys into a [`Fetcher`](crate::fetcher::Fetcher)), while
//! [`Href::percent_encoded_string`] yields the form suitable for transport.
//!
//! ```
//! # use rpub::util::href::Href;
//! let href = Href::new("../Text/chapter%201.xhtml#p2", "/OEBPS/Styles/main.css");
//! assert_eq!("/OEBPS/Text/chapter 1.xhtml#p2", href.string().unwrap());
//! assert_eq!("/OEBPS/Text/chapter%201.xhtml#p2", href.percent_encoded_string().unwrap());
//! ```

use crate::util::uri;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use url::Position;

/// Characters escaped when a decoded href is re-encoded.
///
/// `/`, `?`, `#`, `:`, `@`, `&`, `=`, `+` and `;` are structural and kept as-is.
const HREF_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'^')
    .add(b'|')
    .add(b'\\');

/// Characters escaped in the path of a decoded href, where `?` and `#` are literal.
const PATH_ENCODE_SET: &AsciiSet = &HREF_ENCODE_SET.add(b'?').add(b'#');

/// Alias for `Result<T, HrefError>`.
pub type HrefResult<T> = Result<T, HrefError>;

/// Possible errors when resolving an [`Href`].
#[non_exhaustive]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HrefError {
    /// The raw value cannot be parsed as a URI reference.
    #[error("[InvalidHref - `{href}`]: {reason}")]
    InvalidHref {
        /// The offending href.
        href: String,
        /// Why the href is unusable.
        reason: String,
    },
}

/// A possibly relative reference paired with the base it resolves against.
///
/// An empty base is treated as the root (`/`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Href {
    href: String,
    base: String,
}

impl Href {
    /// Creates an [`Href`] from a raw `href` and the `base` it is relative to.
    pub fn new(href: impl Into<String>, base: impl Into<String>) -> Self {
        let base = base.into();

        Self {
            href: href.into(),
            base: if base.is_empty() { "/".to_owned() } else { base },
        }
    }

    /// The raw, unresolved reference.
    pub fn raw(&self) -> &str {
        &self.href
    }

    /// The base the reference resolves against.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Returns the normalized, percent-decoded representation.
    ///
    /// - A blank value or a pure fragment (`#...`) is appended to the base.
    /// - An absolute value (one with a scheme) is returned as-is.
    /// - Otherwise the path is resolved against the base, keeping any query and fragment.
    ///   Local results are always rooted (`/`-prefixed).
    ///
    /// The query and fragment are split off before decoding, so an encoded `%23` or `%3F`
    /// stays part of its path segment.
    ///
    /// # Errors
    /// [`HrefError::InvalidHref`] when resolving against an absolute base fails.
    pub fn string(&self) -> HrefResult<String> {
        let (path, suffix) = self.resolve()?;
        Ok(path + &suffix)
    }

    /// Returns the normalized representation, percent-encoded for transport.
    ///
    /// When the href is absolute, its host is converted to ASCII using IDNA.
    ///
    /// # Errors
    /// [`HrefError::InvalidHref`] when the href cannot be resolved or encoded.
    pub fn percent_encoded_string(&self) -> HrefResult<String> {
        let (path, suffix) = self.resolve()?;
        let encoded = format!(
            "{}{}",
            utf8_percent_encode(&path, PATH_ENCODE_SET),
            utf8_percent_encode(&suffix, HREF_ENCODE_SET),
        );

        if !uri::has_scheme(&encoded) {
            return Ok(encoded);
        }
        url::Url::parse(&encoded)
            .map(String::from)
            .map_err(|error| self.invalid(error))
    }

    /// Returns the query parameters, in the order they appear.
    ///
    /// # Errors
    /// [`HrefError::InvalidHref`] when the href cannot be resolved.
    pub fn query_parameters(&self) -> HrefResult<Vec<(String, String)>> {
        let encoded = self.percent_encoded_string()?;
        let (_, suffix) = uri::split_suffix(&encoded);
        let query = suffix
            .strip_prefix('?')
            .map(|query| query.split('#').next().unwrap_or_default())
            .unwrap_or_default();

        Ok(url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect())
    }

    /// Resolves the href into its decoded path and its decoded query and fragment suffix.
    fn resolve(&self) -> HrefResult<(String, String)> {
        let (base_path, base_suffix) = uri::split_suffix(&self.base);
        let (path, suffix) = uri::split_suffix(&self.href);
        let (base_path, path, suffix) = (uri::decode(base_path), uri::decode(path), uri::decode(suffix));

        if self.href.trim().is_empty() || self.href.starts_with('#') {
            let suffix = format!("{}{}", uri::decode(base_suffix), uri::decode(&self.href));
            return Ok((base_path.into_owned(), suffix));
        }
        if uri::has_scheme(&self.href) {
            return Ok((path.into_owned(), suffix.into_owned()));
        }
        if uri::has_scheme(&self.base) {
            return self.resolve_absolute(&base_path, &path, &suffix);
        }

        let resolved = uri::resolve(&base_path, &path);
        let resolved = if resolved.starts_with('/') {
            resolved
        } else {
            format!("/{resolved}")
        };
        Ok((resolved, suffix.into_owned()))
    }

    fn resolve_absolute(&self, base: &str, path: &str, suffix: &str) -> HrefResult<(String, String)> {
        let base = utf8_percent_encode(base, PATH_ENCODE_SET).to_string();
        let relative = format!(
            "{}{}",
            utf8_percent_encode(path, PATH_ENCODE_SET),
            utf8_percent_encode(suffix, HREF_ENCODE_SET),
        );
        let joined = url::Url::parse(&base)
            .and_then(|base| base.join(&relative))
            .map_err(|error| self.invalid(error))?;
        let (path, suffix) = joined.as_str().split_at(joined[..Position::AfterPath].len());

        Ok((uri::decode(path).into_owned(), uri::decode(suffix).into_owned()))
    }

    fn invalid(&self, error: impl std::fmt::Display) -> HrefError {
        HrefError::InvalidHref {
            href: self.href.clone(),
            reason: error.to_string(),
        }
    }
}

impl std::fmt::Display for Href {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.string() {
            Ok(resolved) => f.write_str(&resolved),
            Err(_) => f.write_str(&self.href),
        }
    }
}
