//! Media types and content sniffing.
//!
//! # Overview
//! A [`MediaType`] identifies a document format per
//! [RFC 6838](https://tools.ietf.org/html/rfc6838), such as `application/epub+zip`.
//! Well-known formats of the Readium ecosystem are available as associated constants
//! (e.g., [`MediaType::EPUB`]), each carrying its preferred file extension.
//!
//! When the format of a file is unknown, [`MediaType::of_file`] and [`MediaType::of_bytes`]
//! resolve it from media type and file extension hints, then by inspecting the content
//! itself. See [`sniffer`] for the individual sniffers.
//!
//! ```
//! # use rpub::mediatype::MediaType;
//! let html = MediaType::parse("TEXT/HTML; charset=utf-8").unwrap();
//!
//! assert!(html.is_html());
//! assert_eq!(Some("UTF-8"), html.charset());
//! assert!(MediaType::HTML.contains(&html));
//! assert_eq!("text/html;charset=UTF-8", html.to_string());
//! ```

pub mod sniffer;

use self::sniffer::{Sniffer, SnifferContent, SnifferContext};
use std::borrow::Cow;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::path::Path;

pub use self::sniffer::SNIFFERS;

#[derive(Clone, Debug)]
enum Parameters {
    Static(&'static [(&'static str, &'static str)]),
    Owned(Vec<(String, String)>),
}

impl Parameters {
    fn iter(&self) -> Box<dyn Iterator<Item = (&str, &str)> + '_> {
        match self {
            Self::Static(parameters) => Box::new(parameters.iter().copied()),
            Self::Owned(parameters) => Box::new(
                parameters
                    .iter()
                    .map(|(name, value)| (name.as_str(), value.as_str())),
            ),
        }
    }
}

/// Alias for `Result<T, MediaTypeError>`.
pub type MediaTypeResult<T> = Result<T, MediaTypeError>;

/// Possible errors when parsing a [`MediaType`].
#[non_exhaustive]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaTypeError {
    /// The value does not have exactly a type and a subtype (`type/subtype`).
    #[error("[InvalidMediaType - `{0}`]: Expected `type/subtype[;parameters]`")]
    InvalidMediaType(String),
}

/// A document format, identified by its type, subtype, and parameters.
///
/// # Equality
/// - [`Self::type`] and [`Self::subtype`] are case-insensitive.
/// - Parameter names are case-insensitive and their order does not matter.
/// - Parameter values are case-sensitive, except for `charset`,
///   which is canonicalized to an upper-case name.
/// - The preferred file extension is not considered.
///
/// ```
/// # use rpub::mediatype::MediaType;
/// let a = MediaType::parse("application/atom+xml;type=entry;profile=opds-catalog").unwrap();
/// let b = MediaType::parse("APPLICATION/ATOM+XML ; profile=opds-catalog;type=entry").unwrap();
///
/// assert_eq!(a, b);
/// assert_eq!(MediaType::OPDS1_ENTRY, a);
/// ```
#[derive(Clone, Debug)]
pub struct MediaType {
    r#type: Cow<'static, str>,
    subtype: Cow<'static, str>,
    // Sorted by name
    parameters: Parameters,
    extension: Option<&'static str>,
}

macro_rules! registry {
    ($($(#[$doc:meta])* $name:ident = $type:literal / $subtype:literal $([$($key:literal = $value:literal),+])? => $extension:expr;)+) => {
        impl MediaType {
            $(
                $(#[$doc])*
                pub const $name: MediaType = MediaType::constant(
                    $type,
                    $subtype,
                    &[$($(($key, $value)),+)?],
                    $extension,
                );
            )+
        }
    };
}

registry! {
    /// Advanced Audio Coding.
    AAC = "audio"/"aac" => Some("aac");
    /// Adobe Content Server Message.
    ACSM = "application"/"vnd.adobe.adept+xml" => Some("acsm");
    /// Audio Interchange File Format.
    AIFF = "audio"/"aiff" => Some("aiff");
    /// Audio Video Interleave.
    AVI = "video"/"x-msvideo" => Some("avi");
    /// AV1 Image File Format.
    AVIF = "image"/"avif" => Some("avif");
    /// Arbitrary binary data.
    BINARY = "application"/"octet-stream" => None;
    /// Bitmap image.
    BMP = "image"/"bmp" => Some("bmp");
    /// Comic Book Archive.
    CBZ = "application"/"vnd.comicbook+zip" => Some("cbz");
    /// Cascading Style Sheets.
    CSS = "text"/"css" => Some("css");
    /// Packaged Divina publication.
    DIVINA = "application"/"divina+zip" => Some("divina");
    /// Divina manifest.
    DIVINA_MANIFEST = "application"/"divina+json" => Some("json");
    /// EPUB publication.
    EPUB = "application"/"epub+zip" => Some("epub");
    /// Free Lossless Audio Codec.
    FLAC = "audio"/"flac" => Some("flac");
    /// Graphics Interchange Format.
    GIF = "image"/"gif" => Some("gif");
    /// Gzip compressed file.
    GZ = "application"/"gzip" => Some("gz");
    /// Readium Guided Navigation document.
    GUIDED_NAVIGATION = "application"/"guided-navigation+json" => Some("json");
    /// Hypertext Markup Language.
    HTML = "text"/"html" => Some("html");
    /// JavaScript.
    JAVASCRIPT = "text"/"javascript" => Some("js");
    /// Joint Photographic Experts Group image.
    JPEG = "image"/"jpeg" => Some("jpeg");
    /// JavaScript Object Notation.
    JSON = "application"/"json" => Some("json");
    /// Problem details for HTTP APIs.
    JSON_PROBLEM_DETAILS = "application"/"problem+json" => Some("json");
    /// JPEG XL image.
    JXL = "image"/"jxl" => Some("jxl");
    /// LCP license document.
    LCP_LICENSE_DOCUMENT = "application"/"vnd.readium.lcp.license.v1.0+json" => Some("lcpl");
    /// LCP-protected audiobook.
    LCP_PROTECTED_AUDIOBOOK = "application"/"audiobook+lcp" => Some("lcpa");
    /// LCP-protected PDF.
    LCP_PROTECTED_PDF = "application"/"pdf+lcp" => Some("lcpdf");
    /// LCP license status document.
    LCP_STATUS_DOCUMENT = "application"/"vnd.readium.license.status.v1.0+json" => Some("json");
    /// Lightweight Packaging Format (W3C Publication Manifest in a ZIP).
    LPF = "application"/"lpf+zip" => Some("lpf");
    /// MPEG-1/2 Audio Layer III.
    MP3 = "audio"/"mpeg" => Some("mp3");
    /// MPEG-4 audio.
    MP4_AUDIO = "audio"/"mp4" => Some("m4a");
    /// MPEG video.
    MPEG = "video"/"mpeg" => Some("mpeg");
    /// Navigation Control file for XML (EPUB 2).
    NCX = "application"/"x-dtbncx+xml" => Some("ncx");
    /// EPUB package document.
    OPF = "application"/"oebps-package+xml" => Some("opf");
    /// Ogg Vorbis audio.
    OGG = "audio"/"ogg" => Some("oga");
    /// Ogg video.
    OGV = "video"/"ogg" => Some("ogv");
    /// OPDS 1 feed.
    OPDS1 = "application"/"atom+xml" ["profile" = "opds-catalog"] => None;
    /// OPDS 1 entry.
    OPDS1_ENTRY = "application"/"atom+xml" ["profile" = "opds-catalog", "type" = "entry"] => None;
    /// OPDS 2 feed.
    OPDS2 = "application"/"opds+json" => None;
    /// OPDS 2 publication.
    OPDS2_PUBLICATION = "application"/"opds-publication+json" => None;
    /// OPDS authentication document.
    OPDS_AUTHENTICATION = "application"/"opds-authentication+json" => None;
    /// Opus audio.
    OPUS = "audio"/"opus" => Some("opus");
    /// OpenType font.
    OTF = "font"/"otf" => Some("otf");
    /// Portable Document Format.
    PDF = "application"/"pdf" => Some("pdf");
    /// Portable Network Graphics.
    PNG = "image"/"png" => Some("png");
    /// Packaged Readium audiobook.
    READIUM_AUDIOBOOK = "application"/"audiobook+zip" => Some("audiobook");
    /// Readium audiobook manifest.
    READIUM_AUDIOBOOK_MANIFEST = "application"/"audiobook+json" => Some("json");
    /// Readium position list.
    READIUM_POSITION_LIST = "application"/"vnd.readium.position-list+json" => Some("json");
    /// Packaged Readium Web Publication.
    READIUM_WEBPUB = "application"/"webpub+zip" => Some("webpub");
    /// Readium Web Publication manifest.
    READIUM_WEBPUB_MANIFEST = "application"/"webpub+json" => Some("json");
    /// Synchronized Multimedia Integration Language.
    SMIL = "application"/"smil+xml" => Some("smil");
    /// Scalable Vector Graphics.
    SVG = "image"/"svg+xml" => Some("svg");
    /// Plain text.
    TEXT = "text"/"plain" => Some("txt");
    /// Tagged Image File Format.
    TIFF = "image"/"tiff" => Some("tiff");
    /// TrueType font.
    TTF = "font"/"ttf" => Some("ttf");
    /// W3C Web Publication manifest.
    W3C_WPUB_MANIFEST = "application"/"x.readium.w3c.wpub+json" => Some("json");
    /// Waveform audio.
    WAV = "audio"/"wav" => Some("wav");
    /// WebM audio.
    WEBM_AUDIO = "audio"/"webm" => Some("webm");
    /// WebM video.
    WEBM_VIDEO = "video"/"webm" => Some("webm");
    /// WebP image.
    WEBP = "image"/"webp" => Some("webp");
    /// Web Open Font Format.
    WOFF = "font"/"woff" => Some("woff");
    /// Web Open Font Format 2.
    WOFF2 = "font"/"woff2" => Some("woff2");
    /// Extensible Hypertext Markup Language.
    XHTML = "application"/"xhtml+xml" => Some("xhtml");
    /// Extensible Markup Language.
    XML = "application"/"xml" => Some("xml");
    /// Zipped Audio Book.
    ZAB = "application"/"x.readium.zab+zip" => Some("zab");
    /// ZIP archive.
    ZIP = "application"/"zip" => Some("zip");
}

impl MediaType {
    const fn constant(
        r#type: &'static str,
        subtype: &'static str,
        parameters: &'static [(&'static str, &'static str)],
        extension: Option<&'static str>,
    ) -> Self {
        Self {
            r#type: Cow::Borrowed(r#type),
            subtype: Cow::Borrowed(subtype),
            parameters: Parameters::Static(parameters),
            extension,
        }
    }

    /// Parses a media type such as `text/html;charset=utf-8`.
    ///
    /// Surrounding whitespace, empty parameters (`;;`), and quoted parameter values are tolerated.
    ///
    /// # Errors
    /// [`MediaTypeError::InvalidMediaType`] when the value does not consist of
    /// exactly two non-empty components (`type/subtype`).
    pub fn parse(value: &str) -> MediaTypeResult<Self> {
        Self::parse_with_extension(value, None)
    }

    fn parse_with_extension(value: &str, extension: Option<&'static str>) -> MediaTypeResult<Self> {
        let invalid = || MediaTypeError::InvalidMediaType(value.to_owned());
        let mut components = value.split(';');
        let essence = components.next().unwrap_or_default().trim();

        let (r#type, subtype) = essence.split_once('/').ok_or_else(invalid)?;
        let (r#type, subtype) = (r#type.trim(), subtype.trim());
        if r#type.is_empty() || subtype.is_empty() || subtype.contains('/') {
            return Err(invalid());
        }

        let mut parameters: Vec<(String, String)> = components
            .filter_map(|parameter| {
                let (name, value) = parameter.split_once('=')?;
                let name = name.trim().to_ascii_lowercase();
                let value = value.trim().trim_matches('"');

                if name.is_empty() {
                    return None;
                }
                let value = if name == "charset" {
                    canonical_charset(value)
                } else {
                    value.to_owned()
                };
                Some((name, value))
            })
            .collect();
        parameters.sort();
        parameters.dedup_by(|a, b| a.0 == b.0);

        Ok(Self {
            r#type: Cow::Owned(r#type.to_ascii_lowercase()),
            subtype: Cow::Owned(subtype.to_ascii_lowercase()),
            parameters: Parameters::Owned(parameters),
            extension,
        })
    }

    /// The type component, e.g. `application` in `application/epub+zip`.
    pub fn r#type(&self) -> &str {
        &self.r#type
    }

    /// The subtype component, e.g. `epub+zip` in `application/epub+zip`.
    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// The parameters sorted by name, such as `charset=UTF-8`.
    pub fn parameters(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.parameters.iter()
    }

    /// The value of the parameter with the given case-insensitive `name`.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    /// The declared `charset` parameter, if any, in its canonical upper-case form.
    pub fn charset(&self) -> Option<&str> {
        self.parameter("charset")
    }

    /// The structured syntax suffix, e.g. `+zip` in `application/epub+zip`.
    pub fn structured_syntax_suffix(&self) -> Option<&str> {
        self.subtype.rfind('+').map(|index| &self.subtype[index..])
    }

    /// The preferred file extension of a known media type, without the leading dot.
    pub fn file_extension(&self) -> Option<&'static str> {
        self.extension
    }

    /// The media type without its parameters, e.g. `text/html`.
    pub fn essence(&self) -> String {
        format!("{}/{}", self.r#type, self.subtype)
    }

    /// Returns the canonical version of this media type.
    ///
    /// Known aliases resolve to their registered media type and non-significant
    /// parameters are discarded.
    /// An unknown media type is returned unchanged.
    ///
    /// ```
    /// # use rpub::mediatype::MediaType;
    /// let alias = MediaType::parse("application/x-cbz").unwrap();
    /// assert_eq!(MediaType::CBZ, alias.canonical());
    ///
    /// let html = MediaType::parse("text/html;charset=utf-8").unwrap();
    /// assert_eq!(MediaType::HTML, html.canonical());
    /// ```
    pub fn canonical(&self) -> MediaType {
        Self::of_string(&self.to_string()).unwrap_or_else(|| self.clone())
    }

    /// Returns `true` if `other` is included in this media type.
    ///
    /// - Wildcards are supported; `image/*` contains `image/png` and `*/*` contains everything.
    /// - `other` must carry every parameter of `self`, although extra parameters are ignored.
    ///
    /// ```
    /// # use rpub::mediatype::MediaType;
    /// let html_utf8 = MediaType::parse("text/html;charset=utf-8").unwrap();
    /// let wildcard = MediaType::parse("text/*").unwrap();
    ///
    /// assert!(MediaType::HTML.contains(&html_utf8));
    /// assert!(!html_utf8.contains(&MediaType::HTML));
    /// assert!(wildcard.contains(&MediaType::HTML));
    /// ```
    pub fn contains(&self, other: &MediaType) -> bool {
        (self.r#type == "*" || self.r#type == other.r#type)
            && (self.subtype == "*" || self.subtype == other.subtype)
            && self
                .parameters
                .iter()
                .all(|parameter| other.parameters.iter().any(|other| parameter == other))
    }

    /// Parses `other` and checks if it is included in this media type.
    ///
    /// See [`Self::contains`].
    pub fn contains_str(&self, other: &str) -> bool {
        Self::parse(other).is_ok_and(|other| self.contains(&other))
    }

    /// Returns `true` if either media type [contains](Self::contains) the other.
    pub fn matches(&self, other: &MediaType) -> bool {
        self.contains(other) || other.contains(self)
    }

    /// Parses `other` and checks if it [matches](Self::matches) this media type.
    pub fn matches_str(&self, other: &str) -> bool {
        Self::parse(other).is_ok_and(|other| self.matches(&other))
    }

    /// Returns `true` if this media type [matches](Self::matches) any of `others`.
    pub fn matches_any(&self, others: &[MediaType]) -> bool {
        others.iter().any(|other| self.matches(other))
    }

    /// Returns `true` if this media type is a ZIP-based container.
    pub fn is_zip(&self) -> bool {
        self.matches_any(&[
            Self::ZIP,
            Self::LCP_PROTECTED_AUDIOBOOK,
            Self::LCP_PROTECTED_PDF,
        ]) || self.structured_syntax_suffix() == Some("+zip")
    }

    /// Returns `true` if this media type is JSON-based.
    pub fn is_json(&self) -> bool {
        self.matches(&Self::JSON) || self.structured_syntax_suffix() == Some("+json")
    }

    /// Returns `true` if this media type is an OPDS document.
    pub fn is_opds(&self) -> bool {
        self.matches_any(&[
            Self::OPDS1,
            Self::OPDS1_ENTRY,
            Self::OPDS2,
            Self::OPDS2_PUBLICATION,
            Self::OPDS_AUTHENTICATION,
        ])
    }

    /// Returns `true` if this media type is HTML or XHTML.
    pub fn is_html(&self) -> bool {
        self.matches_any(&[Self::HTML, Self::XHTML])
    }

    /// Returns `true` if this media type is a bitmap image.
    /// Vector images such as SVG are excluded.
    pub fn is_bitmap(&self) -> bool {
        self.matches_any(&[
            Self::AVIF,
            Self::BMP,
            Self::GIF,
            Self::JPEG,
            Self::JXL,
            Self::PNG,
            Self::TIFF,
            Self::WEBP,
        ])
    }

    /// Returns `true` if this media type is of type `image`.
    pub fn is_image(&self) -> bool {
        self.r#type == "image"
    }

    /// Returns `true` if this media type is of type `audio`.
    pub fn is_audio(&self) -> bool {
        self.r#type == "audio"
    }

    /// Returns `true` if this media type is of type `video`.
    pub fn is_video(&self) -> bool {
        self.r#type == "video"
    }

    /// Returns `true` if this media type is a Readium Web Publication manifest.
    pub fn is_rwpm(&self) -> bool {
        self.matches_any(&[
            Self::READIUM_AUDIOBOOK_MANIFEST,
            Self::DIVINA_MANIFEST,
            Self::READIUM_WEBPUB_MANIFEST,
        ])
    }

    /// Returns `true` if this media type is a publication format.
    pub fn is_publication(&self) -> bool {
        self.matches_any(&[
            Self::READIUM_AUDIOBOOK,
            Self::READIUM_AUDIOBOOK_MANIFEST,
            Self::CBZ,
            Self::DIVINA,
            Self::DIVINA_MANIFEST,
            Self::EPUB,
            Self::LCP_PROTECTED_AUDIOBOOK,
            Self::LCP_PROTECTED_PDF,
            Self::LPF,
            Self::PDF,
            Self::W3C_WPUB_MANIFEST,
            Self::READIUM_WEBPUB,
            Self::READIUM_WEBPUB_MANIFEST,
            Self::ZAB,
        ])
    }
}

/// Sniffing entry points.
impl MediaType {
    /// Resolves a media type from media type and file extension hints alone.
    ///
    /// Media type hints take precedence over file extensions.
    /// When no sniffer recognizes the hints, the first valid media type hint is returned.
    pub fn of(media_types: &[&str], file_extensions: &[&str]) -> Option<MediaType> {
        Self::of_with(None, media_types, file_extensions, SNIFFERS)
    }

    /// Resolves a media type from a single media type hint.
    ///
    /// ```
    /// # use rpub::mediatype::MediaType;
    /// assert_eq!(Some(MediaType::EPUB), MediaType::of_string("application/epub+zip"));
    /// assert_eq!(
    ///     MediaType::parse("fruit/grapes").ok(),
    ///     MediaType::of_string("fruit/grapes"),
    /// );
    /// assert_eq!(None, MediaType::of_string("invalid"));
    /// ```
    pub fn of_string(media_type: &str) -> Option<MediaType> {
        Self::of(&[media_type], &[])
    }

    /// Resolves a media type from a single file extension hint.
    ///
    /// ```
    /// # use rpub::mediatype::MediaType;
    /// assert_eq!(Some(MediaType::JPEG), MediaType::of_extension("JFIF"));
    /// ```
    pub fn of_extension(extension: &str) -> Option<MediaType> {
        Self::of(&[], &[extension])
    }

    /// Resolves a media type from both a media type and a file extension hint.
    pub fn of_string_and_extension(media_type: &str, extension: &str) -> Option<MediaType> {
        Self::of(&[media_type], &[extension])
    }

    /// Resolves the media type of the file at `path`.
    ///
    /// The extension of `path` is added to the given hints.
    /// If the hints are not conclusive, the content of the file is inspected.
    pub fn of_file(
        path: impl AsRef<Path>,
        media_types: &[&str],
        file_extensions: &[&str],
    ) -> Option<MediaType> {
        Self::of_file_with(path, media_types, file_extensions, SNIFFERS)
    }

    /// Same as [`Self::of_file`], with a custom list of `sniffers`.
    pub fn of_file_with(
        path: impl AsRef<Path>,
        media_types: &[&str],
        file_extensions: &[&str],
        sniffers: &[Sniffer],
    ) -> Option<MediaType> {
        let path = path.as_ref();
        let extension = path.extension().and_then(|extension| extension.to_str());
        let mut extensions = file_extensions.to_vec();
        extensions.extend(extension);

        Self::of_with(
            Some(SnifferContent::File(path.to_path_buf())),
            media_types,
            &extensions,
            sniffers,
        )
    }

    /// Resolves the media type of in-memory `bytes`.
    pub fn of_bytes(
        bytes: impl Into<Vec<u8>>,
        media_types: &[&str],
        file_extensions: &[&str],
    ) -> Option<MediaType> {
        Self::of_with(
            Some(SnifferContent::Bytes(bytes.into())),
            media_types,
            file_extensions,
            SNIFFERS,
        )
    }

    /// Resolves a media type using the given `sniffers`.
    ///
    /// 1. Light pass over media type hints only, then with file extensions as well.
    /// 2. Heavy pass inspecting the `content`, if any.
    /// 3. Fallback to system-known extensions and media types.
    /// 4. The first valid media type hint.
    pub fn of_with(
        content: Option<SnifferContent>,
        media_types: &[&str],
        file_extensions: &[&str],
        sniffers: &[Sniffer],
    ) -> Option<MediaType> {
        let sniff = |context: &SnifferContext| sniffers.iter().find_map(|sniffer| sniffer(context));

        // Light sniffing
        if !media_types.is_empty() {
            let context = SnifferContext::new(None, media_types, &[]);
            if let Some(media_type) = sniff(&context) {
                return Some(media_type);
            }
        }
        if !file_extensions.is_empty() {
            let context = SnifferContext::new(None, media_types, file_extensions);
            if let Some(media_type) = sniff(&context) {
                return Some(media_type);
            }
        }

        // Heavy sniffing
        let context = SnifferContext::new(content, media_types, file_extensions);
        if context.has_content() {
            if let Some(media_type) = sniff(&context) {
                log::debug!("Sniffed `{media_type}` from content");
                return Some(media_type);
            }
        }

        sniffer::sniff_system(&context).or_else(|| {
            media_types
                .iter()
                .find_map(|media_type| MediaType::parse(media_type).ok())
        })
    }
}

impl PartialEq for MediaType {
    fn eq(&self, other: &Self) -> bool {
        self.r#type == other.r#type
            && self.subtype == other.subtype
            && self.parameters.iter().eq(other.parameters.iter())
    }
}

impl Eq for MediaType {}

impl Hash for MediaType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.r#type.hash(state);
        self.subtype.hash(state);
        for parameter in self.parameters.iter() {
            parameter.hash(state);
        }
    }
}

impl Display for MediaType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.r#type, self.subtype)?;

        for (name, value) in self.parameters.iter() {
            write!(f, ";{name}={value}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for MediaType {
    type Err = MediaTypeError;

    fn from_str(value: &str) -> MediaTypeResult<Self> {
        Self::parse(value)
    }
}

impl TryFrom<&str> for MediaType {
    type Error = MediaTypeError;

    fn try_from(value: &str) -> MediaTypeResult<Self> {
        Self::parse(value)
    }
}

/// Canonicalizes a `charset` parameter value to its upper-case IANA name.
fn canonical_charset(charset: &str) -> String {
    let upper = charset.to_ascii_uppercase();

    match upper.as_str() {
        "UTF8" => "UTF-8",
        "UTF16" => "UTF-16",
        "ASCII" | "US_ASCII" | "ANSI_X3.4-1968" => "US-ASCII",
        "LATIN1" | "LATIN-1" | "ISO8859-1" | "ISO_8859-1" | "L1" => "ISO-8859-1",
        _ => return upper,
    }
    .to_owned()
}
