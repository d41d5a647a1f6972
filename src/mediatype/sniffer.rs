//! Sniffers resolving a [`MediaType`] from a [`SnifferContext`].
//!
//! # Overview
//! A [`Sniffer`] is a plain function returning the media type it recognizes, if any.
//! Each sniffer is run twice by [`MediaType::of_with`]:
//! - A light pass where the [context](SnifferContext) only carries hints.
//! - A heavy pass where the context may also inspect the content.
//!
//! Specialized formats must come before the generic containers they are built on,
//! such as EPUB before ZIP, or an LCP license before JSON.
//! [`SNIFFERS`] lists the default sniffers in that order.

mod context;

use crate::archive::Archive;
use crate::mediatype::MediaType;
use crate::util::uri;
use serde_json::{Map, Value};

pub use self::context::{MAX_READ_SIZE, SnifferContent, SnifferContext};

/// A function resolving a media type from a [`SnifferContext`].
pub type Sniffer = fn(&SnifferContext) -> Option<MediaType>;

/// The default sniffers, in order of precedence.
pub const SNIFFERS: &[Sniffer] = &[
    sniff_epub,
    sniff_lpf,
    sniff_archive,
    sniff_pdf,
    sniff_xhtml,
    sniff_html,
    sniff_bitmap,
    sniff_audio,
    sniff_opds,
    sniff_lcp_license,
    sniff_w3c_wpub,
    sniff_webpub,
];

const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";
const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/Atom";
const PROFILE_AUDIOBOOK: &str = "https://readium.org/webpub-manifest/profiles/audiobook";
const PROFILE_DIVINA: &str = "https://readium.org/webpub-manifest/profiles/divina";

/// Bitmaps and comic metadata; AVIF and JXL are excluded.
const CBZ_EXTENSIONS: &[&str] = &[
    "bmp", "dib", "gif", "jif", "jfi", "jfif", "jpg", "jpeg", "png", "tif", "tiff", "webp", "acbf",
    "xml", "txt",
];

/// Audio files and playlists.
const ZAB_EXTENSIONS: &[&str] = &[
    "aac", "aiff", "alac", "flac", "m4a", "m4b", "mp3", "ogg", "oga", "mogg", "opus", "wav", "webm",
    "asx", "bio", "m3u", "m3u8", "pla", "pls", "smil", "vlc", "wpl", "xspf", "zpl",
];

/// Formats known to the host system that no dedicated sniffer handles.
const SYSTEM: &[(&str, MediaType)] = &[
    ("acsm", MediaType::ACSM),
    ("avi", MediaType::AVI),
    ("css", MediaType::CSS),
    ("gz", MediaType::GZ),
    ("js", MediaType::JAVASCRIPT),
    ("mjs", MediaType::JAVASCRIPT),
    ("json", MediaType::JSON),
    ("mpeg", MediaType::MPEG),
    ("mpg", MediaType::MPEG),
    ("ncx", MediaType::NCX),
    ("ogv", MediaType::OGV),
    ("opf", MediaType::OPF),
    ("otf", MediaType::OTF),
    ("smil", MediaType::SMIL),
    ("svg", MediaType::SVG),
    ("ttf", MediaType::TTF),
    ("txt", MediaType::TEXT),
    ("woff", MediaType::WOFF),
    ("woff2", MediaType::WOFF2),
    ("xml", MediaType::XML),
    ("zip", MediaType::ZIP),
];

/// Sniffs an HTML document.
pub fn sniff_html(context: &SnifferContext) -> Option<MediaType> {
    if context.has_file_extension(&["htm", "html"]) || context.has_media_type(&["text/html"]) {
        return Some(MediaType::HTML);
    }
    if context
        .content_as_xml()
        .is_some_and(|document| document.root().local_name() == "html")
    {
        return Some(MediaType::HTML);
    }
    let content = context.content_as_string()?.trim_start();
    content
        .get(..15)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("<!doctype html>"))
        .then_some(MediaType::HTML)
}

/// Sniffs an XHTML document.
pub fn sniff_xhtml(context: &SnifferContext) -> Option<MediaType> {
    if context.has_file_extension(&["xht", "xhtml"])
        || context.has_media_type(&["application/xhtml+xml"])
    {
        return Some(MediaType::XHTML);
    }
    context
        .content_as_xml()
        .is_some_and(|document| document.root().is(XHTML_NAMESPACE, "html"))
        .then_some(MediaType::XHTML)
}

/// Sniffs an OPDS document.
pub fn sniff_opds(context: &SnifferContext) -> Option<MediaType> {
    // OPDS 1 entries carry more parameters than feeds, so they are checked first
    if context.has_media_type(&["application/atom+xml;type=entry;profile=opds-catalog"]) {
        return Some(MediaType::OPDS1_ENTRY);
    }
    if context.has_media_type(&["application/atom+xml;profile=opds-catalog"]) {
        return Some(MediaType::OPDS1);
    }
    if context.has_media_type(&["application/opds+json"]) {
        return Some(MediaType::OPDS2);
    }
    if context.has_media_type(&["application/opds-publication+json"]) {
        return Some(MediaType::OPDS2_PUBLICATION);
    }
    if context.has_media_type(&[
        "application/opds-authentication+json",
        "application/vnd.opds.authentication.v1.0+json",
    ]) {
        return Some(MediaType::OPDS_AUTHENTICATION);
    }

    if let Some(root) = context.content_as_xml().map(|document| document.root()) {
        if root.is(ATOM_NAMESPACE, "feed") {
            return Some(MediaType::OPDS1);
        } else if root.is(ATOM_NAMESPACE, "entry") {
            return Some(MediaType::OPDS1_ENTRY);
        }
    }
    context
        .contains_json_keys(&["id", "title", "authentication"])
        .then_some(MediaType::OPDS_AUTHENTICATION)
}

/// Sniffs an LCP license document.
pub fn sniff_lcp_license(context: &SnifferContext) -> Option<MediaType> {
    if context.has_file_extension(&["lcpl"])
        || context.has_media_type(&["application/vnd.readium.lcp.license.v1.0+json"])
        || context.contains_json_keys(&["id", "issued", "provider", "encryption"])
    {
        return Some(MediaType::LCP_LICENSE_DOCUMENT);
    }
    None
}

/// Sniffs a bitmap image.
pub fn sniff_bitmap(context: &SnifferContext) -> Option<MediaType> {
    #[rustfmt::skip]
    let candidates: [(&[&str], &[&str], MediaType); 8] = [
        (&["avif"], &["image/avif"], MediaType::AVIF),
        (&["bmp", "dib"], &["image/bmp", "image/x-bmp"], MediaType::BMP),
        (&["gif"], &["image/gif"], MediaType::GIF),
        (&["jpg", "jpeg", "jpe", "jif", "jfif", "jfi"], &["image/jpeg"], MediaType::JPEG),
        (&["jxl"], &["image/jxl"], MediaType::JXL),
        (&["png"], &["image/png"], MediaType::PNG),
        (&["tiff", "tif"], &["image/tiff", "image/tiff-fx"], MediaType::TIFF),
        (&["webp"], &["image/webp"], MediaType::WEBP),
    ];
    sniff_candidates(context, candidates)
}

/// Sniffs an audio file.
pub fn sniff_audio(context: &SnifferContext) -> Option<MediaType> {
    #[rustfmt::skip]
    let candidates: [(&[&str], &[&str], MediaType); 9] = [
        (&["aac"], &["audio/aac"], MediaType::AAC),
        (&["aiff", "aif"], &["audio/aiff", "audio/x-aiff"], MediaType::AIFF),
        (&["flac"], &["audio/flac"], MediaType::FLAC),
        (&["m4a", "m4b", "mp4"], &["audio/mp4"], MediaType::MP4_AUDIO),
        (&["mp3"], &["audio/mpeg"], MediaType::MP3),
        (&["ogg", "oga"], &["audio/ogg"], MediaType::OGG),
        (&["opus"], &["audio/opus"], MediaType::OPUS),
        (&["wav"], &["audio/wav", "audio/x-wav"], MediaType::WAV),
        (&["webm"], &["audio/webm"], MediaType::WEBM_AUDIO),
    ];
    sniff_candidates(context, candidates)
}

fn sniff_candidates<const N: usize>(
    context: &SnifferContext,
    candidates: [(&[&str], &[&str], MediaType); N],
) -> Option<MediaType> {
    candidates
        .into_iter()
        .find(|(extensions, media_types, _)| {
            context.has_file_extension(extensions) || context.has_media_type(media_types)
        })
        .map(|(_, _, media_type)| media_type)
}

/// Sniffs a Readium Web Publication, packaged or as a manifest.
pub fn sniff_webpub(context: &SnifferContext) -> Option<MediaType> {
    #[rustfmt::skip]
    let candidates: [(&[&str], &[&str], MediaType); 8] = [
        (&["audiobook"], &["application/audiobook+zip"], MediaType::READIUM_AUDIOBOOK),
        (&[], &["application/audiobook+json"], MediaType::READIUM_AUDIOBOOK_MANIFEST),
        (&["divina"], &["application/divina+zip"], MediaType::DIVINA),
        (&[], &["application/divina+json"], MediaType::DIVINA_MANIFEST),
        (&["webpub"], &["application/webpub+zip"], MediaType::READIUM_WEBPUB),
        (&[], &["application/webpub+json"], MediaType::READIUM_WEBPUB_MANIFEST),
        (&["lcpa"], &["application/audiobook+lcp"], MediaType::LCP_PROTECTED_AUDIOBOOK),
        (&["lcpdf"], &["application/pdf+lcp"], MediaType::LCP_PROTECTED_PDF),
    ];
    if let Some(media_type) = sniff_candidates(context, candidates) {
        return Some(media_type);
    }

    // A manifest, either standalone or packaged in an archive
    if let Some(manifest) = context.content_as_json().filter(|json| is_rwpm(json)) {
        return Some(match manifest_profile(manifest) {
            Profile::Audiobook => MediaType::READIUM_AUDIOBOOK_MANIFEST,
            Profile::Divina => MediaType::DIVINA_MANIFEST,
            Profile::Other => MediaType::READIUM_WEBPUB_MANIFEST,
        });
    }
    let manifest = context.read_archive_entry_at("manifest.json")?;
    let manifest = serde_json::from_slice::<Map<String, Value>>(&manifest).ok()?;

    Some(match manifest_profile(&manifest) {
        Profile::Audiobook => MediaType::READIUM_AUDIOBOOK,
        Profile::Divina => MediaType::DIVINA,
        Profile::Other => MediaType::READIUM_WEBPUB,
    })
}

enum Profile {
    Audiobook,
    Divina,
    Other,
}

fn is_rwpm(json: &Map<String, Value>) -> bool {
    json.get("metadata").is_some_and(Value::is_object)
        && (json.contains_key("readingOrder") || json.contains_key("spine"))
}

fn manifest_profile(manifest: &Map<String, Value>) -> Profile {
    let conforms_to = manifest
        .get("metadata")
        .and_then(|metadata| metadata.get("conformsTo"));
    let has_profile = |profile: &str| match conforms_to {
        Some(Value::String(value)) => value == profile,
        Some(Value::Array(values)) => values.iter().any(|value| value == profile),
        _ => false,
    };

    if has_profile(PROFILE_AUDIOBOOK) {
        Profile::Audiobook
    } else if has_profile(PROFILE_DIVINA) {
        Profile::Divina
    } else {
        Profile::Other
    }
}

/// Sniffs a W3C Web Publication manifest.
pub fn sniff_w3c_wpub(context: &SnifferContext) -> Option<MediaType> {
    context
        .content_as_json()
        .is_some_and(|json| has_json_context(json, "https://www.w3.org/ns/wp-context"))
        .then_some(MediaType::W3C_WPUB_MANIFEST)
}

fn has_json_context(json: &Map<String, Value>, expected: &str) -> bool {
    match json.get("@context") {
        Some(Value::Array(values)) => values.iter().any(|value| value == expected),
        _ => false,
    }
}

/// Sniffs an EPUB publication.
pub fn sniff_epub(context: &SnifferContext) -> Option<MediaType> {
    if context.has_file_extension(&["epub"]) || context.has_media_type(&["application/epub+zip"]) {
        return Some(MediaType::EPUB);
    }
    let mimetype = context.read_archive_entry_at("mimetype")?;

    (String::from_utf8_lossy(&mimetype).trim() == "application/epub+zip").then_some(MediaType::EPUB)
}

/// Sniffs a Lightweight Packaging Format publication.
///
/// See <https://www.w3.org/TR/lpf/>.
pub fn sniff_lpf(context: &SnifferContext) -> Option<MediaType> {
    if context.has_file_extension(&["lpf"])
        || context.has_media_type(&["application/lpf+zip"])
        || context.contains_archive_entry_at("index.html")
    {
        return Some(MediaType::LPF);
    }
    let publication = context.read_archive_entry_at("publication.json")?;
    let publication = serde_json::from_slice::<Map<String, Value>>(&publication).ok()?;

    has_json_context(&publication, "https://www.w3.org/ns/pub-context").then_some(MediaType::LPF)
}

/// Sniffs a Comic Book Archive or a Zipped Audio Book.
///
/// Without hints, an archive qualifies when every visible entry has an extension
/// from the format's allow-list.
pub fn sniff_archive(context: &SnifferContext) -> Option<MediaType> {
    if context.has_file_extension(&["cbz"])
        || context.has_media_type(&[
            "application/vnd.comicbook+zip",
            "application/x-cbz",
            "application/x-cbr",
        ])
    {
        return Some(MediaType::CBZ);
    }
    if context.has_file_extension(&["zab"]) {
        return Some(MediaType::ZAB);
    }

    let archive = context.content_as_archive()?;
    if archive_contains_only(archive, CBZ_EXTENSIONS) {
        Some(MediaType::CBZ)
    } else if archive_contains_only(archive, ZAB_EXTENSIONS) {
        Some(MediaType::ZAB)
    } else {
        None
    }
}

fn archive_contains_only(archive: &Archive, extensions: &[&str]) -> bool {
    let Ok(entries) = archive.entries() else {
        return false;
    };
    let mut visible = entries
        .iter()
        .map(|entry| entry.path().trim_start_matches('/'))
        .filter(|path| !is_ignored(path))
        .peekable();

    visible.peek().is_some()
        && visible.all(|path| {
            file_extension(path).is_some_and(|extension| extensions.contains(&extension.as_str()))
        })
}

/// Hidden files and operating system artifacts.
pub(crate) fn is_ignored(path: &str) -> bool {
    let filename = path.rsplit('/').next().unwrap_or(path);

    path.starts_with("__MACOSX")
        || path.split('/').any(|segment| segment.starts_with('.'))
        || filename == "Thumbs.db"
}

fn file_extension(path: &str) -> Option<String> {
    let filename = uri::decode(path.rsplit('/').next()?).into_owned();
    let (_, extension) = filename.rsplit_once('.')?;
    Some(extension.to_ascii_lowercase())
}

/// Sniffs a PDF document.
pub fn sniff_pdf(context: &SnifferContext) -> Option<MediaType> {
    if context.has_file_extension(&["pdf"])
        || context.has_media_type(&["application/pdf"])
        || context.read(0, 4).is_some_and(|magic| magic == b"%PDF-")
    {
        return Some(MediaType::PDF);
    }
    None
}

/// Resolves formats known to the host system from the hints of `context`.
///
/// Media type hints are checked before file extensions.
pub fn sniff_system(context: &SnifferContext) -> Option<MediaType> {
    let by_media_type = context.media_types().iter().find_map(|hint| {
        SYSTEM
            .iter()
            .find(|(_, media_type)| media_type.contains(hint))
            .map(|(_, media_type)| media_type.clone())
    });

    by_media_type.or_else(|| {
        context.file_extensions().iter().find_map(|hint| {
            SYSTEM
                .iter()
                .find(|(extension, _)| *extension == hint.as_str())
                .map(|(_, media_type)| media_type.clone())
        })
    })
}

#[cfg(test)]
mod tests {
    use crate::mediatype::MediaType;
    use std::io::Write;

    fn zip(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, content) in entries {
            writer
                .start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_light_sniffing() {
        #[rustfmt::skip]
        let expected: &[(MediaType, &[&str], &[&str])] = &[
            (MediaType::READIUM_AUDIOBOOK, &[], &["audiobook"]),
            (MediaType::READIUM_AUDIOBOOK, &["application/audiobook+zip"], &[]),
            (MediaType::AVIF, &["image/avif"], &[]),
            (MediaType::BMP, &[], &["dib"]),
            (MediaType::BMP, &["image/x-bmp"], &[]),
            (MediaType::CBZ, &[], &["cbz"]),
            (MediaType::CBZ, &["application/x-cbr"], &[]),
            (MediaType::DIVINA, &[], &["divina"]),
            (MediaType::DIVINA_MANIFEST, &["application/divina+json"], &[]),
            (MediaType::EPUB, &[], &["epub"]),
            (MediaType::HTML, &[], &["htm"]),
            (MediaType::HTML, &["text/html;charset=utf-8"], &[]),
            (MediaType::XHTML, &[], &["xht"]),
            (MediaType::JPEG, &[], &["jpe"]),
            (MediaType::OPDS1, &["application/atom+xml;profile=opds-catalog"], &[]),
            (MediaType::OPDS1_ENTRY, &["application/atom+xml;type=entry;profile=opds-catalog"], &[]),
            (MediaType::OPDS_AUTHENTICATION, &["application/vnd.opds.authentication.v1.0+json"], &[]),
            (MediaType::LCP_PROTECTED_AUDIOBOOK, &[], &["lcpa"]),
            (MediaType::LCP_PROTECTED_PDF, &["application/pdf+lcp"], &[]),
            (MediaType::LCP_LICENSE_DOCUMENT, &[], &["lcpl"]),
            (MediaType::LPF, &[], &["lpf"]),
            (MediaType::PDF, &[], &["pdf"]),
            (MediaType::ZAB, &[], &["zab"]),
            (MediaType::MP3, &[], &["mp3"]),
            (MediaType::CSS, &["text/css"], &[]),
            (MediaType::NCX, &[], &["ncx"]),
            (MediaType::OPF, &[], &["opf"]),
            (MediaType::XML, &[], &["xml"]),
        ];

        for (expect, media_types, extensions) in expected {
            assert_eq!(Some(expect.clone()), MediaType::of(media_types, extensions), "{expect}");
        }
    }

    #[test]
    fn test_media_type_hint_has_precedence() {
        assert_eq!(
            Some(MediaType::PDF),
            MediaType::of_string_and_extension("application/pdf", "epub"),
        );
    }

    #[test]
    fn test_unknown_and_fallback() {
        let grapes = MediaType::parse("fruit/grapes").unwrap();

        assert_eq!(None, MediaType::of_string("invalid"));
        assert_eq!(Some(grapes.clone()), MediaType::of(&["invalid", "fruit/grapes"], &[]));
        assert_eq!(Some(grapes), MediaType::of(&["fruit/grapes", "vegetable/broccoli"], &[]));
        assert_eq!(None, MediaType::of_bytes(b"unknown content".to_vec(), &[], &[]));
    }

    #[test]
    fn test_heavy_sniffing() {
        #[rustfmt::skip]
        let expected = [
            (MediaType::HTML, b"  <!DOCTYPE HTML><html><body></body></html>".to_vec()),
            (MediaType::XHTML, br#"<?xml version="1.0"?><html xmlns="http://www.w3.org/1999/xhtml"><body/></html>"#.to_vec()),
            (MediaType::OPDS1, br#"<feed xmlns="http://www.w3.org/2005/Atom"><id>1</id></feed>"#.to_vec()),
            (MediaType::OPDS1_ENTRY, br#"<entry xmlns="http://www.w3.org/2005/Atom"><id>1</id></entry>"#.to_vec()),
            (MediaType::OPDS_AUTHENTICATION, br#"{"id": "a", "title": "b", "authentication": []}"#.to_vec()),
            (MediaType::LCP_LICENSE_DOCUMENT, br#"{"id": "a", "issued": "b", "provider": "c", "encryption": {}}"#.to_vec()),
            (MediaType::W3C_WPUB_MANIFEST, br#"{"@context": ["https://schema.org", "https://www.w3.org/ns/wp-context"]}"#.to_vec()),
            (MediaType::READIUM_AUDIOBOOK_MANIFEST, br#"{"metadata": {"title": "t", "conformsTo": "https://readium.org/webpub-manifest/profiles/audiobook"}, "readingOrder": []}"#.to_vec()),
            (MediaType::PDF, b"%PDF-1.7\n%".to_vec()),
            (MediaType::CBZ, zip(&[("page-1.jpg", ""), ("page-2.PNG", ""), ("ComicInfo.xml", ""), ("__MACOSX/._page-1.jpg", ""), (".hidden", "")])),
            (MediaType::ZAB, zip(&[("track-1.mp3", ""), ("track-2.ogg", ""), ("playlist.m3u", ""), ("Thumbs.db", "")])),
            (MediaType::EPUB, zip(&[("mimetype", "application/epub+zip"), ("META-INF/container.xml", "<container/>")])),
            (MediaType::READIUM_WEBPUB, zip(&[("manifest.json", r#"{"metadata": {"title": "t"}, "readingOrder": []}"#), ("chapter.html", "")])),
        ];

        for (expect, bytes) in expected {
            assert_eq!(Some(expect.clone()), MediaType::of_bytes(bytes, &[], &[]), "{expect}");
        }
    }

    #[test]
    fn test_sniff_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cbz.unknown");
        std::fs::write(&path, zip(&[("page-1.jpg", ""), ("page-2.png", ""), ("info.xml", "")])).unwrap();

        assert_eq!(Some(MediaType::CBZ), MediaType::of_file(&path, &[], &[]));
    }

    #[test]
    fn test_canonical() {
        assert_eq!(MediaType::CBZ, MediaType::parse("application/x-cbz").unwrap().canonical());
        assert_eq!(Some("cbz"), MediaType::parse("application/x-cbz").unwrap().canonical().file_extension());

        let unknown = MediaType::parse("application/unknown;charset=utf-8").unwrap();
        assert_eq!(unknown, unknown.canonical());
    }
}
