use crate::archive::Archive;
use crate::mediatype::MediaType;
use crate::parser::XmlDocument;
use crate::util::sync::Memo;
use crate::util::utf;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;

/// Files larger than this are never loaded in full while sniffing.
pub const MAX_READ_SIZE: u64 = 5 * 1024 * 1024;

/// The content being sniffed.
#[derive(Clone, Debug)]
pub enum SnifferContent {
    /// A file or directory on the local file system.
    File(PathBuf),
    /// In-memory bytes.
    Bytes(Vec<u8>),
}

impl SnifferContent {
    fn read_all(&self) -> Option<Vec<u8>> {
        match self {
            Self::Bytes(bytes) => Some(bytes.clone()),
            Self::File(path) => {
                let metadata = path.metadata().ok()?;
                if !metadata.is_file() || metadata.len() > MAX_READ_SIZE {
                    return None;
                }
                std::fs::read(path).ok()
            }
        }
    }

    fn read(&self, start: u64, end: u64) -> Option<Vec<u8>> {
        let length = end.checked_sub(start)?.checked_add(1)?;

        match self {
            Self::Bytes(bytes) => {
                let start = usize::try_from(start).ok()?;
                let end = usize::try_from(end.saturating_add(1)).ok()?.min(bytes.len());
                bytes.get(start..end).map(<[u8]>::to_vec)
            }
            Self::File(path) => {
                if !path.is_file() {
                    return None;
                }
                let mut file = File::open(path).ok()?;
                file.seek(SeekFrom::Start(start)).ok()?;

                let mut data = Vec::new();
                file.take(length).read_to_end(&mut data).ok()?;
                Some(data)
            }
        }
    }

    fn open_archive(&self) -> Option<Archive> {
        match self {
            Self::Bytes(bytes) => Archive::from_bytes(bytes.clone()).ok(),
            Self::File(path) => Archive::open(path).ok(),
        }
    }
}

/// Hints and content available to a [`Sniffer`](super::Sniffer).
///
/// Interpretations of the content (string, XML, JSON, archive) are computed
/// on first access and then shared by every sniffer of the same pass.
/// Without content, all of them are [`None`].
pub struct SnifferContext {
    content: Option<SnifferContent>,
    media_types: Vec<MediaType>,
    file_extensions: Vec<String>,
    bytes: Memo<Option<Vec<u8>>>,
    string: Memo<Option<String>>,
    xml: Memo<Option<XmlDocument>>,
    json: Memo<Option<Map<String, Value>>>,
    archive: Memo<Option<Archive>>,
}

impl SnifferContext {
    /// Creates a context; unparsable `media_types` hints are ignored.
    pub fn new(content: Option<SnifferContent>, media_types: &[&str], file_extensions: &[&str]) -> Self {
        Self {
            content,
            media_types: media_types
                .iter()
                .filter_map(|media_type| MediaType::parse(media_type).ok())
                .collect(),
            file_extensions: file_extensions
                .iter()
                .map(|extension| extension.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            bytes: Memo::new(),
            string: Memo::new(),
            xml: Memo::new(),
            json: Memo::new(),
            archive: Memo::new(),
        }
    }

    /// Returns `true` if the context may inspect content.
    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }

    /// The valid media type hints.
    pub fn media_types(&self) -> &[MediaType] {
        &self.media_types
    }

    /// The lower-cased file extension hints.
    pub fn file_extensions(&self) -> &[String] {
        &self.file_extensions
    }

    /// The charset declared by the first media type hint that has one.
    pub fn charset(&self) -> Option<&str> {
        self.media_types.iter().find_map(MediaType::charset)
    }

    /// Returns `true` if any of the file extension hints equals one of `extensions`,
    /// ignoring case.
    pub fn has_file_extension(&self, extensions: &[&str]) -> bool {
        extensions.iter().any(|extension| {
            self.file_extensions
                .iter()
                .any(|hint| hint.eq_ignore_ascii_case(extension))
        })
    }

    /// Returns `true` if any of `media_types` contains one of the media type hints.
    ///
    /// For instance, `text/html` is satisfied by the hint `text/html;charset=utf-8`.
    pub fn has_media_type(&self, media_types: &[&str]) -> bool {
        media_types
            .iter()
            .filter_map(|media_type| MediaType::parse(media_type).ok())
            .any(|candidate| self.media_types.iter().any(|hint| candidate.contains(hint)))
    }

    /// The entire content, unless it exceeds [`MAX_READ_SIZE`].
    pub fn content(&self) -> Option<&[u8]> {
        self.bytes
            .get_or_init(|| self.content.as_ref()?.read_all())
            .as_deref()
    }

    /// The content decoded according to the declared [charset](Self::charset).
    pub fn content_as_string(&self) -> Option<&str> {
        self.string
            .get_or_init(|| utf::decode(self.content()?.to_vec(), self.charset()).ok())
            .as_deref()
    }

    /// The content parsed as an XML document.
    pub fn content_as_xml(&self) -> Option<&XmlDocument> {
        self.xml
            .get_or_init(|| XmlDocument::parse(self.content()?).ok())
            .as_ref()
    }

    /// The content parsed as a JSON object.
    pub fn content_as_json(&self) -> Option<&Map<String, Value>> {
        self.json
            .get_or_init(|| serde_json::from_str(self.content_as_string()?).ok())
            .as_ref()
    }

    /// The content opened as an [`Archive`], either a ZIP or an exploded directory.
    pub fn content_as_archive(&self) -> Option<&Archive> {
        self.archive
            .get_or_init(|| self.content.as_ref()?.open_archive())
            .as_ref()
    }

    /// Reads the inclusive `start..=end` range of the content.
    pub fn read(&self, start: u64, end: u64) -> Option<Vec<u8>> {
        self.content.as_ref()?.read(start, end)
    }

    /// Returns `true` if the content is a JSON object containing all `keys`.
    pub fn contains_json_keys(&self, keys: &[&str]) -> bool {
        !keys.is_empty()
            && self
                .content_as_json()
                .is_some_and(|json| keys.iter().all(|key| json.contains_key(*key)))
    }

    /// Returns `true` if the content is an archive with an entry at `path`.
    pub fn contains_archive_entry_at(&self, path: &str) -> bool {
        self.content_as_archive()
            .is_some_and(|archive| archive.entry(path).is_ok())
    }

    /// Reads the entire archive entry at `path`.
    pub fn read_archive_entry_at(&self, path: &str) -> Option<Vec<u8>> {
        self.content_as_archive()?.entry(path).ok()?.read(0, 0).ok()
    }
}

impl Drop for SnifferContext {
    fn drop(&mut self) {
        if let Some(archive) = self.archive.get().and_then(Option::as_ref) {
            archive.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SnifferContent, SnifferContext};

    #[test]
    fn test_hints() {
        let context = SnifferContext::new(None, &["text/html;charset=utf-8", "invalid"], &["XHTML"]);

        assert_eq!(1, context.media_types().len());
        assert_eq!(Some("UTF-8"), context.charset());
        assert!(context.has_file_extension(&["xhtml"]));
        assert!(context.has_media_type(&["text/html"]));
        assert!(!context.has_media_type(&["application/xhtml+xml"]));
        assert!(!context.has_content());
        assert_eq!(None, context.content_as_string());
    }

    #[test]
    fn test_content() {
        let content = SnifferContent::Bytes(br#"{"id": "1", "title": "t", "authentication": []}"#.to_vec());
        let context = SnifferContext::new(Some(content), &[], &[]);

        assert!(context.contains_json_keys(&["id", "title", "authentication"]));
        assert!(!context.contains_json_keys(&["id", "issued"]));
        assert!(!context.contains_json_keys(&[]));
        assert!(context.content_as_xml().is_none());
        assert!(context.content_as_archive().is_none());
        assert_eq!(Some(b"{\"id\"".to_vec()), context.read(0, 4));
    }
}
