use crate::archive::{Archive, ArchiveResult};
use crate::fetcher::{
    BoxedResource, EntryResource, FailureResource, Fetcher, ResourceError, ResourceResult,
};
use crate::manifest::Link;
use crate::mediatype::MediaType;
use std::path::Path;

/// Provides access to the entries of an [`Archive`].
///
/// Entries are exposed as `/`-prefixed hrefs (e.g., `/OEBPS/content.opf`).
/// Each retrieved resource carries the `archive` properties of its entry:
/// ```json
/// { "archive": { "entryLength": 595, "isEntryCompressed": true } }
/// ```
#[derive(Clone, Debug)]
pub struct ArchiveFetcher {
    archive: Archive,
}

impl ArchiveFetcher {
    pub fn new(archive: Archive) -> Self {
        Self { archive }
    }

    /// Opens the ZIP file or exploded directory at `path`.
    pub fn open(path: impl AsRef<Path>) -> ArchiveResult<Self> {
        Archive::open(path).map(Self::new)
    }

    pub fn archive(&self) -> &Archive {
        &self.archive
    }
}

/// The media type of an entry, guessed from its file extension.
fn media_type_of(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .and_then(|extension| extension.to_str())
        .and_then(MediaType::of_extension)
        .map(|media_type| media_type.to_string())
}

impl Fetcher for ArchiveFetcher {
    fn links(&self) -> ResourceResult<Vec<Link>> {
        let entries = self.archive.entries()?;

        Ok(entries
            .iter()
            .map(|entry| {
                log::trace!("Listing archive entry `{}`", entry.path());
                let mut link = Link::new(entry.path());
                link.r#type = media_type_of(entry.path());
                link
            })
            .collect())
    }

    fn get(&self, link: &Link) -> BoxedResource {
        let path = super::resource_path(&link.href);

        match self.archive.entry(path) {
            Ok(entry) => Box::new(EntryResource::new(link.clone(), entry)),
            Err(error) => {
                log::debug!("No archive entry for `{}`: {error}", link.href);
                Box::new(FailureResource::new(link.clone(), ResourceError::from(error)))
            }
        }
    }

    fn close(&self) {
        self.archive.close();
    }
}

#[cfg(test)]
mod tests {
    use super::ArchiveFetcher;
    use crate::archive::Archive;
    use crate::fetcher::{Fetcher, ResourceError};
    use crate::manifest::{ArchiveProperties, Link};
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    fn fetcher() -> ArchiveFetcher {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file("mimetype", stored).unwrap();
        zip.write_all(b"application/epub+zip").unwrap();
        zip.add_directory("EPUB/", stored).unwrap();
        zip.start_file("EPUB/c1.xhtml", deflated).unwrap();
        zip.write_all("<html>".repeat(100).as_bytes()).unwrap();
        zip.start_file("EPUB/cover.jpg", stored).unwrap();
        zip.write_all(b"\xFF\xD8\xFF").unwrap();

        let bytes = zip.finish().unwrap().into_inner();
        ArchiveFetcher::new(Archive::from_bytes(bytes).unwrap())
    }

    #[test]
    fn test_links() {
        let links = fetcher().links().unwrap();

        #[rustfmt::skip]
        let expected = [
            ("/mimetype", None),
            ("/EPUB/c1.xhtml", Some("application/xhtml+xml")),
            ("/EPUB/cover.jpg", Some("image/jpeg")),
        ];

        assert_eq!(expected.len(), links.len());
        for (link, (href, r#type)) in links.iter().zip(expected) {
            assert_eq!(href, link.href);
            assert_eq!(r#type, link.r#type.as_deref());
        }
    }

    #[test]
    fn test_mimetype_entry() {
        let fetcher = fetcher();
        let resource = fetcher.get(&Link::new("/mimetype"));

        assert_eq!(20, resource.length().unwrap());
        assert_eq!(b"application/epub+zip", resource.read(0, 0).unwrap().as_slice());
        assert_eq!(b"application", resource.read(0, 10).unwrap().as_slice());
        assert_eq!(b"application/epub+zip", resource.read(-5, 60).unwrap().as_slice());
    }

    #[test]
    fn test_archive_properties() {
        let fetcher = fetcher();
        let stored = fetcher.get(&Link::new("/mimetype"));
        let compressed = fetcher.get(&Link::new("/EPUB/c1.xhtml#section"));

        assert_eq!(
            Some(ArchiveProperties {
                entry_length: 20,
                is_entry_compressed: false,
            }),
            stored.link().properties.archive(),
        );

        let archive = compressed.link().properties.archive().unwrap();
        assert!(archive.is_entry_compressed);
        assert!(archive.entry_length < 600);
        assert_eq!(600, compressed.length().unwrap());
    }

    #[test]
    fn test_missing_and_closed() {
        let fetcher = fetcher();
        let missing = fetcher.get(&Link::new("/EPUB/missing.xhtml"));
        let escaping = fetcher.get(&Link::new("/../secret"));
        let resource = fetcher.get(&Link::new("/mimetype"));

        assert!(matches!(missing.read(0, 0), Err(ResourceError::NotFound { .. })));
        assert!(matches!(escaping.read(0, 0), Err(ResourceError::NotFound { .. })));

        fetcher.close();
        assert!(resource.read(0, 0).is_err());
        assert!(fetcher.links().is_err());
    }
}
