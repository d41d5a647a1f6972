use crate::publication::util::TestFile;
use rpub::fetcher::{ArchiveFetcher, Fetcher, Resource, ResourceError};
use rpub::manifest::Link;
use rpub::mediatype::MediaType;

fn epub() -> TestFile {
    TestFile::zip(
        "mimetype.epub",
        &[
            ("mimetype", b"application/epub+zip"),
            ("OEBPS/c1.xhtml", b"<html/>"),
        ],
    )
}

#[test]
fn test_mimetype_ranges() {
    let file = epub();
    let fetcher = ArchiveFetcher::open(file.path()).unwrap();
    let resource = fetcher.get(&Link::new("/mimetype"));

    assert_eq!(20, resource.length().unwrap());
    assert_eq!("application/epub+zip", resource.read_as_string().unwrap());
    assert_eq!(b"application/epub+zip", resource.read(0, 0).unwrap().as_slice());
    assert_eq!(b"application", resource.read(0, 10).unwrap().as_slice());
    assert_eq!(b"application/epub+zip", resource.read(-5, 60).unwrap().as_slice());
    assert!(matches!(resource.read(10, 5), Err(ResourceError::RangeNotSatisfiable { .. })));
    fetcher.close();
}

#[test]
fn test_missing_entry() {
    let file = epub();
    let fetcher = ArchiveFetcher::open(file.path()).unwrap();
    let resource = fetcher.get(&Link::new("/OEBPS/missing.xhtml"));

    assert!(matches!(resource.read(0, 0), Err(ResourceError::NotFound { .. })));
}

#[test]
fn test_sniff_archive_content() {
    #[rustfmt::skip]
    let expected: [(MediaType, TestFile); 3] = [
        (MediaType::CBZ, TestFile::zip("cbz.unknown", &[("page-1.jpg", b""), ("page-2.png", b"")])),
        (MediaType::EPUB, TestFile::zip("epub.unknown", &[("mimetype", b"application/epub+zip")])),
        (MediaType::ZAB, TestFile::zip("zab.unknown", &[("track-1.mp3", b""), ("track-2.ogg", b"")])),
    ];

    for (media_type, file) in expected {
        assert_eq!(Some(media_type.clone()), MediaType::of_file(file.path(), &[], &[]), "{media_type}");
    }
}
