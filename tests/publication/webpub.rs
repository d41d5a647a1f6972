use crate::publication::util::TestFile;
use rpub::errors::PublicationError;
use rpub::fetcher::Resource;
use rpub::manifest::{LinkList, Metadata};
use rpub::{Publication, PublicationOptions};

const MANIFEST: &str = r#"{
  "@context": "https://readium.org/webpub-manifest/context.jsonld",
  "metadata": {"title": "Moby-Dick", "identifier": "urn:isbn:978031600000X"},
  "links": [{"rel": "self", "href": "https://example.com/manifest.json", "type": "application/webpub+json"}],
  "readingOrder": [
    {"href": "chapter1.html", "type": "text/html"},
    {"href": "chapter2.html", "type": "text/html"}
  ]
}"#;

fn open(file: &TestFile) -> Publication {
    Publication::open(file.path(), PublicationOptions::default()).unwrap()
}

#[test]
fn test_packaged_webpub() {
    let file = TestFile::zip(
        "moby-dick.webpub",
        &[
            ("manifest.json", MANIFEST.as_bytes()),
            ("chapter1.html", b"<html>Call me Ishmael.</html>"),
            ("chapter2.html", b"<html/>"),
        ],
    );
    let publication = open(&file);
    let manifest = publication.manifest();

    assert_eq!("Moby-Dick", manifest.metadata.title());
    assert!(manifest.links.first_with_rel("self").is_none());
    assert!(manifest.links.first_with_rel("alternate").is_some());
    assert_eq!(
        "<html>Call me Ishmael.</html>",
        publication.get_href("/chapter1.html").read_as_string().unwrap(),
    );

    let positions = publication.positions();
    #[rustfmt::skip]
    let expected = [
        ("/chapter1.html", 1, 0.0),
        ("/chapter2.html", 2, 0.5),
    ];
    assert_eq!(expected.len(), positions.len());
    for (locator, (href, position, total_progression)) in positions.iter().zip(expected) {
        assert_eq!(href, locator.href);
        assert_eq!("text/html", locator.r#type);
        assert_eq!(Some(position), locator.locations.position);
        assert_eq!(Some(total_progression), locator.locations.total_progression);
    }
}

#[test]
fn test_comic_book() {
    let file = TestFile::zip(
        "comic.cbz",
        &[
            ("Moby-Dick/page-2.png", b"\x89PNG"),
            ("Moby-Dick/page-1.jpg", b"\xFF\xD8\xFF"),
            ("Moby-Dick/.hidden.jpg", b""),
            ("Moby-Dick/ComicInfo.xml", b"<ComicInfo/>"),
        ],
    );
    let publication = open(&file);
    let manifest = publication.manifest();

    assert_eq!("Moby-Dick", manifest.metadata.title());
    assert_eq!(vec![Metadata::PROFILE_DIVINA.to_owned()], manifest.metadata.conforms_to);

    let hrefs = manifest.reading_order.iter().map(|link| link.href.as_str()).collect::<Vec<_>>();
    assert_eq!(vec!["/Moby-Dick/page-1.jpg", "/Moby-Dick/page-2.png"], hrefs);
    assert!(manifest.reading_order[0].has_rel("cover"));
    assert!(!manifest.reading_order[1].has_rel("cover"));

    assert_eq!(2, publication.positions().len());
    assert_eq!("image/jpeg", publication.positions()[0].r#type);
}

#[test]
fn test_audio_archive() {
    let file = TestFile::zip(
        "tracks.zab",
        &[
            ("track-2.ogg", b"OggS"),
            ("track-1.mp3", b"ID3"),
            ("playlist.m3u", b"track-1.mp3"),
        ],
    );
    let publication = open(&file);
    let manifest = publication.manifest();

    assert_eq!("tracks", manifest.metadata.title());
    assert_eq!(vec![Metadata::PROFILE_AUDIOBOOK.to_owned()], manifest.metadata.conforms_to);

    let hrefs = manifest.reading_order.iter().map(|link| link.href.as_str()).collect::<Vec<_>>();
    assert_eq!(vec!["/track-1.mp3", "/track-2.ogg"], hrefs);
    assert_eq!(2, publication.positions().len());
}

#[test]
fn test_unsupported_format() {
    let file = TestFile::zip("notes.zip", &[("notes.txt", b"Hello")]);
    let result = Publication::open(file.path(), PublicationOptions::default());

    assert!(matches!(result, Err(PublicationError::UnsupportedFormat(_))));
}
