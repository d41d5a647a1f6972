use crate::publication::util::TestFile;
use rpub::epub::{EpubSettings, MediaOverlayService, ReflowableStrategy};
use rpub::fetcher::Resource;
use rpub::manifest::GuidedNavigationDocument;
use rpub::mediatype::MediaType;
use rpub::publication::POSITIONS_HREF;
use rpub::{Publication, PublicationOptions};
use sha1::{Digest, Sha1};

const IDENTIFIER: &str = "urn:uuid:36d5078e-ff7d-468e-a5f3-f47c14b91f2f";

const CONTAINER: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

const ENCRYPTION: &str = r#"<?xml version="1.0"?>
<encryption xmlns="urn:oasis:names:tc:opendocument:xmlns:container"
            xmlns:enc="http://www.w3.org/2001/04/xmlenc#">
  <enc:EncryptedData>
    <enc:EncryptionMethod Algorithm="http://www.idpf.org/2008/embedding"/>
    <enc:CipherData><enc:CipherReference URI="OEBPS/fonts/font.otf"/></enc:CipherData>
  </enc:EncryptedData>
</encryption>"#;

const PACKAGE: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid" xml:lang="en">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="uid">urn:uuid:36d5078e-ff7d-468e-a5f3-f47c14b91f2f</dc:identifier>
    <dc:title id="t1">The Adventures of Tom Sawyer</dc:title>
    <meta refines="#t1" property="title-type">main</meta>
    <meta refines="#t1" property="file-as">Adventures</meta>
    <dc:language>en</dc:language>
    <dc:creator id="author">Mark Twain</dc:creator>
    <meta property="dcterms:modified">2024-01-01T00:00:00Z</meta>
    <meta property="belongs-to-collection" id="c1">Series A</meta>
    <meta refines="#c1" property="collection-type">series</meta>
    <meta refines="#c1" property="group-position">2.0</meta>
    <meta property="belongs-to-collection" id="c2">Collection B</meta>
  </metadata>
  <manifest>
    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
    <item id="cover" href="cover.xhtml" media-type="application/xhtml+xml"/>
    <item id="c1" href="chapter1.xhtml" media-type="application/xhtml+xml" media-overlay="c1-smil"/>
    <item id="c1-smil" href="chapter1.smil" media-type="application/smil+xml"/>
    <item id="audio" href="audio/chapter1.mp3" media-type="audio/mpeg"/>
    <item id="font" href="fonts/font.otf" media-type="font/otf"/>
  </manifest>
  <spine>
    <itemref idref="cover" properties="rendition:layout-pre-paginated"/>
    <itemref idref="c1"/>
  </spine>
</package>"##;

const NAV: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
  <body>
    <nav epub:type="toc">
      <ol>
        <li><a href="cover.xhtml">Cover</a></li>
        <li><a href="chapter1.xhtml">Chapter 1</a></li>
      </ol>
    </nav>
  </body>
</html>"#;

const SMIL: &str = r#"<smil xmlns="http://www.w3.org/ns/SMIL" version="3.0">
  <body>
    <par id="p1">
      <text src="chapter1.xhtml#p1"/>
      <audio src="audio/chapter1.mp3" clipBegin="0:00:00.000" clipEnd="0:00:05.250"/>
    </par>
  </body>
</smil>"#;

fn font() -> Vec<u8> {
    (0..2000u32).map(|i| (i * 7 % 251) as u8).collect()
}

/// Obfuscates `font` with the IDPF algorithm.
fn obfuscated_font() -> Vec<u8> {
    let key = Sha1::digest(IDENTIFIER.as_bytes());
    font()
        .iter()
        .enumerate()
        .map(|(i, byte)| if i < 1040 { byte ^ key[i % key.len()] } else { *byte })
        .collect()
}

fn chapter() -> Vec<u8> {
    let body = "<p>Tom!</p>".repeat(220);
    format!(r#"<html xmlns="http://www.w3.org/1999/xhtml"><body>{body}</body></html>"#).into_bytes()
}

fn epub() -> TestFile {
    let font = obfuscated_font();
    let chapter = chapter();

    TestFile::zip(
        "tom-sawyer.epub",
        &[
            ("mimetype", b"application/epub+zip"),
            ("META-INF/container.xml", CONTAINER.as_bytes()),
            ("META-INF/encryption.xml", ENCRYPTION.as_bytes()),
            ("OEBPS/content.opf", PACKAGE.as_bytes()),
            ("OEBPS/nav.xhtml", NAV.as_bytes()),
            ("OEBPS/cover.xhtml", b"<html xmlns=\"http://www.w3.org/1999/xhtml\"/>"),
            ("OEBPS/chapter1.xhtml", &chapter),
            ("OEBPS/chapter1.smil", SMIL.as_bytes()),
            ("OEBPS/audio/chapter1.mp3", b"ID3"),
            ("OEBPS/fonts/font.otf", &font),
        ],
    )
}

fn open(file: &TestFile) -> Publication {
    Publication::open(file.path(), PublicationOptions::default()).unwrap()
}

#[test]
fn test_metadata() {
    let file = epub();
    let publication = open(&file);
    let metadata = &publication.manifest().metadata;

    assert_eq!("The Adventures of Tom Sawyer", metadata.title());
    assert_eq!(Some("Adventures"), metadata.sort_as());
    assert_eq!(Some(IDENTIFIER), metadata.identifier.as_deref());
    assert_eq!(vec!["en".to_owned()], metadata.languages);
    assert_eq!("Mark Twain", metadata.authors[0].name());

    let series = metadata.belongs_to_series();
    assert_eq!(1, series.len());
    assert_eq!("Series A", series[0].name());
    assert_eq!(Some(2.0), series[0].position);

    let collections = metadata.belongs_to_collections();
    assert_eq!(1, collections.len());
    assert_eq!("Collection B", collections[0].name());
}

#[test]
fn test_reading_order_and_toc() {
    let file = epub();
    let publication = open(&file);
    let manifest = publication.manifest();

    let hrefs = manifest.reading_order.iter().map(|link| link.href.as_str()).collect::<Vec<_>>();
    assert_eq!(vec!["/OEBPS/cover.xhtml", "/OEBPS/chapter1.xhtml"], hrefs);

    let toc = &manifest.table_of_contents;
    assert_eq!(2, toc.len());
    assert_eq!("/OEBPS/cover.xhtml", toc[0].href);
    assert_eq!(Some("Cover"), toc[0].title.as_deref());
    assert_eq!("/OEBPS/chapter1.xhtml", toc[1].href);
    assert_eq!(Some("Chapter 1"), toc[1].title.as_deref());

    assert!(manifest.resources.iter().any(|link| link.href == "/OEBPS/fonts/font.otf"));
    assert!(manifest.links.iter().any(|link| link.href == POSITIONS_HREF));
}

#[test]
fn test_font_deobfuscation() {
    let file = epub();
    let publication = open(&file);
    let resource = publication.get_href("/OEBPS/fonts/font.otf");

    assert_eq!(2000, resource.length().unwrap());
    assert_eq!(font(), resource.read(0, 0).unwrap());
    assert_eq!(font()[1000..1100], resource.read(1000, 1099).unwrap()[..]);
}

#[test]
fn test_font_deobfuscation_disabled() {
    let file = epub();
    let options = PublicationOptions {
        epub: EpubSettings::builder().deobfuscate_fonts(false).build(),
        ..PublicationOptions::default()
    };
    let publication = Publication::open(file.path(), options).unwrap();
    let resource = publication.get_href("/OEBPS/fonts/font.otf");

    assert_eq!(obfuscated_font(), resource.read(0, 0).unwrap());
}

#[test]
fn test_positions() {
    let file = epub();
    let publication = open(&file);
    let chapter_length = chapter().len() as u64;
    let chapter_positions = chapter_length.div_ceil(1024);
    let total = 1 + chapter_positions;

    let by_reading_order = publication.positions_by_reading_order();
    assert_eq!(2, by_reading_order.len());
    assert_eq!(1, by_reading_order[0].len());
    assert_eq!(chapter_positions as usize, by_reading_order[1].len());

    let positions = publication.positions();
    assert_eq!(total as usize, positions.len());

    for (i, locator) in positions.iter().enumerate() {
        assert_eq!(Some(i as u64 + 1), locator.locations.position);
        assert_eq!(Some(i as f64 / total as f64), locator.locations.total_progression);
        assert_eq!("application/xhtml+xml", locator.r#type);
    }
    assert_eq!("/OEBPS/cover.xhtml", positions[0].href);
    assert_eq!(Some(0.0), positions[0].locations.progression);
    assert_eq!("/OEBPS/chapter1.xhtml", positions[1].href);
    assert_eq!(Some(1.0 / chapter_positions as f64), positions[2].locations.progression);

    let json = publication.get_href(POSITIONS_HREF).read_as_json().unwrap();
    assert_eq!(total, json["total"].as_u64().unwrap());
    assert_eq!(total as usize, json["positions"].as_array().unwrap().len());
}

#[test]
fn test_positions_original_length() {
    let file = epub();
    let options = PublicationOptions {
        epub: EpubSettings::builder()
            .positions_strategy(ReflowableStrategy::OriginalLength { page_length: 100 })
            .build(),
        ..PublicationOptions::default()
    };
    let publication = Publication::open(file.path(), options).unwrap();

    let by_reading_order = publication.positions_by_reading_order();
    assert_eq!(1, by_reading_order[0].len());
    assert_eq!(chapter().len().div_ceil(100), by_reading_order[1].len());
}

#[test]
fn test_media_overlay() {
    let file = epub();
    let publication = open(&file);
    let manifest = publication.manifest();

    let chapter = &manifest.reading_order[1];
    let guided = chapter
        .alternates
        .iter()
        .find(|link| link.media_type().matches(&MediaType::GUIDED_NAVIGATION))
        .unwrap();
    assert!(!chapter.alternates.iter().any(|link| link.media_type().matches(&MediaType::SMIL)));

    let json = publication.get(guided).read_as_json().unwrap();
    let document = serde_json::from_value::<GuidedNavigationDocument>(json).unwrap();
    assert_eq!(1, document.guided.len());
    assert_eq!(Some("/OEBPS/chapter1.xhtml#p1"), document.guided[0].text_ref.as_deref());
    assert_eq!(Some("/OEBPS/audio/chapter1.mp3#t=0,5.25"), document.guided[0].audio_ref.as_deref());

    let service = publication.find_service::<MediaOverlayService>().unwrap();
    assert!(service.has_guide_for_resource("/OEBPS/chapter1.xhtml"));
    assert!(!service.has_guide_for_resource("/OEBPS/cover.xhtml"));
    assert!(service.guide_for_resource("/OEBPS/cover.xhtml").unwrap().is_none());
}

#[test]
fn test_media_overlay_disabled() {
    let file = epub();
    let options = PublicationOptions {
        epub: EpubSettings::builder().media_overlays(false).build(),
        ..PublicationOptions::default()
    };
    let publication = Publication::open(file.path(), options).unwrap();

    assert!(publication.find_service::<MediaOverlayService>().is_none());
    let chapter = &publication.manifest().reading_order[1];
    assert!(chapter.alternates.iter().any(|link| link.media_type().matches(&MediaType::SMIL)));
}

#[test]
fn test_fallback_title() {
    let file = TestFile::zip(
        "untitled.epub",
        &[
            ("mimetype", b"application/epub+zip"),
            ("META-INF/container.xml", CONTAINER.as_bytes()),
            (
                "OEBPS/content.opf",
                br#"<package xmlns="http://www.idpf.org/2007/opf" version="3.0">
                      <metadata/>
                      <manifest><item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/></manifest>
                      <spine><itemref idref="c1"/></spine>
                    </package>"#,
            ),
            ("OEBPS/c1.xhtml", b"<html/>"),
        ],
    );
    let publication = open(&file);

    assert_eq!("untitled", publication.manifest().metadata.title());
    assert_eq!(1, publication.manifest().reading_order.len());
    assert_eq!("/OEBPS/c1.xhtml", publication.manifest().reading_order[0].href);
}
