// Paths
pub(crate) const CONTAINER: &str = "/META-INF/container.xml";
pub(crate) const ENCRYPTION: &str = "/META-INF/encryption.xml";
pub(crate) const APPLE_DISPLAY_OPTIONS: &str = "/META-INF/com.apple.ibooks.display-options.xml";
pub(crate) const KOBO_DISPLAY_OPTIONS: &str = "/META-INF/com.kobobooks.display-options.xml";

pub(crate) mod ns {
    pub(crate) const OPC: &str = "urn:oasis:names:tc:opendocument:xmlns:container";
    pub(crate) const ENC: &str = "http://www.w3.org/2001/04/xmlenc#";
    pub(crate) const SIG: &str = "http://www.w3.org/2000/09/xmldsig#";
    pub(crate) const COMP: &str = "http://www.idpf.org/2016/encryption#compression";
    pub(crate) const OPF: &str = "http://www.idpf.org/2007/opf";
    pub(crate) const DC: &str = "http://purl.org/dc/elements/1.1/";
    pub(crate) const OPS: &str = "http://www.idpf.org/2007/ops";
    pub(crate) const XHTML: &str = "http://www.w3.org/1999/xhtml";
    pub(crate) const SMIL: &str = "http://www.w3.org/ns/SMIL";
    pub(crate) const SMIL2: &str = "http://www.w3.org/2001/SMIL20/";
    pub(crate) const NCX: &str = "http://www.daisy.org/z3986/2005/ncx/";
}

pub(crate) mod vocab {
    pub(crate) const META: &str = "http://idpf.org/epub/vocab/package/meta/#";
    pub(crate) const LINK: &str = "http://idpf.org/epub/vocab/package/link/#";
    pub(crate) const ITEM: &str = "http://idpf.org/epub/vocab/package/item/#";
    pub(crate) const ITEMREF: &str = "http://idpf.org/epub/vocab/package/itemref/#";
    pub(crate) const MEDIA: &str = "http://www.idpf.org/epub/vocab/overlays/#";
    pub(crate) const RENDITION: &str = "http://www.idpf.org/vocab/rendition/#";
    pub(crate) const TYPE: &str = "http://idpf.org/epub/vocab/structure/#";

    pub(crate) const DCTERMS: &str = "http://purl.org/dc/terms/";
    pub(crate) const A11Y: &str = "http://www.idpf.org/epub/vocab/package/a11y/#";
    pub(crate) const MARC: &str = "http://id.loc.gov/vocabulary/";
    pub(crate) const ONIX: &str = "http://www.editeur.org/ONIX/book/codelists/current.html#";
    pub(crate) const SCHEMA: &str = "http://schema.org/";
    pub(crate) const XSD: &str = "http://www.w3.org/2001/XMLSchema#";

    pub(crate) const MSV: &str = "http://www.idpf.org/epub/vocab/structure/magazine/#";
    pub(crate) const PRISM: &str = "http://www.prismstandard.org/specifications/3.0/PRISM_CV_Spec_3.0.htm#";
}

/// Prefixes predefined for package documents.
pub(crate) const PACKAGE_RESERVED_PREFIXES: [(&str, &str); 8] = [
    ("dcterms", vocab::DCTERMS),
    ("media", vocab::MEDIA),
    ("rendition", vocab::RENDITION),
    ("a11y", vocab::A11Y),
    ("marc", vocab::MARC),
    ("onix", vocab::ONIX),
    ("schema", vocab::SCHEMA),
    ("xsd", vocab::XSD),
];

/// Prefixes predefined for content documents.
pub(crate) const CONTENT_RESERVED_PREFIXES: [(&str, &str); 2] =
    [("msv", vocab::MSV), ("prism", vocab::PRISM)];

// Encryption
pub(crate) const LCP_SCHEME: &str = "http://readium.org/2014/01/lcp";
pub(crate) const LCP_CONTENT_KEY: &str = "license.lcpl#/encryption/content_key";

// Font obfuscation
pub(crate) const IDPF_OBFUSCATION: &str = "http://www.idpf.org/2008/embedding";
pub(crate) const ADOBE_OBFUSCATION: &str = "http://ns.adobe.com/pdf/enc#RC";

// Metadata properties (without vocabulary)
pub(crate) const TITLE: &str = "title";
pub(crate) const TITLE_TYPE: &str = "title-type";
pub(crate) const DISPLAY_SEQ: &str = "display-seq";
pub(crate) const FILE_AS: &str = "file-as";
pub(crate) const ROLE: &str = "role";
pub(crate) const ALTERNATE_SCRIPT: &str = "alternate-script";
pub(crate) const AUTHORITY: &str = "authority";
pub(crate) const TERM: &str = "term";
pub(crate) const BELONGS_TO_COLLECTION: &str = "belongs-to-collection";
pub(crate) const COLLECTION_TYPE: &str = "collection-type";
pub(crate) const GROUP_POSITION: &str = "group-position";

// EPUB 2 `<meta name="...">` properties, kept unresolved
pub(crate) const COVER: &str = "cover";
pub(crate) const CALIBRE_TITLE_SORT: &str = "calibre:title_sort";
pub(crate) const CALIBRE_SERIES: &str = "calibre:series";
pub(crate) const CALIBRE_SERIES_INDEX: &str = "calibre:series_index";

/// Key of the raw package version within the other metadata.
pub(crate) const OPF_VERSION: &str = "http://www.idpf.org/2007/opf#version";
