use crate::epub::metadata::EpubMetadata;
use crate::manifest::ReadingProgression;

/// The parsed package document (`.opf`).
#[derive(Clone, Debug, PartialEq)]
pub(super) struct PackageDocument {
    /// Absolute path of the package document within the container.
    pub(super) path: String,
    /// The raw `version` attribute.
    pub(super) version: String,
    pub(super) epub_version: f64,
    pub(super) unique_identifier_id: Option<String>,
    pub(super) metadata: EpubMetadata,
    pub(super) manifest: Vec<Item>,
    pub(super) spine: Spine,
}

impl PackageDocument {
    pub(super) fn item_by_id(&self, id: &str) -> Option<&Item> {
        self.manifest.iter().find(|item| item.id.as_deref() == Some(id))
    }
}

/// A manifest `<item>`.
#[derive(Clone, Debug, Default, PartialEq)]
pub(super) struct Item {
    /// Absolute href within the container.
    pub(super) href: String,
    pub(super) id: Option<String>,
    pub(super) fallback: Option<String>,
    pub(super) media_overlay: Option<String>,
    pub(super) media_type: Option<String>,
    /// Resolved property IRIs.
    pub(super) properties: Vec<String>,
}

/// The `<spine>` element.
#[derive(Clone, Debug, Default, PartialEq)]
pub(super) struct Spine {
    pub(super) itemrefs: Vec<ItemRef>,
    pub(super) direction: ReadingProgression,
    /// The manifest id of the NCX (EPUB 2).
    pub(super) toc: Option<String>,
}

/// A spine `<itemref>`.
#[derive(Clone, Debug, Default, PartialEq)]
pub(super) struct ItemRef {
    pub(super) idref: String,
    pub(super) linear: bool,
    /// Resolved property IRIs.
    pub(super) properties: Vec<String>,
}
