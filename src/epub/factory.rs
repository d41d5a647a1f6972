use crate::epub::consts::vocab;
use crate::epub::metadata::{self, MetadataLink, PubMetadataAdapter};
use crate::epub::package::{Item, ItemRef, PackageDocument};
use crate::manifest::{Encryption, Link, Manifest, PublicationCollection, WEBPUB_CONTEXT};
use crate::mediatype::MediaType;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

/// Item properties mapped to the `contains` link property.
const CONTAINS: [(&str, &str); 5] = [
    ("scripted", "js"),
    ("mathml", "mathml"),
    ("svg", "svg"),
    ("xmp-record", "xmp"),
    ("remote-resources", "remote-resources"),
];

/// Assembles a [`Manifest`] from the parsed package document and its companion files.
pub(super) struct PublicationFactory<'a> {
    pub(super) fallback_title: &'a str,
    pub(super) package: &'a PackageDocument,
    /// Navigation lists keyed by type.
    pub(super) navigation: HashMap<String, Vec<Link>>,
    /// Encryption keyed by absolute href.
    pub(super) encryption: HashMap<String, Encryption>,
    pub(super) display_options: HashMap<String, String>,
}

impl PublicationFactory<'_> {
    pub(super) fn create(mut self) -> Manifest {
        let package = self.package;
        let adapter = PubMetadataAdapter {
            items: &package.metadata.global,
            links: &package.metadata.links,
            version: &package.version,
            epub_version: package.epub_version,
            fallback_title: self.fallback_title,
            unique_identifier_id: package.unique_identifier_id.as_deref(),
            reading_progression: package.spine.direction,
            display_options: &self.display_options,
        };
        let metadata = adapter.metadata();
        let cover_id = adapter.cover();

        let itemrefs: HashMap<&str, &ItemRef> = package
            .spine
            .itemrefs
            .iter()
            .map(|itemref| (itemref.idref.as_str(), itemref))
            .collect();

        // Compute reading order
        let mut reading_order_ids = Vec::new();
        let reading_order = package
            .spine
            .itemrefs
            .iter()
            .filter(|itemref| itemref.linear)
            .filter_map(|itemref| {
                let Some(item) = package.item_by_id(&itemref.idref) else {
                    log::warn!("Ignoring itemref `{}` without a manifest item", itemref.idref);
                    return None;
                };
                let link = self.compute_link(item, &itemrefs, cover_id, &mut Vec::new());
                let link = typed_reading_order_link(link)?;
                reading_order_ids.push(itemref.idref.as_str());
                Some(link)
            })
            .collect();

        // Compute resources
        let reading_order_ids = self.with_fallbacks(&reading_order_ids);
        let resources = package
            .manifest
            .iter()
            .filter(|item| item.id.as_deref().is_none_or(|id| !reading_order_ids.contains(id)))
            .map(|item| self.compute_link(item, &itemrefs, cover_id, &mut Vec::new()))
            .collect();

        let table_of_contents = self.navigation.remove("toc").unwrap_or_default();
        let subcollections: BTreeMap<_, _> = self
            .navigation
            .drain()
            .map(|(r#type, links)| {
                let role = match r#type.as_str() {
                    "page-list" => "pageList".to_owned(),
                    _ => r#type,
                };
                (role, vec![PublicationCollection::new(links)])
            })
            .collect();

        Manifest {
            context: vec![WEBPUB_CONTEXT.to_owned()],
            metadata,
            links: self.metadata_links(),
            reading_order,
            resources,
            table_of_contents,
            subcollections,
        }
    }

    /// The global `<link>` elements of the package metadata.
    fn metadata_links(&self) -> Vec<Link> {
        self.package
            .metadata
            .links
            .iter()
            .filter(|link| link.refines.is_none())
            .map(metadata_link)
            .collect()
    }

    /// Ids of `ids` and of their fallback chains.
    fn with_fallbacks<'p>(&'p self, ids: &[&'p str]) -> HashSet<&'p str> {
        let mut all = HashSet::new();

        for &id in ids {
            let mut next = Some(id);
            while let Some(id) = next {
                if !all.insert(id) {
                    break;
                }
                next = self
                    .package
                    .item_by_id(id)
                    .and_then(|item| item.fallback.as_deref());
            }
        }
        all
    }

    /// Computes the link of `item`, with the properties of its spine itemref, if any.
    ///
    /// `visited` holds the ids along the current fallback chain.
    fn compute_link<'p>(
        &'p self,
        item: &'p Item,
        itemrefs: &HashMap<&str, &ItemRef>,
        cover_id: Option<&str>,
        visited: &mut Vec<&'p str>,
    ) -> Link {
        let mut link = Link::new(&item.href);
        link.r#type = item.media_type.clone();

        let itemref_properties = item
            .id
            .as_deref()
            .and_then(|id| itemrefs.get(id))
            .map(|itemref| itemref.properties.as_slice())
            .unwrap_or_default();

        let mut contains = Vec::new();
        for property in item.properties.iter().chain(itemref_properties) {
            if let Some(name) = property.strip_prefix(vocab::ITEM) {
                match name {
                    "nav" => link.add_rel("contents"),
                    "cover-image" => link.add_rel("cover"),
                    _ => {
                        if let Some((_, value)) = CONTAINS.iter().find(|(key, _)| *key == name) {
                            contains.push(*value);
                        }
                    }
                }
            } else if let Some((key, value)) = rendition_property(property) {
                link.properties.insert(key, value);
            }
        }
        if !contains.is_empty() {
            link.properties.insert("contains", contains);
        }

        if let Some(id) = item.id.as_deref() {
            if cover_id == Some(id) && !link.has_rel("cover") {
                link.add_rel("cover");
            }
            link.duration = self
                .package
                .metadata
                .refine
                .get(id)
                .and_then(metadata::duration);
            visited.push(id);
        }

        if let Some(encryption) = self.encryption.get(&item.href) {
            match serde_json::to_value(encryption) {
                Ok(value) => link.properties.insert("encrypted", value),
                Err(error) => log::warn!("Ignoring encryption of `{}`: {error}", item.href),
            }
        }

        // Alternates: the fallback chain, then the media overlay
        let fallback = item
            .fallback
            .as_deref()
            .filter(|id| !visited.contains(id))
            .and_then(|id| self.package.item_by_id(id));
        if let Some(fallback) = fallback {
            link.alternates.push(self.compute_link(fallback, itemrefs, cover_id, visited));
        }
        let media_overlay = item
            .media_overlay
            .as_deref()
            .and_then(|id| self.package.item_by_id(id));
        if let Some(media_overlay) = media_overlay {
            link.alternates
                .push(self.compute_link(media_overlay, itemrefs, cover_id, &mut visited.clone()));
        }
        link
    }
}

/// Maps an itemref rendition property to a link property.
fn rendition_property(property: &str) -> Option<(&'static str, &'static str)> {
    let name = property
        .strip_prefix(vocab::RENDITION)
        .or_else(|| property.strip_prefix(vocab::ITEMREF))?;

    let mapped = match name {
        "page-spread-left" => ("page", "left"),
        "page-spread-right" => ("page", "right"),
        "page-spread-center" | "spread-center" => ("page", "center"),
        "spread-none" => ("spread", "none"),
        "spread-auto" => ("spread", "auto"),
        "spread-landscape" => ("spread", "landscape"),
        "spread-portrait" | "spread-both" => ("spread", "both"),
        "layout-reflowable" => ("layout", "reflowable"),
        "layout-pre-paginated" => ("layout", "fixed"),
        "orientation-auto" => ("orientation", "auto"),
        "orientation-landscape" => ("orientation", "landscape"),
        "orientation-portrait" => ("orientation", "portrait"),
        "flow-auto" => ("overflow", "auto"),
        "flow-paginated" => ("overflow", "paginated"),
        "flow-scrolled-continuous" | "flow-scrolled-doc" => ("overflow", "scrolled"),
        _ => return None,
    };
    Some(mapped)
}

fn metadata_link(link: &MetadataLink) -> Link {
    let mut mapped = Link::new(&link.href);
    mapped.r#type = link.media_type.clone();
    mapped.rels = link.rels.clone();

    if link.rels.iter().any(|rel| *rel == format!("{}record", vocab::LINK)) {
        let contains = ["onix", "xmp"]
            .into_iter()
            .filter(|name| link.properties.contains(&format!("{}{name}", vocab::LINK)))
            .collect::<Vec<_>>();
        if !contains.is_empty() {
            mapped.properties.insert("contains", contains);
        }
    }
    mapped
}

/// Reading order links must be typed: the type is inferred from the extension if missing.
fn typed_reading_order_link(mut link: Link) -> Option<Link> {
    if link.r#type.as_deref().is_some_and(|t| !t.trim().is_empty()) {
        return Some(link);
    }
    let media_type = Path::new(crate::util::uri::split_suffix(&link.href).0)
        .extension()
        .and_then(|extension| extension.to_str())
        .and_then(MediaType::of_extension);

    match media_type {
        Some(media_type) => {
            link.r#type = Some(media_type.to_string());
            Some(link)
        }
        None => {
            log::warn!("Dropping reading order item without a media type: {}", link.href);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PublicationFactory;
    use crate::epub::consts::{self, vocab};
    use crate::epub::metadata::{EpubMetadata, MetadataItem, MetadataLink};
    use crate::epub::package::{Item, ItemRef, PackageDocument, Spine};
    use crate::manifest::{Encryption, Layout, Link, Manifest, Page, Spread};
    use std::collections::HashMap;

    fn item(id: &str, href: &str, media_type: Option<&str>, properties: &[&str]) -> Item {
        Item {
            href: href.to_owned(),
            id: Some(id.to_owned()),
            media_type: media_type.map(str::to_owned),
            properties: properties
                .iter()
                .map(|property| format!("{}{property}", vocab::ITEM))
                .collect(),
            ..Item::default()
        }
    }

    fn itemref(idref: &str, linear: bool, properties: &[&str]) -> ItemRef {
        ItemRef {
            idref: idref.to_owned(),
            linear,
            properties: properties
                .iter()
                .map(|property| format!("{}{property}", vocab::RENDITION))
                .collect(),
        }
    }

    fn package(manifest: Vec<Item>, itemrefs: Vec<ItemRef>, metadata: EpubMetadata) -> PackageDocument {
        PackageDocument {
            path: "/OEBPS/content.opf".to_owned(),
            version: "3.0".to_owned(),
            epub_version: 3.0,
            unique_identifier_id: None,
            metadata,
            manifest,
            spine: Spine {
                itemrefs,
                ..Spine::default()
            },
        }
    }

    fn create(package: &PackageDocument, navigation: HashMap<String, Vec<Link>>) -> Manifest {
        PublicationFactory {
            fallback_title: "Untitled",
            package,
            navigation,
            encryption: HashMap::from([(
                "/OEBPS/font.otf".to_owned(),
                Encryption::new(consts::IDPF_OBFUSCATION),
            )]),
            display_options: HashMap::new(),
        }
        .create()
    }

    #[test]
    fn test_reading_order_and_resources() {
        let mut chapter = item("c1", "/OEBPS/c1.xhtml", Some("application/xhtml+xml"), &["scripted", "svg"]);
        chapter.fallback = Some("c1-alt".to_owned());
        chapter.media_overlay = Some("c1-smil".to_owned());
        let mut alternate = item("c1-alt", "/OEBPS/c1.html", Some("text/html"), &[]);
        alternate.fallback = Some("c1".to_owned());

        let package = package(
            vec![
                item("nav", "/OEBPS/nav.xhtml", Some("application/xhtml+xml"), &["nav"]),
                chapter,
                alternate,
                item("c1-smil", "/OEBPS/c1.smil", Some("application/smil+xml"), &[]),
                item("c2", "/OEBPS/c2.html", None, &[]),
                item("c3", "/OEBPS/c3", None, &[]),
                item("font", "/OEBPS/font.otf", Some("font/otf"), &[]),
                item("cover", "/OEBPS/cover.jpg", Some("image/jpeg"), &["cover-image"]),
            ],
            vec![
                itemref("c1", true, &["page-spread-left", "layout-pre-paginated", "spread-none"]),
                itemref("nav", false, &[]),
                itemref("missing", true, &[]),
                itemref("c2", true, &[]),
                itemref("c3", true, &[]),
            ],
            EpubMetadata::default(),
        );
        let manifest = create(&package, HashMap::new());

        let hrefs = |links: &[Link]| links.iter().map(|link| link.href.clone()).collect::<Vec<_>>();
        assert_eq!(vec!["/OEBPS/c1.xhtml", "/OEBPS/c2.html"], hrefs(&manifest.reading_order));
        assert_eq!(
            vec!["/OEBPS/nav.xhtml", "/OEBPS/c1.smil", "/OEBPS/c3", "/OEBPS/font.otf", "/OEBPS/cover.jpg"],
            hrefs(&manifest.resources),
        );

        let chapter = &manifest.reading_order[0];
        assert_eq!(vec!["js", "svg"], chapter.properties.contains());
        assert_eq!(Some(Page::Left), chapter.properties.page());
        assert_eq!(Some(Layout::Fixed), chapter.properties.layout());
        assert_eq!(Some(Spread::None), chapter.properties.spread());
        assert_eq!(vec!["/OEBPS/c1.html", "/OEBPS/c1.smil"], hrefs(&chapter.alternates));
        assert!(chapter.alternates[0].alternates.is_empty());
        assert_eq!(Some("text/html"), manifest.reading_order[1].r#type.as_deref());

        assert!(manifest.resources[0].has_rel("contents"));
        assert!(manifest.resources[4].has_rel("cover"));
        assert_eq!(
            Some(Encryption::new(consts::IDPF_OBFUSCATION)),
            manifest.resources[3].properties.encrypted(),
        );
    }

    #[test]
    fn test_non_linear_itemref_properties() {
        let mut chapter = item("c2", "/OEBPS/c2.xhtml", Some("application/xhtml+xml"), &[]);
        chapter.fallback = Some("c2-alt".to_owned());
        let package = package(
            vec![
                item("c1", "/OEBPS/c1.xhtml", Some("application/xhtml+xml"), &[]),
                chapter,
                item("c2-alt", "/OEBPS/c2-alt.xhtml", Some("application/xhtml+xml"), &[]),
            ],
            vec![
                itemref("c1", true, &[]),
                itemref("c2", false, &["page-spread-left"]),
                itemref("c2-alt", false, &["page-spread-right"]),
            ],
            EpubMetadata::default(),
        );
        let manifest = create(&package, HashMap::new());

        let non_linear = manifest
            .resources
            .iter()
            .find(|link| link.href == "/OEBPS/c2.xhtml")
            .unwrap();
        assert_eq!(Some(Page::Left), non_linear.properties.page());
        assert_eq!(Some(Page::Right), non_linear.alternates[0].properties.page());
        assert_eq!(None, manifest.reading_order[0].properties.page());
    }

    #[test]
    fn test_navigation_and_links() {
        let metadata = EpubMetadata::new(
            vec![
                MetadataItem::new(consts::COVER, "cover", ""),
                MetadataItem {
                    refines: Some("c1".to_owned()),
                    ..MetadataItem::new(format!("{}duration", vocab::MEDIA), "0:01:30", "")
                },
            ],
            vec![MetadataLink {
                href: "/OEBPS/onix.xml".to_owned(),
                rels: vec![format!("{}record", vocab::LINK)],
                media_type: Some("application/xml".to_owned()),
                refines: None,
                properties: vec![format!("{}onix", vocab::LINK)],
            }],
        );
        let package = package(
            vec![
                item("c1", "/OEBPS/c1.xhtml", Some("application/xhtml+xml"), &[]),
                item("cover", "/OEBPS/cover.jpg", Some("image/jpeg"), &[]),
            ],
            vec![itemref("c1", true, &[])],
            metadata,
        );
        let navigation = HashMap::from([
            ("toc".to_owned(), vec![Link::new("/OEBPS/c1.xhtml")]),
            ("page-list".to_owned(), vec![Link::new("/OEBPS/c1.xhtml#p1")]),
            ("landmarks".to_owned(), vec![Link::new("/OEBPS/c1.xhtml")]),
        ]);
        let manifest = create(&package, navigation);

        assert_eq!("Untitled", manifest.metadata.title());
        assert_eq!(1, manifest.table_of_contents.len());
        assert_eq!("/OEBPS/c1.xhtml#p1", manifest.subcollections["pageList"][0].links[0].href);
        assert!(manifest.subcollections.contains_key("landmarks"));
        assert_eq!(Some(90.0), manifest.reading_order[0].duration);
        assert!(manifest.resources[0].has_rel("cover"));
        assert_eq!(vec!["onix"], manifest.links[0].properties.contains());
    }
}
