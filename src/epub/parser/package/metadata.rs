use crate::epub::consts::{self, ns, vocab};
use crate::epub::metadata::{EpubMetadata, MetadataItem, MetadataLink};
use crate::epub::parser::{EpubParser, resolve_href};
use crate::epub::property::{PrefixMap, resolve_properties, resolve_property};
use crate::parser::XmlElement;
use crate::util::str::StrExt;

/// Dublin Core elements carrying legacy `opf:file-as` and `opf:role` attributes.
const LEGACY_CONTRIBUTORS: [&str; 3] = ["creator", "contributor", "publisher"];

/// Parsing state shared by the elements of `<metadata>`.
struct MetadataContext<'a> {
    base: &'a str,
    prefixes: &'a PrefixMap,
    default_lang: String,
}

impl EpubParser<'_> {
    /// Parses `<metadata>` into its items and links.
    ///
    /// OPF 2.0 `<dc-metadata>` and `<x-metadata>` groups are flattened.
    pub(super) fn parse_metadata(
        &self,
        package: &XmlElement,
        metadata: &XmlElement,
        base: &str,
        prefixes: &PrefixMap,
    ) -> EpubMetadata {
        let elements = metadata
            .elements()
            .flat_map(|element| {
                if element.is(ns::OPF, "dc-metadata") || element.is(ns::OPF, "x-metadata") {
                    element.elements().collect()
                } else {
                    vec![element]
                }
            })
            .collect::<Vec<_>>();

        // Language fallback: <metadata>, <package>, then the first <dc:language>
        let default_lang = metadata
            .lang()
            .or_else(|| package.lang())
            .map(str::to_owned)
            .or_else(|| {
                elements
                    .iter()
                    .find(|element| element.is(ns::DC, "language"))
                    .map(|language| language.text().trim().to_owned())
            })
            .unwrap_or_default();
        let context = MetadataContext {
            base,
            prefixes,
            default_lang,
        };

        let mut items = Vec::new();
        let mut links = Vec::new();

        for element in elements {
            match element.namespace() {
                Some(ns::DC) => items.extend(context.parse_dc_element(element)),
                Some(ns::OPF) => match element.local_name() {
                    "meta" => items.extend(context.parse_meta(element)),
                    "link" => links.extend(context.parse_link(element)),
                    _ => {}
                },
                _ => {}
            }
        }
        EpubMetadata::new(items, links)
    }
}

impl MetadataContext<'_> {
    fn lang(&self, element: &XmlElement) -> String {
        element
            .lang()
            .map_or_else(|| self.default_lang.clone(), str::to_owned)
    }

    /// `<dc:*>` elements, mapped to their DCMI terms equivalent.
    fn parse_dc_element(&self, element: &XmlElement) -> Option<MetadataItem> {
        let text = element.text();
        let value = text.non_blank()?;
        let name = element.local_name();
        let opf_attribute = |local| element.attribute_ns_or_prefixed(ns::OPF, "opf", local);

        let property = match (name, opf_attribute("event")) {
            ("date", Some("modification")) => format!("{}modified", vocab::DCTERMS),
            _ => format!("{}{name}", vocab::DCTERMS),
        };
        let mut item = MetadataItem::new(property, value, self.lang(element));
        item.id = element.attribute("id").map(str::to_owned);
        item.scheme = opf_attribute("scheme").map(str::to_owned);

        if LEGACY_CONTRIBUTORS.contains(&name) {
            for (attribute, property) in [("file-as", consts::FILE_AS), ("role", consts::ROLE)] {
                if let Some(value) = opf_attribute(attribute).and_then(|value| value.non_blank()) {
                    item.add_child(MetadataItem::new(
                        format!("{}{property}", vocab::META),
                        value,
                        item.lang.clone(),
                    ));
                }
            }
        }
        Some(item)
    }

    fn parse_link(&self, link: &XmlElement) -> Option<MetadataLink> {
        let Some(href) = link.attribute("href").and_then(|href| href.non_blank()) else {
            log::warn!("Ignoring metadata link without `href`");
            return None;
        };

        Some(MetadataLink {
            href: resolve_href(href, self.base)?,
            rels: resolve_properties(link.attribute("rel"), self.prefixes, Some(vocab::LINK)),
            media_type: link.attribute("media-type").map(str::to_owned),
            refines: refines(link),
            properties: resolve_properties(link.attribute("properties"), self.prefixes, Some(vocab::LINK)),
        })
    }

    /// EPUB 3 `<meta property>` and EPUB 2 `<meta name content>` elements.
    fn parse_meta(&self, meta: &XmlElement) -> Option<MetadataItem> {
        if let Some(property) = meta.attribute("property") {
            let text = meta.text();
            let mut item = MetadataItem::new(
                resolve_property(property, self.prefixes, Some(vocab::META)),
                text.non_blank()?,
                self.lang(meta),
            );
            item.id = meta.attribute("id").map(str::to_owned);
            item.refines = refines(meta);
            item.scheme = meta
                .attribute("scheme")
                .map(|scheme| resolve_property(scheme, self.prefixes, None));
            Some(item)
        } else {
            let name = meta.attribute("name")?.trim();
            let content = meta.attribute("content")?.non_blank()?;
            Some(MetadataItem::new(
                resolve_property(name, self.prefixes, None),
                content,
                self.lang(meta),
            ))
        }
    }
}

fn refines(element: &XmlElement) -> Option<String> {
    let refines = element.attribute("refines")?.trim();
    refines
        .strip_prefix('#')
        .unwrap_or(refines)
        .non_blank()
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use crate::epub::consts::{self, vocab};
    use crate::epub::metadata::EpubMetadata;
    use crate::epub::parser::tests::MemoryFetcher;
    use crate::epub::{EpubParser, EpubSettings};

    const OPF: &str = "/OPS/package.opf";

    fn parse(metadata: &str) -> EpubMetadata {
        let opf = format!(
            r#"<package xmlns="http://www.idpf.org/2007/opf" xmlns:dc="http://purl.org/dc/elements/1.1/"
                 xmlns:opf="http://www.idpf.org/2007/opf" version="3.0" xml:lang="fr">
                 <metadata>{metadata}</metadata><manifest/><spine/>
               </package>"#
        );
        let fetcher = MemoryFetcher::default().with(OPF, opf);
        let settings = EpubSettings::default();
        EpubParser::new(&settings, &fetcher)
            .parse_package(OPF)
            .unwrap()
            .metadata
    }

    fn dcterms(name: &str) -> String {
        format!("{}{name}", vocab::DCTERMS)
    }

    #[test]
    fn test_dublin_core() {
        let metadata = parse(
            r#"<dc:title id="t1">  Les Misérables </dc:title>
               <dc:title xml:lang="en">The Wretched</dc:title>
               <dc:identifier opf:scheme="ISBN">9780140444308</dc:identifier>
               <dc:date opf:event="modification">2020-01-01</dc:date>
               <dc:date>1862</dc:date>
               <dc:description>   </dc:description>"#,
        );
        let titles = &metadata.global[&dcterms("title")];

        assert_eq!("Les Misérables", titles[0].value);
        assert_eq!("fr", titles[0].lang);
        assert_eq!(Some("t1"), titles[0].id.as_deref());
        assert_eq!("en", titles[1].lang);
        assert_eq!(Some("ISBN"), metadata.global[&dcterms("identifier")][0].scheme.as_deref());
        assert_eq!("2020-01-01", metadata.global[&dcterms("modified")][0].value);
        assert_eq!("1862", metadata.global[&dcterms("date")][0].value);
        assert!(!metadata.global.contains_key(&dcterms("description")));
    }

    #[test]
    fn test_legacy_contributor_attributes() {
        let metadata = parse(
            r#"<dc:creator opf:file-as="Hugo, Victor" opf:role="aut">Victor Hugo</dc:creator>"#,
        );
        let creator = &metadata.global[&dcterms("creator")][0];

        assert_eq!(Some("Hugo, Victor"), creator.first_value(&format!("{}{}", vocab::META, consts::FILE_AS)));
        assert_eq!(Some("aut"), creator.role());
    }

    #[test]
    fn test_meta_refinements() {
        let metadata = parse(
            r##"<dc:title id="t1">Main</dc:title>
                <meta refines="#t1" property="title-type">main</meta>
                <meta refines="#t1" property="file-as">Adventures</meta>
                <meta refines="#chapter1" property="media:duration">0:32</meta>
                <meta property="rendition:layout">pre-paginated</meta>
                <meta name="cover" content="cover-image"/>
                <meta name="calibre:series" content="Discworld"/>"##,
        );
        let title = &metadata.global[&dcterms("title")][0];

        assert_eq!(Some("main"), title.title_type());
        assert_eq!("Adventures", title.file_as().unwrap().default_translation());
        assert!(metadata.refine["chapter1"].contains_key(&format!("{}duration", vocab::MEDIA)));
        assert_eq!(
            "pre-paginated",
            metadata.global[&format!("{}layout", vocab::RENDITION)][0].value,
        );
        assert_eq!("cover-image", metadata.global[consts::COVER][0].value);
        assert_eq!("Discworld", metadata.global[consts::CALIBRE_SERIES][0].value);
    }

    #[test]
    fn test_links() {
        let metadata = parse(
            r#"<link rel="dcterms:conformsTo" href="http://www.idpf.org/epub/a11y/accessibility-20170105.html#wcag-aa"/>
               <link rel="record" href="../meta/onix.xml" media-type="application/xml" properties="onix"/>"#,
        );

        assert_eq!(vec![dcterms("conformsTo")], metadata.links[0].rels);
        assert_eq!("/meta/onix.xml", metadata.links[1].href);
        assert_eq!(vec![format!("{}record", vocab::LINK)], metadata.links[1].rels);
        assert_eq!(vec![format!("{}onix", vocab::LINK)], metadata.links[1].properties);
        assert_eq!(Some("application/xml"), metadata.links[1].media_type.as_deref());
    }
}
