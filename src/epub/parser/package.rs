mod metadata;

use crate::epub::consts::{PACKAGE_RESERVED_PREFIXES, ns, vocab};
use crate::epub::errors::{EpubError, EpubResult};
use crate::epub::package::{Item, ItemRef, PackageDocument, Spine};
use crate::epub::parser::{EpubParser, resolve_href};
use crate::epub::property::{PrefixMap, prefix_map, resolve_properties};
use crate::manifest::ReadingProgression;
use crate::parser::XmlElement;
use crate::util::str::StrExt;

/// The version assumed when the package declares none.
const DEFAULT_VERSION: &str = "1.2";

impl EpubParser<'_> {
    /// Parses the package document located at `path`.
    pub(super) fn parse_package(&self, path: &str) -> EpubResult<PackageDocument> {
        let document = self.read_xml(path)?;
        let package = document.root();

        if !package.is(ns::OPF, "package") {
            return Err(EpubError::NoPackageFound);
        }
        let prefixes = prefix_map(&PACKAGE_RESERVED_PREFIXES, package.attribute("prefix"));

        let version = package
            .attribute("version")
            .and_then(|version| version.non_blank())
            .unwrap_or(DEFAULT_VERSION);
        let epub_version = version
            .parse::<f64>()
            .map_err(|_| EpubError::InvalidVersion(version.to_owned()))?;

        // Assert existence
        let metadata = Self::mandatory(package.child(ns::OPF, "metadata"), || EpubError::NoMetadataFound)?;
        let manifest = Self::mandatory(package.child(ns::OPF, "manifest"), || EpubError::NoManifestFound)?;
        let spine = Self::mandatory(package.child(ns::OPF, "spine"), || EpubError::NoSpineFound)?;

        let metadata = self.parse_metadata(package, metadata, path, &prefixes);
        let mut items = Vec::new();

        for item in manifest.children(ns::OPF, "item") {
            items.extend(self.parse_item(item, path, &prefixes)?);
        }

        Ok(PackageDocument {
            path: path.to_owned(),
            version: version.to_owned(),
            epub_version,
            unique_identifier_id: package.attribute("unique-identifier").map(str::to_owned),
            metadata,
            manifest: items,
            spine: self.parse_spine(spine, &prefixes)?,
        })
    }

    fn parse_item(&self, item: &XmlElement, path: &str, prefixes: &PrefixMap) -> EpubResult<Option<Item>> {
        let href = self.require_attribute(
            item.attribute("href").and_then(|href| href.non_blank()),
            "manifest item `href`",
        )?;
        let Some(href) = href.and_then(|href| resolve_href(href, path)) else {
            return Ok(None);
        };
        let attribute = |name| item.attribute(name).map(str::to_owned);

        Ok(Some(Item {
            href,
            id: attribute("id"),
            fallback: attribute("fallback"),
            media_overlay: attribute("media-overlay"),
            media_type: attribute("media-type"),
            properties: resolve_properties(item.attribute("properties"), prefixes, Some(vocab::ITEM)),
        }))
    }

    fn parse_spine(&self, spine: &XmlElement, prefixes: &PrefixMap) -> EpubResult<Spine> {
        let mut itemrefs = Vec::new();

        for itemref in spine.children(ns::OPF, "itemref") {
            let idref = self.require_attribute(
                itemref.attribute("idref").and_then(|idref| idref.non_blank()),
                "spine itemref `idref`",
            )?;

            if let Some(idref) = idref {
                itemrefs.push(ItemRef {
                    idref: idref.to_owned(),
                    linear: itemref.attribute("linear") != Some("no"),
                    properties: resolve_properties(
                        itemref.attribute("properties"),
                        prefixes,
                        Some(vocab::ITEMREF),
                    ),
                });
            }
        }

        let direction = match spine.attribute("page-progression-direction") {
            Some("ltr") => ReadingProgression::Ltr,
            Some("rtl") => ReadingProgression::Rtl,
            _ => ReadingProgression::Auto,
        };

        Ok(Spine {
            itemrefs,
            direction,
            toc: spine.attribute("toc").map(str::to_owned),
        })
    }
}
