mod ncx;
mod xhtml;

use crate::epub::consts::vocab;
use crate::epub::errors::EpubResult;
use crate::epub::package::{Item, PackageDocument};
use crate::epub::parser::EpubParser;
use crate::manifest::Link;
use crate::mediatype::MediaType;
use std::collections::HashMap;

/// Navigation lists keyed by their type, such as `toc` or `page-list`.
pub(in crate::epub) type Navigation = HashMap<String, Vec<Link>>;

impl EpubParser<'_> {
    /// Parses the navigation document of EPUB 3 publications,
    /// or the NCX of older ones.
    ///
    /// Navigation is optional: a missing or malformed document yields no navigation.
    pub(super) fn parse_navigation(&self, package: &PackageDocument) -> Navigation {
        let result = if package.epub_version < 3.0 {
            self.ncx_item(package)
                .map(|ncx| self.parse_ncx(&ncx.href))
        } else {
            self.nav_item(package)
                .map(|nav| self.parse_nav_document(&nav.href))
        };

        match result {
            Some(Ok(navigation)) => navigation,
            Some(Err(error)) => {
                log::warn!("Ignoring unreadable navigation: {error}");
                Navigation::new()
            }
            None => Navigation::new(),
        }
    }

    /// The item referenced by the spine `toc` attribute,
    /// else the first item declared as an NCX.
    fn ncx_item<'p>(&self, package: &'p PackageDocument) -> Option<&'p Item> {
        package
            .spine
            .toc
            .as_deref()
            .and_then(|id| package.item_by_id(id))
            .or_else(|| {
                package.manifest.iter().find(|item| {
                    item.media_type
                        .as_deref()
                        .is_some_and(|media_type| MediaType::NCX.matches_str(media_type))
                })
            })
    }

    fn nav_item<'p>(&self, package: &'p PackageDocument) -> Option<&'p Item> {
        let nav = format!("{}nav", vocab::ITEM);
        package
            .manifest
            .iter()
            .find(|item| item.properties.contains(&nav))
    }

    fn parse_ncx(&self, href: &str) -> EpubResult<Navigation> {
        let document = self.read_xml(href)?;
        Ok(ncx::parse(document.root(), href))
    }

    fn parse_nav_document(&self, href: &str) -> EpubResult<Navigation> {
        let document = self.read_xml(href)?;
        Ok(xhtml::parse(document.root(), href))
    }
}

/// Drops entries with neither children nor a meaningful target.
fn is_empty_entry(link: &Link) -> bool {
    link.children.is_empty()
        && (link.href == "#" || link.title.as_deref().is_none_or(str::is_empty))
}

#[cfg(test)]
mod tests {
    use crate::epub::parser::tests::MemoryFetcher;
    use crate::epub::{EpubParser, EpubSettings};

    const OPF: &str = "/OEBPS/content.opf";

    fn opf(version: &str, manifest: &str, spine: &str) -> String {
        format!(
            r#"<package xmlns="http://www.idpf.org/2007/opf" version="{version}">
                 <metadata/><manifest>{manifest}</manifest>{spine}
               </package>"#
        )
    }

    const NCX: &str = r#"<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/">
        <navMap>
          <navPoint><navLabel><text>Chapter 1</text></navLabel><content src="c1.xhtml"/></navPoint>
        </navMap>
      </ncx>"#;

    const NAV: &str = r#"<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
        <body><nav epub:type="toc"><ol><li><a href="c1.xhtml">Chapter 1</a></li></ol></nav></body>
      </html>"#;

    fn navigation(fetcher: MemoryFetcher) -> super::Navigation {
        let settings = EpubSettings::default();
        let parser = EpubParser::new(&settings, &fetcher);
        let package = parser.parse_package(OPF).unwrap();
        parser.parse_navigation(&package)
    }

    #[test]
    fn test_epub2_ncx_from_spine() {
        let fetcher = MemoryFetcher::default()
            .with(OPF, opf("2.0", r#"<item id="t" href="toc.ncx" media-type="text/xml"/>"#, r#"<spine toc="t"/>"#))
            .with("/OEBPS/toc.ncx", NCX);

        let navigation = navigation(fetcher);
        assert_eq!("/OEBPS/c1.xhtml", navigation["toc"][0].href);
    }

    #[test]
    fn test_epub2_ncx_by_media_type() {
        let fetcher = MemoryFetcher::default()
            .with(OPF, opf("2.0", r#"<item id="t" href="toc.ncx" media-type="application/x-dtbncx+xml"/>"#, "<spine/>"))
            .with("/OEBPS/toc.ncx", NCX);

        assert_eq!(1, navigation(fetcher)["toc"].len());
    }

    #[test]
    fn test_epub3_nav_document() {
        let manifest = r#"<item id="n" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
                          <item id="t" href="toc.ncx" media-type="application/x-dtbncx+xml"/>"#;
        let fetcher = MemoryFetcher::default()
            .with(OPF, opf("3.0", manifest, r#"<spine toc="t"/>"#))
            .with("/OEBPS/nav.xhtml", NAV)
            .with("/OEBPS/toc.ncx", "<ncx/>");

        let navigation = navigation(fetcher);
        assert_eq!(Some("Chapter 1"), navigation["toc"][0].title.as_deref());
    }

    #[test]
    fn test_missing_navigation() {
        let manifest = r#"<item id="n" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>"#;
        let fetcher = MemoryFetcher::default().with(OPF, opf("3.0", manifest, "<spine/>"));

        assert!(navigation(fetcher).is_empty());
    }
}
