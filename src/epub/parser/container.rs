use crate::epub::consts::{self, ns};
use crate::epub::errors::{EpubError, EpubResult};
use crate::epub::parser::{EpubParser, resolve_href};
use crate::util::str::StrExt;

impl EpubParser<'_> {
    /// Parses `META-INF/container.xml` and retrieves the package `.opf` file location.
    pub(super) fn parse_container(&self) -> EpubResult<String> {
        let container = self.read_xml(consts::CONTAINER)?;

        // Although rare, multiple package.opf locations could exist.
        // Only the first path is accepted as it is the default
        let full_path = container
            .root()
            .child_path(ns::OPC, &["rootfiles", "rootfile"])
            .and_then(|rootfile| rootfile.attribute("full-path"))
            .and_then(|full_path| full_path.non_blank());

        // Make location absolute
        full_path
            .and_then(|full_path| resolve_href(full_path, "/"))
            .ok_or(EpubError::NoOpfReference)
    }
}

#[cfg(test)]
mod tests {
    use crate::epub::parser::tests::MemoryFetcher;
    use crate::epub::{EpubError, EpubParser, EpubSettings};

    const CONTAINER: &str = r#"<?xml version="1.0"?>
        <container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
          <rootfiles>
            <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
          </rootfiles>
        </container>"#;

    #[test]
    fn test_parse_container() {
        let fetcher = MemoryFetcher::default().with("/META-INF/container.xml", CONTAINER);
        let settings = EpubSettings::default();
        let parser = EpubParser::new(&settings, &fetcher);

        assert_eq!("/OEBPS/content.opf", parser.parse_container().unwrap());
    }

    #[test]
    fn test_missing_rootfile() {
        let fetcher = MemoryFetcher::default().with(
            "/META-INF/container.xml",
            r#"<container xmlns="urn:oasis:names:tc:opendocument:xmlns:container"><rootfiles/></container>"#,
        );
        let settings = EpubSettings::default();
        let parser = EpubParser::new(&settings, &fetcher);

        assert!(matches!(parser.parse_container(), Err(EpubError::NoOpfReference)));
    }

    #[test]
    fn test_missing_container() {
        let fetcher = MemoryFetcher::default();
        let settings = EpubSettings::default();
        let parser = EpubParser::new(&settings, &fetcher);

        assert!(matches!(parser.parse_container(), Err(EpubError::Resource(_))));
    }
}
