//! Media overlays served as guided navigation documents.

use crate::epub::errors::{EpubError, EpubResult};
use crate::epub::parser::parse_smil;
use crate::fetcher::{BoxedResource, BytesResource, FailureResource, Fetcher, Resource, ResourceError};
use crate::manifest::{GuidedNavigationDocument, Link, Manifest};
use crate::mediatype::MediaType;
use crate::publication::Service;
use crate::util::href::Href;
use crate::util::sync::Shared;
use crate::util::uri::split_suffix;
use std::collections::HashMap;

/// The templated href of guided navigation documents, keyed by the reading order href.
pub const GUIDED_NAVIGATION_TEMPLATE: &str = "/~readium/guided{?ref}";
const GUIDED_NAVIGATION_PATH: &str = "/~readium/guided";

fn guided_link() -> Link {
    Link {
        templated: true,
        ..Link::with_type(GUIDED_NAVIGATION_TEMPLATE, &MediaType::GUIDED_NAVIGATION)
    }
}

fn guided_link_for(href: &str) -> Link {
    guided_link().expand_template(&HashMap::from([("ref".to_owned(), href.to_owned())]))
}

/// Replaces the SMIL alternate of each reading order item with its guided navigation link.
///
/// Returns the replaced SMIL links, in reading order, keyed by the href of their item.
pub(crate) fn extract_guides(manifest: &mut Manifest) -> Vec<(String, Link)> {
    let mut guides = Vec::new();

    for link in &mut manifest.reading_order {
        let smil = link
            .alternates
            .iter()
            .position(|alternate| alternate.media_type().matches(&MediaType::SMIL));

        if let Some(index) = smil {
            let guided = guided_link_for(&link.href);
            let smil = std::mem::replace(&mut link.alternates[index], guided);
            guides.push((link.href.clone(), smil));
        }
    }
    guides
}

/// Serves the media overlays of an EPUB as [`GuidedNavigationDocument`]s.
///
/// The document of a reading order item is served at the expansion of
/// [`GUIDED_NAVIGATION_TEMPLATE`], e.g. `/~readium/guided?ref=/OEBPS/chapter1.xhtml`.
pub struct MediaOverlayService {
    fetcher: Shared<dyn Fetcher>,
    guides: Vec<(String, Link)>,
}

impl MediaOverlayService {
    pub(crate) fn new(fetcher: Shared<dyn Fetcher>, guides: Vec<(String, Link)>) -> Self {
        Self { fetcher, guides }
    }

    fn index_of(&self, href: &str) -> Option<usize> {
        self.guides.iter().position(|(guided, _)| guided == href)
    }

    /// Returns `true` if the reading order item at `href` has a media overlay.
    pub fn has_guide_for_resource(&self, href: &str) -> bool {
        self.index_of(href).is_some()
    }

    /// The guided navigation document of the reading order item at `href`,
    /// linked to the documents of the previous and next items having one.
    ///
    /// Returns [`None`] if the item has no media overlay.
    ///
    /// # Errors
    /// The media overlay cannot be read or is not a valid SMIL document.
    pub fn guide_for_resource(&self, href: &str) -> EpubResult<Option<GuidedNavigationDocument>> {
        let Some(index) = self.index_of(href) else {
            return Ok(None);
        };
        let smil = &self.guides[index].1;
        let resource = self.fetcher.get(smil);
        let xml = resource.read_as_xml();
        resource.close();

        let mut document = parse_smil(&xml?, &smil.href)?;

        if let Some((previous, _)) = index.checked_sub(1).and_then(|i| self.guides.get(i)) {
            let mut link = guided_link_for(previous);
            link.add_rel("prev");
            document.links.push(link);
        }
        if let Some((next, _)) = self.guides.get(index + 1) {
            let mut link = guided_link_for(next);
            link.add_rel("next");
            document.links.push(link);
        }
        Ok(Some(document))
    }

    fn resource(&self, reference: &str) -> BoxedResource {
        let link = guided_link_for(reference);

        let error = match self.guide_for_resource(reference) {
            Ok(Some(document)) => match serde_json::to_vec(&document) {
                Ok(data) => return Box::new(BytesResource::new(link, move || Ok(data.clone()))),
                Err(error) => error.into(),
            },
            Ok(None) => ResourceError::not_found(format!(
                "`{reference}` has no guided navigation document"
            )),
            Err(EpubError::Resource(error)) => error,
            Err(error) => ResourceError::other(error),
        };
        Box::new(FailureResource::new(link, error))
    }
}

impl Service for MediaOverlayService {
    fn links(&self) -> Vec<Link> {
        vec![guided_link()]
    }

    fn get(&self, link: &Link) -> Option<BoxedResource> {
        if split_suffix(&link.href).0 != GUIDED_NAVIGATION_PATH {
            return None;
        }
        let reference = Href::new(&link.href, "")
            .query_parameters()
            .ok()?
            .into_iter()
            .find_map(|(name, value)| (name == "ref" && !value.is_empty()).then_some(value))?;

        Some(self.resource(&reference))
    }
}

impl std::fmt::Debug for MediaOverlayService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaOverlayService")
            .field("guides", &self.guides)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::{MediaOverlayService, extract_guides};
    use crate::epub::parser::tests::MemoryFetcher;
    use crate::fetcher::{Resource, ResourceError};
    use crate::manifest::{Link, Manifest};
    use crate::mediatype::MediaType;
    use crate::publication::Service;
    use crate::util::sync::Shared;

    const SMIL: &str = r#"<smil xmlns="http://www.w3.org/ns/SMIL" version="3.0">
        <body>
          <par><text src="c1.xhtml#p1"/><audio src="c1.mp3" clipBegin="0s" clipEnd="2s"/></par>
        </body>
      </smil>"#;

    fn item(href: &str, smil: Option<&str>) -> Link {
        let mut link = Link::with_type(href, &MediaType::XHTML);
        link.alternates.extend(smil.map(|smil| Link::with_type(smil, &MediaType::SMIL)));
        link
    }

    fn service() -> (Manifest, MediaOverlayService) {
        let mut manifest = Manifest {
            reading_order: vec![
                item("/OEBPS/c1.xhtml", Some("/OEBPS/c1.smil")),
                item("/OEBPS/c2.xhtml", None),
                item("/OEBPS/c3.xhtml", Some("/OEBPS/broken.smil")),
                item("/OEBPS/c4.xhtml", Some("/OEBPS/missing.smil")),
            ],
            ..Manifest::default()
        };
        let fetcher = MemoryFetcher::default()
            .with("/OEBPS/c1.smil", SMIL)
            .with("/OEBPS/broken.smil", "<smil/>");
        let guides = extract_guides(&mut manifest);

        (manifest, MediaOverlayService::new(Shared::new(fetcher), guides))
    }

    #[test]
    fn test_extract_guides() {
        let (manifest, service) = service();
        let alternate = &manifest.reading_order[0].alternates[0];

        assert_eq!("/~readium/guided?ref=/OEBPS/c1.xhtml", alternate.href);
        assert_eq!(Some("application/guided-navigation+json"), alternate.r#type.as_deref());
        assert!(!alternate.templated);
        assert!(manifest.reading_order[1].alternates.is_empty());

        assert!(service.has_guide_for_resource("/OEBPS/c1.xhtml"));
        assert!(!service.has_guide_for_resource("/OEBPS/c2.xhtml"));
        assert_eq!(vec![Link {
            templated: true,
            ..Link::with_type("/~readium/guided{?ref}", &MediaType::GUIDED_NAVIGATION)
        }], service.links());
    }

    #[test]
    fn test_guide_for_resource() {
        let (_, service) = service();
        let document = service.guide_for_resource("/OEBPS/c1.xhtml").unwrap().unwrap();

        assert_eq!(Some("/OEBPS/c1.xhtml#p1"), document.guided[0].text_ref.as_deref());
        assert_eq!(Some("/OEBPS/c1.mp3#t=0,2"), document.guided[0].audio_ref.as_deref());
        assert_eq!(1, document.links.len());
        assert_eq!("/~readium/guided?ref=/OEBPS/c3.xhtml", document.links[0].href);
        assert!(document.links[0].has_rel("next"));

        let document = service.guide_for_resource("/OEBPS/c3.xhtml");
        assert!(document.is_err());
        assert!(service.guide_for_resource("/OEBPS/c2.xhtml").unwrap().is_none());
    }

    #[test]
    fn test_get() {
        let (manifest, service) = service();

        let resource = service.get(&manifest.reading_order[0].alternates[0]).unwrap();
        let json = resource.read_as_json().unwrap();
        assert_eq!("/OEBPS/c1.xhtml#p1", json["guided"][0]["textref"]);

        let missing = service.get(&Link::new("/~readium/guided?ref=/OEBPS/c4.xhtml")).unwrap();
        assert!(matches!(missing.read(0, 0), Err(ResourceError::NotFound { .. })));
        let unrelated = service.get(&Link::new("/~readium/guided?ref=/OEBPS/c2.xhtml")).unwrap();
        assert!(matches!(unrelated.read(0, 0), Err(ResourceError::NotFound { .. })));

        assert!(service.get(&Link::new("/~readium/guided")).is_none());
        assert!(service.get(&Link::new("/OEBPS/c1.xhtml")).is_none());
    }
}
