use crate::fetcher::{BoxedResource, BytesResource};
use crate::manifest::{Link, Locations, Locator, Manifest, Text};
use crate::mediatype::MediaType;
use crate::publication::Service;
use crate::util::sync::Memo;
use crate::util::uri::split_suffix;

/// The href at which positions services serve their position list.
pub const POSITIONS_HREF: &str = "/~readium/positions.json";

/// Provides the discrete locations of a publication, whatever its format.
pub trait PositionsService: Service {
    /// The positions of the publication, grouped by reading order item.
    fn positions_by_reading_order(&self) -> &[Vec<Locator>];

    /// Every position of the publication.
    fn positions(&self) -> Vec<Locator> {
        self.positions_by_reading_order()
            .iter()
            .flatten()
            .cloned()
            .collect()
    }
}

pub(crate) fn positions_link() -> Link {
    Link::with_type(POSITIONS_HREF, &MediaType::READIUM_POSITION_LIST)
}

/// Serves `{"total": n, "positions": [...]}` when `link` targets [`POSITIONS_HREF`].
pub(crate) fn get_positions(service: &dyn PositionsService, link: &Link) -> Option<BoxedResource> {
    if split_suffix(&link.href).0 != POSITIONS_HREF {
        return None;
    }
    let positions = service.positions();
    let document = serde_json::json!({
        "total": positions.len(),
        "positions": positions,
    });

    Some(Box::new(BytesResource::new(positions_link(), move || {
        Ok(serde_json::to_vec(&document)?)
    })))
}

pub(crate) fn locator(link: &Link, fallback_type: &str, locations: Locations) -> Locator {
    Locator {
        href: link.href.clone(),
        r#type: link
            .r#type
            .clone()
            .filter(|r#type| !r#type.is_empty())
            .unwrap_or_else(|| fallback_type.to_owned()),
        title: link.title.clone(),
        locations,
        text: Text::default(),
    }
}

/// One position per reading order item, for publications without finer-grained locations
/// such as comics or audiobooks.
#[derive(Debug)]
pub struct PerResourcePositionsService {
    positions: Vec<Vec<Locator>>,
}

impl PerResourcePositionsService {
    /// `fallback_type` is the locator type of reading order items without one.
    pub fn new(reading_order: &[Link], fallback_type: &str) -> Self {
        let count = reading_order.len();
        let positions = reading_order
            .iter()
            .enumerate()
            .map(|(i, link)| {
                let locations = Locations {
                    position: Some(i as u64 + 1),
                    total_progression: Some(i as f64 / count as f64),
                    ..Locations::default()
                };
                vec![locator(link, fallback_type, locations)]
            })
            .collect();

        Self { positions }
    }
}

impl Service for PerResourcePositionsService {
    fn links(&self) -> Vec<Link> {
        vec![positions_link()]
    }

    fn get(&self, link: &Link) -> Option<BoxedResource> {
        get_positions(self, link)
    }

    fn as_positions(&self) -> Option<&dyn PositionsService> {
        Some(self)
    }
}

impl PositionsService for PerResourcePositionsService {
    fn positions_by_reading_order(&self) -> &[Vec<Locator>] {
        &self.positions
    }
}

/// One position per page of a PDF document.
///
/// Page titles are taken from the table of contents entries targeting `<href>#page=<n>`.
#[derive(Debug)]
pub struct PdfPositionsService {
    link: Link,
    page_count: u64,
    table_of_contents: Vec<Link>,
    positions: Memo<Vec<Vec<Locator>>>,
}

impl PdfPositionsService {
    pub fn new(link: Link, page_count: u64, table_of_contents: Vec<Link>) -> Self {
        Self {
            link,
            page_count,
            table_of_contents,
            positions: Memo::new(),
        }
    }

    /// Uses the first reading order item and the declared number of pages.
    pub fn from_manifest(manifest: &Manifest) -> Option<Self> {
        let link = manifest.reading_order.first()?;

        Some(Self::new(
            link.clone(),
            manifest.metadata.number_of_pages.unwrap_or_default(),
            manifest.table_of_contents.clone(),
        ))
    }

    fn compute(&self) -> Vec<Vec<Locator>> {
        (1..=self.page_count)
            .map(|page| {
                let fragment = format!("page={page}");
                let progression = (page - 1) as f64 / self.page_count as f64;
                let title = find_title(
                    &self.table_of_contents,
                    &format!("{}#{fragment}", self.link.href),
                );
                let mut locator = locator(
                    &self.link,
                    &MediaType::PDF.to_string(),
                    Locations {
                        fragments: vec![fragment],
                        progression: Some(progression),
                        position: Some(page),
                        total_progression: Some(progression),
                        ..Locations::default()
                    },
                );
                locator.title = title;
                vec![locator]
            })
            .collect()
    }
}

fn find_title(links: &[Link], href: &str) -> Option<String> {
    links.iter().find_map(|link| {
        if link.href == href {
            link.title.clone()
        } else {
            find_title(&link.children, href)
        }
    })
}

impl Service for PdfPositionsService {
    fn links(&self) -> Vec<Link> {
        vec![positions_link()]
    }

    fn get(&self, link: &Link) -> Option<BoxedResource> {
        get_positions(self, link)
    }

    fn as_positions(&self) -> Option<&dyn PositionsService> {
        Some(self)
    }
}

impl PositionsService for PdfPositionsService {
    fn positions_by_reading_order(&self) -> &[Vec<Locator>] {
        self.positions.get_or_init(|| self.compute())
    }
}

#[cfg(test)]
mod tests {
    use super::{PdfPositionsService, PerResourcePositionsService, PositionsService};
    use crate::fetcher::Resource;
    use crate::manifest::Link;
    use crate::mediatype::MediaType;
    use crate::publication::Service;

    #[test]
    fn test_per_resource_positions() {
        let reading_order = [
            Link::with_type("/page1.jpg", &MediaType::JPEG),
            Link::new("/page2.png"),
        ];
        let service = PerResourcePositionsService::new(&reading_order, "image/png");
        let positions = service.positions();

        assert_eq!(2, positions.len());
        assert_eq!("image/jpeg", positions[0].r#type);
        assert_eq!("image/png", positions[1].r#type);

        #[rustfmt::skip]
        let expected = [
            (Some(1), Some(0.0)),
            (Some(2), Some(0.5)),
        ];
        for (locator, (position, total_progression)) in positions.iter().zip(expected) {
            assert_eq!(position, locator.locations.position);
            assert_eq!(total_progression, locator.locations.total_progression);
            assert_eq!(None, locator.locations.progression);
        }
    }

    #[test]
    fn test_pdf_positions() {
        let mut chapter = Link::new("/book.pdf#page=2");
        chapter.title = Some("Chapter 1".to_owned());
        let mut part = Link::new("/book.pdf#page=1");
        part.children.push(chapter);

        let service = PdfPositionsService::new(Link::new("/book.pdf"), 4, vec![part]);
        let by_reading_order = service.positions_by_reading_order();

        assert_eq!(4, by_reading_order.len());
        let positions = service.positions();
        assert_eq!(vec!["page=3".to_owned()], positions[2].locations.fragments);
        assert_eq!(Some(0.5), positions[2].locations.progression);
        assert_eq!(Some(3), positions[2].locations.position);
        assert_eq!("application/pdf", positions[2].r#type);
        assert_eq!(Some("Chapter 1"), positions[1].title.as_deref());
        assert_eq!(None, positions[0].title);
    }

    #[test]
    fn test_positions_resource() {
        let service = PerResourcePositionsService::new(&[Link::new("/a.jpg")], "image/jpeg");

        assert!(service.get(&Link::new("/a.jpg")).is_none());
        let resource = service.get(&Link::new("/~readium/positions.json")).unwrap();
        let json = resource.read_as_json().unwrap();

        assert_eq!(1, json["total"]);
        assert_eq!("/a.jpg", json["positions"][0]["href"]);
        assert_eq!(1, json["positions"][0]["locations"]["position"]);
        assert_eq!(
            Some("application/vnd.readium.position-list+json"),
            resource.link().r#type.as_deref(),
        );
    }
}
