use crate::fetcher::{BoxedResource, Fetcher, Resource};
use crate::manifest::{Layout, Link, Locations, Locator, Presentation};
use crate::publication::positions::{get_positions, locator, positions_link};
use crate::publication::{PositionsService, Service};
use crate::util::sync::{Memo, Shared};

/// How many positions a reflowable resource spans.
///
/// A fixed-layout resource always has a single position.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReflowableStrategy {
    /// Splits the length of the archive entry, compressed or stored, into pages.
    ///
    /// Also used by Adobe RMSDK.
    ArchiveEntryLength { page_length: u64 },
    /// Splits the length of the resource before compression and encryption into pages.
    OriginalLength { page_length: u64 },
}

impl ReflowableStrategy {
    /// The number of positions of `resource`, at least `1`.
    pub fn position_count(&self, resource: &dyn Resource) -> u64 {
        let (length, page_length) = match *self {
            Self::ArchiveEntryLength { page_length } => (
                resource
                    .link()
                    .properties
                    .archive()
                    .map(|archive| archive.entry_length)
                    .or_else(|| resource.length().ok()),
                page_length,
            ),
            Self::OriginalLength { page_length } => (
                resource
                    .link()
                    .properties
                    .encrypted()
                    .and_then(|encryption| encryption.original_length)
                    .or_else(|| resource.length().ok()),
                page_length,
            ),
        };

        match (length.unwrap_or_default(), page_length) {
            (_, 0) | (0, _) => 1,
            (length, page_length) => length.div_ceil(page_length),
        }
    }
}

impl Default for ReflowableStrategy {
    fn default() -> Self {
        Self::ArchiveEntryLength { page_length: 1024 }
    }
}

/// Positions of an EPUB, computed from the length of each reading order resource.
///
/// Positions are computed once, on first access.
pub struct EpubPositionsService {
    reading_order: Vec<Link>,
    presentation: Presentation,
    fetcher: Shared<dyn Fetcher>,
    strategy: ReflowableStrategy,
    positions: Memo<Vec<Vec<Locator>>>,
}

impl EpubPositionsService {
    pub fn new(
        reading_order: Vec<Link>,
        presentation: Presentation,
        fetcher: Shared<dyn Fetcher>,
        strategy: ReflowableStrategy,
    ) -> Self {
        Self {
            reading_order,
            presentation,
            fetcher,
            strategy,
            positions: Memo::new(),
        }
    }

    fn compute(&self) -> Vec<Vec<Locator>> {
        let mut last_position = 0;
        let mut positions = self
            .reading_order
            .iter()
            .map(|link| {
                let count = match self.presentation.layout_of(link) {
                    Layout::Fixed => 1,
                    _ => {
                        let resource = self.fetcher.get(link);
                        let count = self.strategy.position_count(resource.as_ref());
                        resource.close();
                        count
                    }
                };
                let locators = (0..count)
                    .map(|page| {
                        let locations = Locations {
                            progression: Some(page as f64 / count as f64),
                            position: Some(last_position + page + 1),
                            ..Locations::default()
                        };
                        locator(link, "text/html", locations)
                    })
                    .collect::<Vec<_>>();

                last_position += count;
                locators
            })
            .collect::<Vec<_>>();

        let total = last_position as f64;
        for locator in positions.iter_mut().flatten() {
            locator.locations.total_progression = locator
                .locations
                .position
                .map(|position| (position - 1) as f64 / total);
        }
        positions
    }
}

impl Service for EpubPositionsService {
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

impl PositionsService for EpubPositionsService {
    fn positions_by_reading_order(&self) -> &[Vec<Locator>] {
        self.positions.get_or_init(|| self.compute())
    }
}

impl std::fmt::Debug for EpubPositionsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EpubPositionsService")
            .field("reading_order", &self.reading_order.len())
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::{EpubPositionsService, ReflowableStrategy};
    use crate::fetcher::{BoxedResource, BytesResource, FailureResource, Fetcher, ResourceResult};
    use crate::manifest::{ArchiveProperties, Encryption, Layout, Link, Presentation};
    use crate::publication::PositionsService;
    use crate::util::sync::Shared;

    /// Resources whose archive entry length is encoded in their href, e.g. `/3000.xhtml`.
    struct EntryLengthFetcher;

    impl Fetcher for EntryLengthFetcher {
        fn links(&self) -> ResourceResult<Vec<Link>> {
            Ok(Vec::new())
        }

        fn get(&self, link: &Link) -> BoxedResource {
            let Some(length) = link
                .href
                .trim_start_matches('/')
                .split('.')
                .next()
                .and_then(|length| length.parse::<u64>().ok())
            else {
                return Box::new(FailureResource::not_found(link.clone()));
            };
            let mut link = link.clone();
            link.properties.insert(
                "archive",
                ArchiveProperties {
                    entry_length: length,
                    is_entry_compressed: true,
                },
            );
            Box::new(BytesResource::new(link, move || Ok(vec![0; length as usize * 2])))
        }
    }

    fn service(reading_order: Vec<Link>, strategy: ReflowableStrategy) -> EpubPositionsService {
        EpubPositionsService::new(
            reading_order,
            Presentation::default(),
            Shared::new(EntryLengthFetcher),
            strategy,
        )
    }

    fn fixed(href: &str) -> Link {
        let mut link = Link::new(href);
        link.properties.insert("layout", Layout::Fixed.as_str());
        link
    }

    #[test]
    fn test_positions_by_reading_order() {
        let service = service(
            vec![fixed("/204800.xhtml"), Link::new("/3000.xhtml"), Link::new("/1.xhtml")],
            ReflowableStrategy::default(),
        );
        let by_reading_order = service.positions_by_reading_order();

        assert_eq!(vec![1, 3, 1], by_reading_order.iter().map(Vec::len).collect::<Vec<_>>());

        #[rustfmt::skip]
        let expected = [
            ("/204800.xhtml", 0.0, 1, 0.0),
            ("/3000.xhtml", 0.0, 2, 0.2),
            ("/3000.xhtml", 1.0 / 3.0, 3, 0.4),
            ("/3000.xhtml", 2.0 / 3.0, 4, 0.6),
            ("/1.xhtml", 0.0, 5, 0.8),
        ];
        let positions = service.positions();
        assert_eq!(expected.len(), positions.len());

        for (locator, (href, progression, position, total_progression)) in positions.iter().zip(expected) {
            assert_eq!(href, locator.href);
            assert_eq!("text/html", locator.r#type);
            assert_eq!(Some(progression), locator.locations.progression);
            assert_eq!(Some(position), locator.locations.position);
            assert_eq!(Some(total_progression), locator.locations.total_progression);
        }
    }

    #[test]
    fn test_fixed_publication() {
        let service = EpubPositionsService::new(
            vec![Link::new("/5000.xhtml"), Link::new("/missing.xhtml")],
            Presentation {
                layout: Some(Layout::Fixed),
                ..Presentation::default()
            },
            Shared::new(EntryLengthFetcher),
            ReflowableStrategy::default(),
        );

        assert_eq!(2, service.positions().len());
    }

    #[test]
    fn test_original_length_strategy() {
        let mut encrypted = Link::new("/100.xhtml");
        encrypted.properties.insert(
            "encrypted",
            serde_json::to_value(Encryption {
                original_length: Some(5000),
                ..Encryption::new("http://www.w3.org/2001/04/xmlenc#aes256-cbc")
            })
            .unwrap(),
        );
        let service = service(
            vec![encrypted, Link::new("/1024.xhtml")],
            ReflowableStrategy::OriginalLength { page_length: 1000 },
        );
        let by_reading_order = service.positions_by_reading_order();

        // The resource length is twice its entry length
        assert_eq!(vec![5, 3], by_reading_order.iter().map(Vec::len).collect::<Vec<_>>());
    }

    #[test]
    fn test_unreadable_resource() {
        let service = service(vec![Link::new("/missing.xhtml")], ReflowableStrategy::default());

        assert_eq!(1, service.positions().len());
    }
}
