//! # Overview
//! A [`Publication`] bundles a parsed [`Manifest`], the [`Fetcher`] serving its resources,
//! and the [services](Service) computing derived data such as positions.
//!
//! ```no_run
//! # use rpub::publication::{Publication, PublicationOptions};
//! let publication = Publication::open("childrens-literature.epub", PublicationOptions::default()).unwrap();
//!
//! for locator in publication.positions() {
//!     println!("{} @ {:?}", locator.href, locator.locations.position);
//! }
//! publication.close();
//! ```
//!
//! # Services
//! Services are registered through a [`ServicesBuilder`], keyed by name, and created once the
//! manifest and fetcher are known.
//! The links of every service are appended to [`Manifest::links`], and
//! [`Publication::get`] routes requests to services before the fetcher.

pub(crate) mod positions;

pub use self::positions::{
    POSITIONS_HREF, PdfPositionsService, PerResourcePositionsService, PositionsService,
};

use crate::epub::{self, EpubSettings};
use crate::errors::{PublicationError, PublicationResult};
use crate::fetcher::{ArchiveFetcher, BoxedResource, Fetcher};
use crate::manifest::{Link, Locator, Manifest};
use crate::mediatype::MediaType;
use crate::util::sync::{SendAndSync, Shared};
use crate::webpub;
use std::any::Any;
use std::collections::BTreeMap;
use std::path::Path;

/// Upcasting to [`Any`], allowing [`Publication::find_service`] to recover concrete services.
///
/// Implemented for every `'static` type.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Computes data derived from a publication, served as resources.
pub trait Service: AsAny + SendAndSync {
    /// Links to the resources served by this service.
    ///
    /// Added to [`Manifest::links`] when the publication is created.
    fn links(&self) -> Vec<Link> {
        Vec::new()
    }

    /// The resource at `link`, or [`None`] if `link` is not handled by this service.
    fn get(&self, _link: &Link) -> Option<BoxedResource> {
        None
    }

    /// Releases any resource held by the service.
    fn close(&self) {}

    /// Returns `self` as a [`PositionsService`], if applicable.
    fn as_positions(&self) -> Option<&dyn PositionsService> {
        None
    }
}

/// What a service factory receives to create a [`Service`].
pub struct ServiceContext<'a> {
    pub manifest: &'a Manifest,
    pub fetcher: &'a Shared<dyn Fetcher>,
}

type ServiceFactory = Box<dyn Fn(&ServiceContext) -> Box<dyn Service>>;

/// Named [`Service`] factories.
///
/// Setting a factory under an existing name replaces it.
///
/// ```
/// # use rpub::publication::{PerResourcePositionsService, ServicesBuilder};
/// let mut services = ServicesBuilder::new();
/// services.set("positions", |context| {
///     Box::new(PerResourcePositionsService::new(&context.manifest.reading_order, "image/jpeg"))
/// });
///
/// assert!(services.contains("positions"));
/// ```
#[derive(Default)]
pub struct ServicesBuilder {
    factories: BTreeMap<String, ServiceFactory>,
}

impl ServicesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&ServiceContext) -> Box<dyn Service> + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
        self
    }

    pub fn remove(&mut self, name: &str) -> &mut Self {
        self.factories.remove(name);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Creates every registered service.
    pub fn build(&self, context: &ServiceContext) -> Vec<Box<dyn Service>> {
        self.factories
            .iter()
            .map(|(name, factory)| {
                log::debug!("Creating publication service `{name}`");
                factory(context)
            })
            .collect()
    }
}

impl std::fmt::Debug for ServicesBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.factories.keys()).finish()
    }
}

/// Options for [`Publication::open`].
#[derive(Clone, Debug, Default)]
pub struct PublicationOptions {
    /// Settings applied when the file is an EPUB.
    pub epub: EpubSettings,
    /// Media type hints, e.g. a `Content-Type` header.
    pub media_types: Vec<String>,
    /// File extension hints, in addition to the extension of the path.
    pub file_extensions: Vec<String>,
}

/// A parsed publication, with access to its resources and services.
pub struct Publication {
    manifest: Manifest,
    fetcher: Shared<dyn Fetcher>,
    services: Vec<Box<dyn Service>>,
}

impl Publication {
    /// Creates a publication, instantiating the given `services`.
    ///
    /// The links of each service are appended to the manifest.
    pub fn new(mut manifest: Manifest, fetcher: Box<dyn Fetcher>, services: &ServicesBuilder) -> Self {
        let fetcher: Shared<dyn Fetcher> = Shared::from(fetcher);
        let services = services.build(&ServiceContext {
            manifest: &manifest,
            fetcher: &fetcher,
        });
        manifest
            .links
            .extend(services.iter().flat_map(|service| service.links()));

        Self {
            manifest,
            fetcher,
            services,
        }
    }

    /// Opens the publication file or exploded directory at `path`.
    ///
    /// Supported formats are EPUB, packaged Readium Web Publications
    /// (including audiobooks, Divina and LCP-protected PDF), CBZ and ZAB.
    ///
    /// # Errors
    /// - [`PublicationError::UnsupportedFormat`]: The format is not recognized.
    /// - Any error raised while opening or parsing the publication.
    pub fn open(path: impl AsRef<Path>, options: PublicationOptions) -> PublicationResult<Self> {
        let path = path.as_ref();
        let media_types = options.media_types.iter().map(String::as_str).collect::<Vec<_>>();
        let extensions = options.file_extensions.iter().map(String::as_str).collect::<Vec<_>>();

        let media_type = MediaType::of_file(path, &media_types, &extensions)
            .ok_or_else(|| PublicationError::UnsupportedFormat(path.display().to_string()))?;
        log::debug!("Opening `{}` as `{media_type}`", path.display());

        let fetcher = ArchiveFetcher::open(path)?;
        let title = file_stem(path);

        if media_type.matches(&MediaType::EPUB) {
            let mut settings = options.epub;
            if settings.fallback_title.is_empty() {
                settings.fallback_title = title;
            }
            epub::open(Box::new(fetcher), &settings)
        } else if media_type.matches(&MediaType::CBZ) {
            webpub::open_images(Box::new(fetcher), &title)
        } else if media_type.matches(&MediaType::ZAB) {
            webpub::open_audio(Box::new(fetcher), &title)
        } else if media_type.matches_any(&[
            MediaType::READIUM_WEBPUB,
            MediaType::READIUM_AUDIOBOOK,
            MediaType::DIVINA,
            MediaType::LCP_PROTECTED_AUDIOBOOK,
            MediaType::LCP_PROTECTED_PDF,
        ]) {
            webpub::open(Box::new(fetcher), &media_type)
        } else {
            fetcher.close();
            Err(PublicationError::UnsupportedFormat(media_type.to_string()))
        }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn fetcher(&self) -> &dyn Fetcher {
        self.fetcher.as_ref()
    }

    /// The resource at `link`.
    ///
    /// Service links are answered by their service.
    /// An untyped link borrows the properties of the manifest link with the same href.
    pub fn get(&self, link: &Link) -> BoxedResource {
        if let Some(resource) = self.services.iter().find_map(|service| service.get(link)) {
            return resource;
        }
        match (&link.r#type, self.manifest.link_with_href(&link.href)) {
            (None, Some(declared)) => self.fetcher.get(declared),
            _ => self.fetcher.get(link),
        }
    }

    /// Shorthand for [`Self::get`] with a bare href.
    pub fn get_href(&self, href: &str) -> BoxedResource {
        self.get(&Link::new(href))
    }

    /// The first registered service of type `T`.
    ///
    /// ```no_run
    /// # use rpub::epub::MediaOverlayService;
    /// # use rpub::publication::{Publication, PublicationOptions};
    /// let publication = Publication::open("moby-dick.epub", PublicationOptions::default()).unwrap();
    /// let overlays = publication.find_service::<MediaOverlayService>().unwrap();
    ///
    /// assert!(overlays.has_guide_for_resource("/OEBPS/chapter_001.xhtml"));
    /// ```
    pub fn find_service<T: Service + 'static>(&self) -> Option<&T> {
        self.services
            .iter()
            .find_map(|service| service.as_ref().as_any().downcast_ref::<T>())
    }

    fn positions_service(&self) -> Option<&dyn PositionsService> {
        self.services.iter().find_map(|service| service.as_positions())
    }

    /// Every position of the publication, or none without a positions service.
    pub fn positions(&self) -> Vec<Locator> {
        self.positions_service()
            .map(|service| service.positions())
            .unwrap_or_default()
    }

    /// The positions of each reading order item.
    pub fn positions_by_reading_order(&self) -> &[Vec<Locator>] {
        self.positions_service()
            .map(|service| service.positions_by_reading_order())
            .unwrap_or_default()
    }

    /// Closes the services and the fetcher.
    pub fn close(&self) {
        for service in &self.services {
            service.close();
        }
        self.fetcher.close();
    }
}

impl std::fmt::Debug for Publication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publication")
            .field("manifest", &self.manifest)
            .field("services", &self.services.len())
            .finish_non_exhaustive()
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
