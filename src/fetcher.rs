//! # Overview
//! Pluggable access to the resources of a publication.
//!
//! A [`Fetcher`] hands out a [`Resource`] for any [`Link`], never failing at retrieval:
//! an unknown link yields a [`FailureResource`] carrying [`ResourceError::NotFound`],
//! and errors surface only once the resource is read.
//!
//! | Fetcher                 | Source                                              |
//! |-------------------------|-----------------------------------------------------|
//! | [`ArchiveFetcher`]      | Entries of a ZIP or exploded [`Archive`](crate::archive::Archive) |
//! | [`FileFetcher`]         | Files under one or more local directories           |
//! | [`TransformingFetcher`] | Another fetcher, with [transformers](ResourceTransformer) applied |
//! | [`EmptyFetcher`]        | Nothing                                             |
//!
//! ```no_run
//! # use rpub::fetcher::{ArchiveFetcher, Fetcher, Resource};
//! # use rpub::manifest::Link;
//! let fetcher = ArchiveFetcher::open("childrens-literature.epub").unwrap();
//! let mimetype = fetcher.get(&Link::new("/mimetype"));
//!
//! assert_eq!("application/epub+zip", mimetype.read_as_string().unwrap());
//! fetcher.close();
//! ```

mod archive;
mod errors;
mod file;
mod resource;
mod transforming;

pub use self::archive::ArchiveFetcher;
pub use self::errors::{ErrorCause, ResourceError, ResourceResult};
pub use self::file::FileFetcher;
pub use self::resource::{
    BoxedResource, BytesResource, EntryResource, FailureResource, FileResource, Resource,
    ResourceReadSeeker, TransformingResource,
};
pub use self::transforming::{ResourceTransformer, TransformingFetcher};

use crate::manifest::Link;
use crate::util::sync::SendAndSync;

/// Provides access to the [resources](Resource) of a publication.
pub trait Fetcher: SendAndSync {
    /// The known resources, with a best-effort media type derived from their extension.
    fn links(&self) -> ResourceResult<Vec<Link>>;

    /// The resource at `link`.
    ///
    /// Retrieval never fails; an unknown `link` yields a resource that fails once read.
    fn get(&self, link: &Link) -> BoxedResource;

    /// Closes the fetcher and any underlying source, invalidating live resources.
    fn close(&self) {}
}

impl<T: Fetcher + ?Sized> Fetcher for Box<T> {
    fn links(&self) -> ResourceResult<Vec<Link>> {
        (**self).links()
    }

    fn get(&self, link: &Link) -> BoxedResource {
        (**self).get(link)
    }

    fn close(&self) {
        (**self).close()
    }
}

/// A fetcher providing no resources.
#[derive(Copy, Clone, Debug, Default)]
pub struct EmptyFetcher;

impl Fetcher for EmptyFetcher {
    fn links(&self) -> ResourceResult<Vec<Link>> {
        Ok(Vec::new())
    }

    fn get(&self, link: &Link) -> BoxedResource {
        Box::new(FailureResource::not_found(link.clone()))
    }
}

/// The path of `href` within a fetcher, without its query and fragment.
fn resource_path(href: &str) -> &str {
    crate::util::uri::split_suffix(href).0
}
