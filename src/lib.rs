//! # rpub
//! A Readium Web Publication toolkit: parses publications into
//! [Readium Web Publication Manifests](https://readium.org/webpub-manifest/)
//! and gives range-capable access to their resources.
//!
//! ## Overview
//! - [`mediatype`]: Media types and content sniffing.
//! - [`archive`]: Entries of a ZIP file or an exploded directory.
//! - [`fetcher`]: Resources of a publication, with pluggable transformations.
//! - [`manifest`]: The RWPM model and its JSON form.
//! - [`epub`]: EPUB 2 and 3 parsing, font deobfuscation, positions and media overlays.
//! - [`publication`]: A manifest bundled with its fetcher and services.
//! - [`webpub`]: Packaged Readium Web Publications, CBZ and ZAB.
//!
//! ## Features
//! - `threadsafe` (default): Publications, fetchers, resources and services are `Send + Sync`.
//! - `prelude` (default): Commonly used types are re-exported from [`prelude`].
//!
//! ## Examples
//! Opening a publication and reading a resource:
//! ```no_run
//! use rpub::prelude::*;
//!
//! let publication = Publication::open("childrens-literature.epub", PublicationOptions::default()).unwrap();
//! let manifest = publication.manifest();
//!
//! // Retrieving the title
//! println!("Title = {}", manifest.metadata.title());
//!
//! // Printing the content of each reading order item
//! for link in &manifest.reading_order {
//!     let resource = publication.get(link);
//!     println!("{}", resource.read_as_string().unwrap());
//! }
//! publication.close();
//! ```
//! Serializing the manifest:
//! ```no_run
//! # use rpub::prelude::*;
//! # let publication = Publication::open("childrens-literature.epub", PublicationOptions::default()).unwrap();
//! let json = serde_json::to_string_pretty(publication.manifest()).unwrap();
//! ```

pub mod archive;
pub mod epub;
pub mod errors;
pub mod fetcher;
pub mod manifest;
pub mod mediatype;
pub mod parser;
pub mod publication;
pub mod util;
pub mod webpub;

pub use self::publication::{Publication, PublicationOptions};

/// Commonly used types.
#[cfg(feature = "prelude")]
pub mod prelude {
    pub use crate::archive::Archive;
    pub use crate::epub::{EpubSettings, ReflowableStrategy};
    pub use crate::errors::{PublicationError, PublicationResult};
    pub use crate::fetcher::{ArchiveFetcher, Fetcher, Resource};
    pub use crate::manifest::{Link, LinkList, Locator, Manifest, Metadata};
    pub use crate::mediatype::MediaType;
    pub use crate::publication::{PositionsService, Publication, PublicationOptions};
}
