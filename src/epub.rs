//! The Electronic Publication (EPUB) module.
//!
//! Supports EPUB versions `2` and `3`, converted into a Readium Web Publication
//! [`Manifest`](crate::manifest::Manifest):
//! - [`EpubParser`]: Container, package document, navigation, encryption and display options.
//! - [`Deobfuscator`]: Font deobfuscation (IDPF and Adobe algorithms).
//! - [`EpubPositionsService`]: Positions of the reading order, see [`ReflowableStrategy`].
//! - [`MediaOverlayService`]: Media overlays (SMIL) as guided navigation documents.
//!
//! For more information regarding the EPUB spec, see:
//! <https://www.w3.org/TR/epub>
//!
//! # Examples
//! ```no_run
//! # use rpub::epub::{self, EpubSettings};
//! # use rpub::fetcher::ArchiveFetcher;
//! let fetcher = ArchiveFetcher::open("moby-dick.epub").unwrap();
//! let publication = epub::open(Box::new(fetcher), &EpubSettings::default()).unwrap();
//!
//! println!("{}", publication.manifest().metadata.title());
//! println!("{} positions", publication.positions().len());
//! ```

mod clock;
pub(crate) mod consts;
mod deobfuscator;
pub mod errors;
mod factory;
mod media_overlay;
mod metadata;
mod package;
mod parser;
mod positions;
mod property;
mod settings;

pub use self::clock::parse_clock_value;
pub use self::deobfuscator::Deobfuscator;
pub use self::errors::{EpubError, EpubResult};
pub use self::media_overlay::{GUIDED_NAVIGATION_TEMPLATE, MediaOverlayService};
pub use self::parser::EpubParser;
pub use self::positions::{EpubPositionsService, ReflowableStrategy};
pub use self::settings::{EpubSettings, EpubSettingsBuilder};

use crate::errors::PublicationResult;
use crate::fetcher::{Fetcher, TransformingFetcher};
use crate::publication::{Publication, ServicesBuilder};

/// Parses the EPUB served by `fetcher` into a [`Publication`].
///
/// Depending on `settings`, embedded fonts are deobfuscated and media overlays are
/// served as guided navigation documents.
/// The publication always provides positions.
///
/// # Errors
/// See [`EpubError`].
pub fn open(fetcher: Box<dyn Fetcher>, settings: &EpubSettings) -> PublicationResult<Publication> {
    let mut manifest = match EpubParser::new(settings, fetcher.as_ref()).parse() {
        Ok(manifest) => manifest,
        Err(error) => {
            fetcher.close();
            return Err(error.into());
        }
    };

    let fetcher: Box<dyn Fetcher> = if settings.deobfuscate_fonts {
        let deobfuscator = Deobfuscator::new(&manifest);
        Box::new(TransformingFetcher::new(fetcher, vec![Box::new(deobfuscator)]))
    } else {
        fetcher
    };

    let mut services = ServicesBuilder::new();
    let strategy = settings.positions_strategy;
    services.set("positions", move |context| {
        Box::new(EpubPositionsService::new(
            context.manifest.reading_order.clone(),
            context.manifest.metadata.presentation.clone().unwrap_or_default(),
            context.fetcher.clone(),
            strategy,
        ))
    });

    if settings.media_overlays {
        let guides = media_overlay::extract_guides(&mut manifest);

        if !guides.is_empty() {
            services.set("media-overlay", move |context| {
                Box::new(MediaOverlayService::new(context.fetcher.clone(), guides.clone()))
            });
        }
    }

    Ok(Publication::new(manifest, fetcher, &services))
}
