//! Readium Web Publications and unstructured archives of bitmaps or audio files.
//!
//! - A packaged Readium Web Publication (`.webpub`, `.audiobook`, `.divina`, `.lcpdf`, ...)
//!   holds its manifest at `/manifest.json`.
//! - A comic book archive (`.cbz`) or zipped audiobook (`.zab`) has no manifest.
//!   Its reading order is made of its bitmaps or audio files, in alphabetical order.

use crate::errors::{PublicationError, PublicationResult};
use crate::fetcher::{Fetcher, ResourceError};
use crate::manifest::{Link, LinkList, Manifest, Metadata, WEBPUB_CONTEXT};
use crate::mediatype::MediaType;
use crate::mediatype::sniffer::is_ignored;
use crate::publication::{
    PdfPositionsService, PerResourcePositionsService, Publication, Service, ServicesBuilder,
};

/// The href of the manifest within a packaged publication.
pub const MANIFEST_HREF: &str = "/manifest.json";

/// Playable audio files.
const AUDIO_EXTENSIONS: &[&str] = &[
    "aac", "aiff", "alac", "flac", "m4a", "m4b", "mp3", "ogg", "oga", "mogg", "opus", "wav", "webm",
];

/// Opens a packaged Readium Web Publication of the given `media_type`.
///
/// # Errors
/// - [`PublicationError::Resource`]: `/manifest.json` is missing or not JSON.
/// - [`PublicationError::Manifest`]: The manifest is malformed.
/// - [`PublicationError::UnsupportedFormat`]: An LCP-protected PDF whose reading order
///   is not made of PDF documents.
pub fn open(fetcher: Box<dyn Fetcher>, media_type: &MediaType) -> PublicationResult<Publication> {
    let resource = fetcher.get(&Link::new(MANIFEST_HREF));
    let json = resource.read_as_json();
    resource.close();

    let manifest = json
        .map_err(PublicationError::from)
        .and_then(|json| Ok(Manifest::from_json(&json, true)?));
    let manifest = match manifest {
        Ok(manifest) => manifest,
        Err(error) => {
            fetcher.close();
            return Err(error);
        }
    };

    let is_pdf = manifest.reading_order.all_match_media_type(&MediaType::PDF);
    if media_type.matches(&MediaType::LCP_PROTECTED_PDF) && !is_pdf {
        fetcher.close();
        return Err(PublicationError::UnsupportedFormat(format!(
            "{media_type}: the reading order must contain PDF documents only"
        )));
    }

    let mut services = ServicesBuilder::new();
    if is_pdf {
        services.set("positions", |context| match PdfPositionsService::from_manifest(context.manifest) {
            Some(service) => Box::new(service) as Box<dyn Service>,
            None => Box::new(PerResourcePositionsService::new(&[], "application/pdf")),
        });
    } else {
        services.set("positions", |context| {
            Box::new(PerResourcePositionsService::new(&context.manifest.reading_order, ""))
        });
    }
    Ok(Publication::new(manifest, fetcher, &services))
}

/// Opens a comic book archive, such as a CBZ.
///
/// The first bitmap is the cover.
/// The title is the directory holding every entry, if any, else `fallback_title`.
///
/// # Errors
/// [`PublicationError::Resource`]: The archive holds no bitmap.
pub fn open_images(fetcher: Box<dyn Fetcher>, fallback_title: &str) -> PublicationResult<Publication> {
    let mut reading_order = visible_links(fetcher.as_ref(), |link| link.media_type().is_bitmap())?;
    let Some(cover) = reading_order.first_mut() else {
        fetcher.close();
        return Err(ResourceError::not_found("No bitmap found in the publication").into());
    };
    cover.add_rel("cover");

    let manifest = manifest(
        fetcher.as_ref(),
        fallback_title,
        Metadata::PROFILE_DIVINA,
        reading_order,
    );
    let mut services = ServicesBuilder::new();
    services.set("positions", |context| {
        Box::new(PerResourcePositionsService::new(&context.manifest.reading_order, "image/*"))
    });
    Ok(Publication::new(manifest, fetcher, &services))
}

/// Opens an archive of audio files, such as a ZAB.
///
/// # Errors
/// [`PublicationError::Resource`]: The archive holds no audio file.
pub fn open_audio(fetcher: Box<dyn Fetcher>, fallback_title: &str) -> PublicationResult<Publication> {
    let reading_order = visible_links(fetcher.as_ref(), |link| {
        link.href
            .rsplit_once('.')
            .is_some_and(|(_, extension)| AUDIO_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str()))
    })?;
    if reading_order.is_empty() {
        fetcher.close();
        return Err(ResourceError::not_found("No audio file found in the publication").into());
    }

    let manifest = manifest(
        fetcher.as_ref(),
        fallback_title,
        Metadata::PROFILE_AUDIOBOOK,
        reading_order,
    );
    let mut services = ServicesBuilder::new();
    services.set("positions", |context| {
        Box::new(PerResourcePositionsService::new(&context.manifest.reading_order, "audio/*"))
    });
    Ok(Publication::new(manifest, fetcher, &services))
}

/// The links of `fetcher` accepted by `filter`, sorted by href, skipping hidden files.
fn visible_links(fetcher: &dyn Fetcher, filter: impl Fn(&Link) -> bool) -> PublicationResult<Vec<Link>> {
    let mut links = fetcher
        .links()?
        .into_iter()
        .filter(|link| !is_ignored(link.href.trim_start_matches('/')) && filter(link))
        .collect::<Vec<_>>();

    links.sort_by(|a, b| a.href.cmp(&b.href));
    Ok(links)
}

fn manifest(fetcher: &dyn Fetcher, fallback_title: &str, profile: &str, reading_order: Vec<Link>) -> Manifest {
    let title = fetcher
        .links()
        .ok()
        .and_then(|links| title_from_file_structure(&links))
        .unwrap_or_else(|| fallback_title.to_owned());

    Manifest {
        context: vec![WEBPUB_CONTEXT.to_owned()],
        metadata: Metadata {
            conforms_to: vec![profile.to_owned()],
            ..Metadata::new(title)
        },
        reading_order,
        ..Manifest::default()
    }
}

/// The name of the directory holding every entry, e.g. `/Moby-Dick/page1.jpg`.
fn title_from_file_structure(links: &[Link]) -> Option<String> {
    let mut directories = links.iter().map(|link| {
        link.href
            .trim_start_matches('/')
            .split_once('/')
            .map(|(directory, _)| directory)
    });
    let first = directories.next()??;

    directories
        .all(|directory| directory == Some(first))
        .then(|| first.to_owned())
}
