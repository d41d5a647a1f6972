mod container;
mod display_options;
mod encryption;
mod package;
mod smil;
mod toc;

pub(super) use self::smil::parse_smil;

use crate::epub::errors::{EpubError, EpubResult};
use crate::epub::factory::PublicationFactory;
use crate::epub::settings::EpubSettings;
use crate::fetcher::{Fetcher, Resource};
use crate::manifest::{Link, Manifest};
use crate::parser::XmlDocument;
use crate::util::href::Href;

/// Parses the EPUB served by a [`Fetcher`] into a [`Manifest`].
///
/// The fetcher is expected to expose the content of the container,
/// such as an [`ArchiveFetcher`](crate::fetcher::ArchiveFetcher).
///
/// ```no_run
/// # use rpub::epub::{EpubParser, EpubSettings};
/// # use rpub::fetcher::ArchiveFetcher;
/// let fetcher = ArchiveFetcher::open("childrens-literature.epub").unwrap();
/// let settings = EpubSettings::default();
/// let manifest = EpubParser::new(&settings, &fetcher).parse().unwrap();
///
/// assert_eq!("The Children's Literature", manifest.metadata.title());
/// ```
pub struct EpubParser<'a> {
    settings: &'a EpubSettings,
    fetcher: &'a dyn Fetcher,
}

impl<'a> EpubParser<'a> {
    pub fn new(settings: &'a EpubSettings, fetcher: &'a dyn Fetcher) -> Self {
        Self { settings, fetcher }
    }

    /// Parses the container, package document, navigation,
    /// encryption and display options into a manifest.
    ///
    /// # Errors
    /// See [`EpubError`].
    /// Navigation documents, `encryption.xml` and display options are optional:
    /// failing to read them is not an error.
    pub fn parse(&self) -> EpubResult<Manifest> {
        // Parse "META-INF/container.xml"
        let package_path = self.parse_container()?;
        // Parse "package.opf"
        let package = self.parse_package(&package_path)?;

        let navigation = self.parse_navigation(&package);
        let encryption = self.parse_encryption();
        let display_options = self.parse_display_options();

        Ok(PublicationFactory {
            fallback_title: &self.settings.fallback_title,
            package: &package,
            navigation,
            encryption,
            display_options,
        }
        .create())
    }

    /// Reads the resource at `href` as XML.
    fn read_xml(&self, href: &str) -> EpubResult<XmlDocument> {
        let resource = self.fetcher.get(&Link::new(href));
        let data = resource.read(0, 0);
        resource.close();

        Ok(XmlDocument::parse(&data?)?)
    }

    fn mandatory<T>(value: Option<T>, if_missing: impl FnOnce() -> EpubError) -> EpubResult<T> {
        value.ok_or_else(if_missing)
    }

    /// Required attribute value.
    ///
    /// If `attribute_value` is [`None`], an error is returned when `strict` mode is enabled.
    /// Otherwise, the omission is logged and [`None`] is returned.
    fn require_attribute<'b>(
        &self,
        attribute_value: Option<&'b str>,
        error_message: &str,
    ) -> EpubResult<Option<&'b str>> {
        match attribute_value {
            Some(value) => Ok(Some(value)),
            None if self.settings.strict => Err(EpubError::MissingAttribute(error_message.to_owned())),
            None => {
                log::warn!("Required attribute missing: {error_message}");
                Ok(None)
            }
        }
    }
}

/// Resolves a raw `href` against the file referencing it.
///
/// An unresolvable href is logged and ignored.
fn resolve_href(href: &str, base: &str) -> Option<String> {
    Href::new(href, base)
        .string()
        .inspect_err(|error| log::warn!("Ignoring href `{href}` in `{base}`: {error}"))
        .ok()
}

impl std::fmt::Debug for EpubParser<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EpubParser")
            .field("settings", self.settings)
            .finish_non_exhaustive()
    }
}
