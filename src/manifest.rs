//! # Overview
//! The Readium Web Publication Manifest (RWPM) model.
//!
//! A [`Manifest`] describes a publication: its [`Metadata`], its reading order, the
//! resources required to render it, and its navigation.
//! Every entity implements [`serde::Serialize`] and [`serde::Deserialize`] following the
//! RWPM JSON conventions, where single values collapse (a lone `rel` becomes a string,
//! a lone `und` title becomes a bare string, etc.).
//!
//! # Parsing
//! [`Manifest::from_json`] accepts both standalone and packaged manifests:
//! - Packaged manifests keep their hrefs rooted at `/` and have their `self` link
//!   rewritten to `alternate`.
//! - Standalone manifests resolve hrefs against the directory of their `self` link.
//!
//! ```
//! # use rpub::manifest::Manifest;
//! let json = serde_json::json!({
//!     "metadata": {"title": "Moby-Dick"},
//!     "readingOrder": [{"href": "c1.html", "type": "text/html"}],
//! });
//! let manifest = Manifest::from_json(&json, true).unwrap();
//!
//! assert_eq!("Moby-Dick", manifest.metadata.title());
//! assert_eq!("/c1.html", manifest.reading_order[0].href);
//! ```

pub mod a11y;
mod collection;
mod contributor;
mod encryption;
mod guided_navigation;
pub(crate) mod json;
mod link;
mod localized_string;
mod locator;
mod metadata;
mod presentation;
mod properties;
mod subject;

pub use self::a11y::A11y;
pub use self::collection::PublicationCollection;
pub use self::contributor::{Collection, Contributor};
pub use self::encryption::Encryption;
pub use self::guided_navigation::{GuidedNavigationDocument, GuidedNavigationObject};
pub use self::json::{HrefNormalizer, identity};
pub use self::link::{Link, LinkList};
pub use self::localized_string::{LocalizedString, UNDEFINED_LANGUAGE};
pub use self::locator::{Locations, Locator, Text};
pub use self::metadata::{INFERRED_ACCESSIBILITY, Metadata, ReadingProgression};
pub use self::presentation::{Fit, Layout, Orientation, Overflow, Page, Presentation, Spread};
pub use self::properties::{ArchiveProperties, Properties};
pub use self::subject::Subject;

use crate::mediatype::MediaType;
use crate::util::href::{Href, HrefError};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The default JSON-LD context of a manifest.
pub const WEBPUB_CONTEXT: &str = "https://readium.org/webpub-manifest/context.jsonld";

/// Keys of a manifest object that are not subcollections.
const RESERVED_KEYS: [&str; 7] = [
    "@context",
    "metadata",
    "links",
    "readingOrder",
    "spine",
    "resources",
    "toc",
];

/// Alias for `Result<T, ManifestError>`.
pub type ManifestResult<T> = Result<T, ManifestError>;

/// Errors raised while reading RWPM JSON.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// A required field is absent.
    #[error("[MissingField - `{0}`]: The field is required")]
    MissingField(&'static str),
    /// A field holds a value of the wrong shape.
    #[error("[InvalidField - `{field}`]: {reason}")]
    InvalidField {
        /// The offending field.
        field: &'static str,
        /// A description of the problem.
        reason: String,
    },
    /// An href could not be normalized.
    #[error(transparent)]
    Href(#[from] HrefError),
}

impl ManifestError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Conversion between an entity and its RWPM JSON form.
pub(crate) trait JsonEntity: Sized {
    fn from_json(value: &Value, normalize: HrefNormalizer) -> ManifestResult<Self>;

    fn to_json(&self) -> Value;
}

mod macros {
    /// Implements serde through [`JsonEntity`](super::JsonEntity).
    macro_rules! impl_serde_via_json {
        ($($entity:ty),+ $(,)?) => {
            $(
            impl serde::Serialize for $entity {
                fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    serde::Serialize::serialize(&crate::manifest::JsonEntity::to_json(self), serializer)
                }
            }

            impl<'de> serde::Deserialize<'de> for $entity {
                fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                    use serde::de::Error as _;

                    let value = <serde_json::Value as serde::Deserialize>::deserialize(deserializer)?;
                    <Self as crate::manifest::JsonEntity>::from_json(&value, &crate::manifest::identity)
                        .map_err(D::Error::custom)
                }
            }
            )+
        };
    }

    /// Declares a closed set of keywords serialized as strings.
    macro_rules! keywords {
        {
            $(#[$meta:meta])*
            $name:ident {
                $($(#[$variant_meta:meta])* $variant:ident => $keyword:literal,)+
            }
        } => {
            $(#[$meta])*
            #[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
            pub enum $name {
                $(
                $(#[$variant_meta])*
                #[serde(rename = $keyword)]
                $variant,
                )+
            }

            impl $name {
                /// Returns the keyword as it appears in JSON and EPUB properties.
                pub fn as_str(&self) -> &'static str {
                    match self {
                        $(Self::$variant => $keyword,)+
                    }
                }

                /// Parses a keyword, returning [`None`] if it is unknown.
                pub fn parse(keyword: &str) -> Option<Self> {
                    match keyword {
                        $($keyword => Some(Self::$variant),)+
                        _ => None,
                    }
                }
            }

            impl std::fmt::Display for $name {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        };
    }

    pub(crate) use {impl_serde_via_json, keywords};
}

pub(crate) use self::macros::{impl_serde_via_json, keywords};

/// A Readium Web Publication Manifest.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Manifest {
    /// The JSON-LD contexts, [`WEBPUB_CONTEXT`] when none is declared.
    pub context: Vec<String>,
    /// Publication metadata.
    pub metadata: Metadata,
    /// Links to related resources, such as `self`.
    pub links: Vec<Link>,
    /// The primary resources in reading order; every link is typed.
    pub reading_order: Vec<Link>,
    /// Resources required to render the reading order.
    pub resources: Vec<Link>,
    /// The table of contents.
    pub table_of_contents: Vec<Link>,
    /// Any other collections, keyed by role (e.g. `pageList`, `landmarks`).
    pub subcollections: BTreeMap<String, Vec<PublicationCollection>>,
}

impl Manifest {
    /// Parses a manifest from its JSON representation.
    ///
    /// When `packaged` is `true`, hrefs are rooted at the container and a `self` link is
    /// rewritten to `alternate`.
    /// Otherwise relative hrefs are resolved against the directory of the `self` link.
    ///
    /// Reading order and resource links without a `type` are dropped.
    ///
    /// # Errors
    /// - [`ManifestError::MissingField`]: `metadata` (or its `title`) is missing,
    ///   or neither `readingOrder` nor `spine` is present.
    /// - [`ManifestError::InvalidField`]: a field has the wrong shape.
    pub fn from_json(value: &Value, packaged: bool) -> ManifestResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| ManifestError::invalid("manifest", "expected a JSON object"))?;

        let base = if packaged {
            "/".to_owned()
        } else {
            Self::self_link_directory(object)?.unwrap_or_else(|| "/".to_owned())
        };
        let normalizer = |href: &str| -> ManifestResult<String> { Ok(Href::new(href, base.as_str()).string()?) };
        let normalize: HrefNormalizer = &normalizer;

        let mut context = json::string_set("@context", object.get("@context"))?;
        if context.is_empty() {
            context.push(WEBPUB_CONTEXT.to_owned());
        }

        let metadata = object
            .get("metadata")
            .ok_or(ManifestError::MissingField("metadata"))
            .and_then(|metadata| Metadata::from_json(metadata, normalize))?;

        let mut links = Link::from_json_array(object.get("links"), normalize)?;
        if packaged {
            for link in &mut links {
                if let Some(position) = link.rels.iter().position(|rel| rel == "self") {
                    link.rels.remove(position);
                    if !link.rels.iter().any(|rel| rel == "alternate") {
                        link.rels.insert(0, "alternate".to_owned());
                    }
                }
            }
        }

        let reading_order = object
            .get("readingOrder")
            .or_else(|| object.get("spine"))
            .ok_or(ManifestError::MissingField("readingOrder"))?;
        let reading_order = Self::typed_links(Link::from_json_array(Some(reading_order), normalize)?);
        let resources = Self::typed_links(Link::from_json_array(object.get("resources"), normalize)?);
        let table_of_contents = Link::from_json_array(object.get("toc"), normalize)?;

        let mut subcollections = BTreeMap::new();
        for (role, value) in object {
            if RESERVED_KEYS.contains(&role.as_str()) {
                continue;
            }
            let collections = PublicationCollection::from_json_any(value, normalize)?;
            if !collections.is_empty() {
                subcollections.insert(role.clone(), collections);
            }
        }

        Ok(Self {
            context,
            metadata,
            links,
            reading_order,
            resources,
            table_of_contents,
            subcollections,
        })
    }

    fn self_link_directory(object: &Map<String, Value>) -> ManifestResult<Option<String>> {
        let links = Link::from_json_array(object.get("links"), &identity)?;

        Ok(links
            .first_with_rel("self")
            .map(|link| crate::util::uri::directory(crate::util::uri::split_suffix(&link.href).0))
            .filter(|directory| !directory.is_empty())
            .map(str::to_owned))
    }

    fn typed_links(links: Vec<Link>) -> Vec<Link> {
        links
            .into_iter()
            .filter(|link| {
                let typed = link.r#type.as_deref().is_some_and(|t| !t.is_empty());
                if !typed {
                    log::warn!("Dropping link without a type: {}", link.href);
                }
                typed
            })
            .collect()
    }

    /// Serializes the manifest into its JSON representation.
    ///
    /// Keys are emitted in the order `@context`, `metadata`, `links`, `readingOrder`,
    /// `resources`, `toc`, followed by the subcollections.
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();

        let context = if self.context.is_empty() {
            Value::from(WEBPUB_CONTEXT)
        } else {
            json::collapsed_strings(&self.context)
        };
        object.insert("@context".to_owned(), context);
        object.insert("metadata".to_owned(), self.metadata.to_json());
        object.insert("links".to_owned(), Link::to_json_array(&self.links));
        object.insert("readingOrder".to_owned(), Link::to_json_array(&self.reading_order));
        if !self.resources.is_empty() {
            object.insert("resources".to_owned(), Link::to_json_array(&self.resources));
        }
        if !self.table_of_contents.is_empty() {
            object.insert("toc".to_owned(), Link::to_json_array(&self.table_of_contents));
        }
        for (role, collections) in &self.subcollections {
            object.insert(role.clone(), PublicationCollection::to_json_any(collections));
        }
        Value::Object(object)
    }

    /// Returns `true` if the manifest conforms to the given [profile](Metadata::PROFILE_EPUB).
    ///
    /// The audiobook, Divina, EPUB and PDF profiles are also inferred from the
    /// reading order's media types. An empty reading order conforms to nothing.
    pub fn conforms_to(&self, profile: &str) -> bool {
        if self.reading_order.is_empty() {
            return false;
        }
        match profile {
            Metadata::PROFILE_AUDIOBOOK => self.reading_order.all_are_audio(),
            Metadata::PROFILE_DIVINA => self.reading_order.all_are_bitmap(),
            Metadata::PROFILE_EPUB => {
                self.metadata.conforms_to.iter().any(|p| p == Metadata::PROFILE_EPUB)
                    && self.reading_order.all_are_html()
            }
            Metadata::PROFILE_PDF => self.reading_order.all_match_media_type(&MediaType::PDF),
            _ => self.metadata.conforms_to.iter().any(|p| p == profile),
        }
    }

    /// Finds the first link with the given href across the reading order, resources and
    /// links, including nested alternates and children.
    ///
    /// If nothing matches, the lookup is retried without the href's query and fragment.
    pub fn link_with_href(&self, href: &str) -> Option<&Link> {
        fn find<'a>(links: &'a [Link], href: &str) -> Option<&'a Link> {
            links.iter().find_map(|link| {
                if link.href == href {
                    Some(link)
                } else {
                    find(&link.alternates, href).or_else(|| find(&link.children, href))
                }
            })
        }
        let find_all = |href: &str| {
            find(&self.reading_order, href)
                .or_else(|| find(&self.resources, href))
                .or_else(|| find(&self.links, href))
        };

        find_all(href).or_else(|| {
            let (path, suffix) = crate::util::uri::split_suffix(href);
            if suffix.is_empty() { None } else { find_all(path) }
        })
    }

    /// Finds the first link with the given `rel` in the resources, reading order or links.
    pub fn link_with_rel(&self, rel: &str) -> Option<&Link> {
        self.resources
            .first_with_rel(rel)
            .or_else(|| self.reading_order.first_with_rel(rel))
            .or_else(|| self.links.first_with_rel(rel))
    }

    /// Finds all links with the given `rel` in the resources, reading order and links.
    pub fn links_with_rel(&self, rel: &str) -> Vec<&Link> {
        let mut links = self.resources.filter_by_rel(rel);
        links.extend(self.reading_order.filter_by_rel(rel));
        links.extend(self.links.filter_by_rel(rel));
        links
    }

    /// Creates a [`Locator`] pointing at the given link.
    ///
    /// Returns [`None`] if the link's target is not part of the manifest or has no type.
    pub fn locator_from_link(&self, link: &Link) -> Option<Locator> {
        let (href, fragment) = match link.href.split_once('#') {
            Some((href, fragment)) => (href, Some(fragment)),
            None => (link.href.as_str(), None),
        };
        let resource = self.link_with_href(href)?;
        let r#type = resource.r#type.clone().filter(|t| !t.is_empty())?;

        let mut locations = Locations::default();
        match fragment {
            Some(fragment) if !fragment.is_empty() => locations.fragments.push(fragment.to_owned()),
            _ => locations.progression = Some(0.0),
        }

        Some(Locator {
            href: href.to_owned(),
            r#type,
            title: resource.title.clone().or_else(|| link.title.clone()),
            locations,
            text: Text::default(),
        })
    }
}

impl Serialize for Manifest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Manifest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value, false).map_err(D::Error::custom)
    }
}
