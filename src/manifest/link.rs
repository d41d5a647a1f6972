use crate::manifest::json::{self, MapExt};
use crate::manifest::{HrefNormalizer, JsonEntity, Layout, ManifestError, ManifestResult, Properties, impl_serde_via_json};
use crate::mediatype::MediaType;
use crate::util::href::{Href, HrefResult};
use crate::util::uri_template::UriTemplate;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A link to a resource, as found in the reading order, resources, navigation, etc.
///
/// ```
/// # use rpub::manifest::Link;
/// let link: Link = serde_json::from_str(r#"{
///     "href": "/chapter1.xhtml",
///     "type": "application/xhtml+xml",
///     "rel": "start"
/// }"#).unwrap();
///
/// assert_eq!("/chapter1.xhtml", link.href);
/// assert!(link.media_type().is_html());
/// assert_eq!(vec!["start"], link.rels);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Link {
    /// The URI or URI template of the resource.
    pub href: String,
    /// The media type of the resource.
    pub r#type: Option<String>,
    /// Whether [`Self::href`] is a URI template.
    pub templated: bool,
    pub title: Option<String>,
    /// Relations between the resource and its containing collection.
    pub rels: Vec<String>,
    pub properties: Properties,
    /// Height of the resource in pixels.
    pub height: Option<u64>,
    /// Width of the resource in pixels.
    pub width: Option<u64>,
    /// Bitrate of the resource in kilobits per second.
    pub bitrate: Option<f64>,
    /// Duration of the resource in seconds.
    pub duration: Option<f64>,
    /// BCP-47 tags of the resource's languages.
    pub languages: Vec<String>,
    /// Alternate renditions of the resource.
    pub alternates: Vec<Link>,
    /// Resources that are children of this one in a hierarchy (e.g. a table of contents).
    pub children: Vec<Link>,
}

impl Link {
    /// Creates a link pointing at `href`.
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            ..Self::default()
        }
    }

    /// Creates a link pointing at `href` with the given media type.
    pub fn with_type(href: impl Into<String>, media_type: &MediaType) -> Self {
        Self {
            r#type: Some(media_type.to_string()),
            ..Self::new(href)
        }
    }

    /// The media type of the resource, [`MediaType::BINARY`] if unknown.
    pub fn media_type(&self) -> MediaType {
        self.r#type
            .as_deref()
            .and_then(MediaType::of_string)
            .unwrap_or(MediaType::BINARY)
    }

    /// Returns `true` if the link has the given relation.
    pub fn has_rel(&self, rel: &str) -> bool {
        self.rels.iter().any(|r| r == rel)
    }

    /// Adds a relation unless already present.
    pub fn add_rel(&mut self, rel: impl Into<String>) {
        let rel = rel.into();
        if !self.has_rel(&rel) {
            self.rels.push(rel);
        }
    }

    /// The names of the URI template variables, if the link is [templated](Self::templated).
    pub fn template_parameters(&self) -> Vec<String> {
        if self.templated {
            UriTemplate::new(self.href.as_str())
                .parameters()
                .into_iter()
                .map(str::to_owned)
                .collect()
        } else {
            Vec::new()
        }
    }

    /// Expands the URI template of the href with the given `parameters`.
    ///
    /// The returned link is no longer templated.
    pub fn expand_template(&self, parameters: &HashMap<String, String>) -> Link {
        Link {
            href: UriTemplate::new(self.href.as_str()).expand(parameters),
            templated: false,
            ..self.clone()
        }
    }

    /// Computes the percent-encoded URL of the resource relative to `base`.
    ///
    /// An absolute href ignores `base`, while an empty `base` is the root.
    ///
    /// # Errors
    /// [`HrefError::InvalidHref`](crate::util::href::HrefError::InvalidHref) when the
    /// href cannot be resolved.
    pub fn to_url(&self, base: &str) -> HrefResult<String> {
        let href = self.href.trim_start_matches('/');
        if href.is_empty() {
            return Ok(String::new());
        }
        Href::new(href, base).percent_encoded_string()
    }

    pub(crate) fn from_json_array(value: Option<&Value>, normalize: HrefNormalizer) -> ManifestResult<Vec<Self>> {
        match value {
            Some(Value::Array(values)) => values
                .iter()
                .filter(|value| value.is_object())
                .map(|value| Self::from_json(value, normalize))
                .collect(),
            _ => Ok(Vec::new()),
        }
    }

    pub(crate) fn to_json_array(links: &[Link]) -> Value {
        Value::Array(links.iter().map(Link::to_json).collect())
    }
}

impl JsonEntity for Link {
    fn from_json(value: &Value, normalize: HrefNormalizer) -> ManifestResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| ManifestError::invalid("link", "expected a JSON object"))?;
        let href = object
            .get("href")
            .and_then(Value::as_str)
            .ok_or(ManifestError::MissingField("href"))?;

        Ok(Self {
            href: normalize(href)?,
            r#type: json::non_empty_string(object.get("type")),
            templated: json::boolean(object.get("templated")),
            title: json::non_empty_string(object.get("title")),
            rels: json::string_set("rel", object.get("rel"))?,
            properties: json::object(object.get("properties"))
                .cloned()
                .map(Properties::from)
                .unwrap_or_default(),
            height: json::unsigned(object.get("height")),
            width: json::unsigned(object.get("width")),
            bitrate: json::positive(object.get("bitrate")),
            duration: json::positive(object.get("duration")),
            languages: json::string_set("language", object.get("language"))?,
            alternates: Self::from_json_array(object.get("alternate"), normalize)?,
            children: Self::from_json_array(object.get("children"), normalize)?,
        })
    }

    fn to_json(&self) -> Value {
        let mut object = Map::new();

        object.insert("href".to_owned(), Value::from(self.href.as_str()));
        object.insert_some("type", self.r#type.as_deref());
        if self.templated {
            object.insert("templated".to_owned(), Value::Bool(true));
        }
        object.insert_some("title", self.title.as_deref());
        if !self.rels.is_empty() {
            object.insert("rel".to_owned(), json::collapsed_strings(&self.rels));
        }
        if !self.properties.is_empty() {
            object.insert("properties".to_owned(), self.properties.clone().into());
        }
        object.insert_some("height", self.height);
        object.insert_some("width", self.width);
        object.insert_some("bitrate", self.bitrate);
        object.insert_some("duration", self.duration);
        if !self.languages.is_empty() {
            object.insert("language".to_owned(), json::collapsed_strings(&self.languages));
        }
        if !self.alternates.is_empty() {
            object.insert("alternate".to_owned(), Link::to_json_array(&self.alternates));
        }
        if !self.children.is_empty() {
            object.insert("children".to_owned(), Link::to_json_array(&self.children));
        }
        Value::Object(object)
    }
}

impl_serde_via_json!(Link);

/// Queries over a list of [`Link`]s.
pub trait LinkList {
    /// The first link whose href matches, searching alternates as well.
    fn first_with_href(&self, href: &str) -> Option<&Link>;

    /// The position of the first link whose href matches, or one of its alternates.
    fn index_of_first_with_href(&self, href: &str) -> Option<usize>;

    fn first_with_rel(&self, rel: &str) -> Option<&Link>;

    fn filter_by_rel(&self, rel: &str) -> Vec<&Link>;

    /// The first link whose media type matches `media_type`.
    fn first_with_media_type(&self, media_type: &MediaType) -> Option<&Link>;

    fn filter_by_media_type(&self, media_type: &MediaType) -> Vec<&Link>;

    /// Returns `true` if all links match `media_type`.
    fn all_match_media_type(&self, media_type: &MediaType) -> bool;

    fn all_are_audio(&self) -> bool;

    fn all_are_bitmap(&self) -> bool;

    fn all_are_html(&self) -> bool;

    fn all_are_video(&self) -> bool;

    /// Returns `true` if all links are bitmaps or videos.
    fn all_are_visual(&self) -> bool;

    /// Returns `true` if all links are reflowable within the given publication layout.
    fn all_are_reflowable(&self, layout: Option<Layout>) -> bool;

    /// Returns `true` if all links are fixed-layout within the given publication layout.
    fn all_are_fixed_layout(&self, layout: Option<Layout>) -> bool;
}

impl LinkList for [Link] {
    fn first_with_href(&self, href: &str) -> Option<&Link> {
        self.index_of_first_with_href(href).map(|index| &self[index])
    }

    fn index_of_first_with_href(&self, href: &str) -> Option<usize> {
        self.iter().position(|link| {
            link.href == href || link.alternates.iter().any(|alternate| alternate.href == href)
        })
    }

    fn first_with_rel(&self, rel: &str) -> Option<&Link> {
        self.iter().find(|link| link.has_rel(rel))
    }

    fn filter_by_rel(&self, rel: &str) -> Vec<&Link> {
        self.iter().filter(|link| link.has_rel(rel)).collect()
    }

    fn first_with_media_type(&self, media_type: &MediaType) -> Option<&Link> {
        self.iter().find(|link| link.media_type().matches(media_type))
    }

    fn filter_by_media_type(&self, media_type: &MediaType) -> Vec<&Link> {
        self.iter()
            .filter(|link| link.media_type().matches(media_type))
            .collect()
    }

    fn all_match_media_type(&self, media_type: &MediaType) -> bool {
        !self.is_empty() && self.iter().all(|link| link.media_type().matches(media_type))
    }

    fn all_are_audio(&self) -> bool {
        !self.is_empty() && self.iter().all(|link| link.media_type().is_audio())
    }

    fn all_are_bitmap(&self) -> bool {
        !self.is_empty() && self.iter().all(|link| link.media_type().is_bitmap())
    }

    fn all_are_html(&self) -> bool {
        !self.is_empty() && self.iter().all(|link| link.media_type().is_html())
    }

    fn all_are_video(&self) -> bool {
        !self.is_empty() && self.iter().all(|link| link.media_type().is_video())
    }

    fn all_are_visual(&self) -> bool {
        !self.is_empty()
            && self.iter().all(|link| {
                let media_type = link.media_type();
                media_type.is_bitmap() || media_type.is_video()
            })
    }

    fn all_are_reflowable(&self, layout: Option<Layout>) -> bool {
        !self.is_empty()
            && self.iter().all(|link| {
                link.properties.layout().or(layout).unwrap_or(Layout::Reflowable) == Layout::Reflowable
            })
    }

    fn all_are_fixed_layout(&self, layout: Option<Layout>) -> bool {
        !self.is_empty()
            && self.iter().all(|link| {
                link.properties.layout().or(layout).unwrap_or(Layout::Reflowable) == Layout::Fixed
            })
    }
}
