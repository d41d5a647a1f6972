use crate::manifest::json::{self, MapExt};
use crate::manifest::{HrefNormalizer, JsonEntity, ManifestError, ManifestResult, impl_serde_via_json};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys of a locations object with a dedicated field.
const LOCATION_KEYS: [&str; 5] = ["fragments", "fragment", "progression", "position", "totalProgression"];

/// A precise location in a publication.
///
/// ```
/// # use rpub::manifest::Locator;
/// let locator: Locator = serde_json::from_str(r#"{
///     "href": "/c1.xhtml",
///     "type": "application/xhtml+xml",
///     "locations": {"progression": 0.5, "position": 4, "cssSelector": "p:nth-child(2)"}
/// }"#).unwrap();
///
/// assert_eq!(Some(0.5), locator.locations.progression);
/// assert_eq!(Some(4), locator.locations.position);
/// assert_eq!(Some("p:nth-child(2)"), locator.locations.css_selector());
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Locator {
    pub href: String,
    /// The media type of the resource.
    pub r#type: String,
    pub title: Option<String>,
    pub locations: Locations,
    pub text: Text,
}

/// Where a [`Locator`] points within its resource.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Locations {
    /// Fragments within the resource, such as `page=4` or an element id.
    pub fragments: Vec<String>,
    /// Progression within the resource, between 0 and 1.
    pub progression: Option<f64>,
    /// An index in the publication, starting at 1.
    pub position: Option<u64>,
    /// Progression within the publication, between 0 and 1.
    pub total_progression: Option<f64>,
    /// Additional locations, e.g. `cssSelector`.
    pub other_locations: Map<String, Value>,
}

/// Text surrounding a [`Locator`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Text {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
}

impl Text {
    pub fn is_empty(&self) -> bool {
        self.before.is_none() && self.highlight.is_none() && self.after.is_none()
    }
}

impl Locations {
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
            && self.progression.is_none()
            && self.position.is_none()
            && self.total_progression.is_none()
            && self.other_locations.is_empty()
    }

    /// The `cssSelector` extension, if any.
    pub fn css_selector(&self) -> Option<&str> {
        self.other_locations.get("cssSelector").and_then(Value::as_str)
    }
}

fn unit_interval(value: Option<&Value>) -> Option<f64> {
    json::float(value).filter(|value| (0.0..=1.0).contains(value))
}

impl JsonEntity for Locations {
    fn from_json(value: &Value, _: HrefNormalizer) -> ManifestResult<Self> {
        let Some(object) = value.as_object() else {
            return Ok(Self::default());
        };

        let mut fragments = json::string_set("fragments", object.get("fragments"))?;
        if fragments.is_empty() {
            fragments = json::string_set("fragment", object.get("fragment"))?;
        }

        Ok(Self {
            fragments,
            progression: unit_interval(object.get("progression")),
            position: json::unsigned(object.get("position")),
            total_progression: unit_interval(object.get("totalProgression")),
            other_locations: object
                .iter()
                .filter(|(key, _)| !LOCATION_KEYS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        })
    }

    fn to_json(&self) -> Value {
        let mut object = self.other_locations.clone();

        object.insert_non_empty("fragments", &self.fragments);
        object.insert_some("progression", self.progression);
        object.insert_some("position", self.position);
        object.insert_some("totalProgression", self.total_progression);
        Value::Object(object)
    }
}

impl JsonEntity for Locator {
    fn from_json(value: &Value, normalize: HrefNormalizer) -> ManifestResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| ManifestError::invalid("locator", "expected a JSON object"))?;
        let href = json::non_empty_string(object.get("href")).ok_or(ManifestError::MissingField("href"))?;
        let r#type = json::non_empty_string(object.get("type")).ok_or(ManifestError::MissingField("type"))?;

        Ok(Self {
            href: normalize(&href)?,
            r#type,
            title: json::non_empty_string(object.get("title")),
            locations: object
                .get("locations")
                .map(|locations| Locations::from_json(locations, normalize))
                .transpose()?
                .unwrap_or_default(),
            text: object
                .get("text")
                .filter(|text| text.is_object())
                .and_then(|text| serde_json::from_value(text.clone()).ok())
                .unwrap_or_default(),
        })
    }

    fn to_json(&self) -> Value {
        let mut object = Map::new();

        object.insert("href".to_owned(), Value::from(self.href.as_str()));
        object.insert("type".to_owned(), Value::from(self.r#type.as_str()));
        object.insert_some("title", self.title.as_deref());
        if !self.locations.is_empty() {
            object.insert("locations".to_owned(), self.locations.to_json());
        }
        if !self.text.is_empty() {
            object.insert_some("text", serde_json::to_value(&self.text).ok());
        }
        Value::Object(object)
    }
}

impl_serde_via_json!(Locations, Locator);
