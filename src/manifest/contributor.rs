use crate::manifest::json::{self, MapExt};
use crate::manifest::{
    HrefNormalizer, JsonEntity, Link, LocalizedString, ManifestError, ManifestResult, UNDEFINED_LANGUAGE,
    impl_serde_via_json,
};
use serde_json::{Map, Value};

/// A person or organization involved in the making of a publication.
///
/// In JSON, a contributor with nothing but a name collapses into that name.
///
/// ```
/// # use rpub::manifest::Contributor;
/// let author: Contributor = serde_json::from_str(r#""Herman Melville""#).unwrap();
/// assert_eq!("Herman Melville", author.name());
///
/// let author: Contributor = serde_json::from_str(r#"{
///     "name": "Herman Melville",
///     "sortAs": "Melville, Herman",
///     "role": "aut"
/// }"#).unwrap();
/// assert_eq!("Melville, Herman", author.sort_as());
/// assert_eq!(vec!["aut"], author.roles);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Contributor {
    pub localized_name: LocalizedString,
    /// The string used to sort the name.
    pub localized_sort_as: Option<LocalizedString>,
    /// An unambiguous reference to the contributor.
    pub identifier: Option<String>,
    /// The roles of the contributor, typically MARC relator codes.
    pub roles: Vec<String>,
    /// The position of the publication within this contributor,
    /// when the contributor represents a collection or series.
    pub position: Option<f64>,
    /// Links to similar publications by this contributor.
    pub links: Vec<Link>,
}

/// A collection or series a publication belongs to.
pub type Collection = Contributor;

impl Contributor {
    pub fn new(name: impl Into<LocalizedString>) -> Self {
        Self {
            localized_name: name.into(),
            ..Self::default()
        }
    }

    /// The default translation of the name.
    pub fn name(&self) -> &str {
        self.localized_name.default_translation()
    }

    /// The default translation of the sort string, or an empty string.
    pub fn sort_as(&self) -> &str {
        self.localized_sort_as
            .as_ref()
            .map_or("", LocalizedString::default_translation)
    }

    /// Parses a single contributor, or an array of them, skipping `null` entries.
    pub(crate) fn from_json_any(value: Option<&Value>, normalize: HrefNormalizer) -> ManifestResult<Vec<Self>> {
        match value {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(values)) => values
                .iter()
                .filter(|value| !value.is_null())
                .map(|value| Self::from_json(value, normalize))
                .collect(),
            Some(value) => Self::from_json(value, normalize).map(|contributor| vec![contributor]),
        }
    }

    /// Writes a single contributor as-is, and anything else as an array.
    pub(crate) fn to_json_any(contributors: &[Self]) -> Value {
        json::collapsed(contributors.iter().map(Self::to_json).collect())
    }

    fn is_name_only(&self) -> bool {
        self.localized_sort_as.is_none()
            && self.identifier.is_none()
            && self.roles.is_empty()
            && self.position.is_none()
            && self.links.is_empty()
    }
}

impl JsonEntity for Contributor {
    fn from_json(value: &Value, normalize: HrefNormalizer) -> ManifestResult<Self> {
        let object = match value {
            Value::String(name) => return Ok(Self::new(name.as_str())),
            Value::Object(object) => object,
            _ => return Err(ManifestError::invalid("contributor", "expected a string or an object")),
        };
        let name = object.get("name").ok_or(ManifestError::MissingField("name"))?;

        Ok(Self {
            localized_name: LocalizedString::from_json_field("name", name)?,
            localized_sort_as: LocalizedString::from_json_opt(object, "sortAs")?,
            identifier: json::non_empty_string(object.get("identifier")),
            roles: json::string_set("role", object.get("role"))?,
            position: json::float(object.get("position")),
            links: Link::from_json_array(object.get("links"), normalize)?,
        })
    }

    fn to_json(&self) -> Value {
        if self.is_name_only()
            && self
                .localized_name
                .translations()
                .all(|(language, _)| language == UNDEFINED_LANGUAGE)
        {
            return self.localized_name.to_json();
        }

        let mut object = Map::new();
        object.insert("name".to_owned(), self.localized_name.to_json());
        object.insert_some("sortAs", self.localized_sort_as.as_ref().map(JsonEntity::to_json));
        object.insert_some("identifier", self.identifier.as_deref());
        if !self.roles.is_empty() {
            object.insert("role".to_owned(), json::collapsed_strings(&self.roles));
        }
        object.insert_some("position", self.position);
        if !self.links.is_empty() {
            object.insert("links".to_owned(), Link::to_json_array(&self.links));
        }
        Value::Object(object)
    }
}

impl_serde_via_json!(Contributor);

#[cfg(test)]
mod tests {
    use super::Contributor;
    use crate::manifest::{JsonEntity, LocalizedString, identity};
    use serde_json::json;

    #[test]
    fn test_parse_any() {
        #[rustfmt::skip]
        let expected = [
            (0, json!(null)),
            (1, json!("Author")),
            (1, json!({"name": "Author"})),
            (2, json!(["Author", null, {"name": {"en": "Other"}}])),
        ];

        for (expect, value) in expected {
            assert_eq!(expect, Contributor::from_json_any(Some(&value), &identity).unwrap().len(), "{value}");
        }
        assert!(Contributor::from_json_any(Some(&json!({"role": "aut"})), &identity).is_err());
    }

    #[test]
    fn test_to_json() {
        let series = Contributor {
            position: Some(2.0),
            ..Contributor::new("Series A")
        };
        let translated = Contributor::new(LocalizedString::from_translations([("en", "Name")]));

        assert_eq!(json!("Author"), Contributor::new("Author").to_json());
        assert_eq!(json!({"name": "Series A", "position": 2.0}), series.to_json());
        assert_eq!(json!({"name": {"en": "Name"}}), translated.to_json());
        assert_eq!(
            json!(["A", "B"]),
            Contributor::to_json_any(&[Contributor::new("A"), Contributor::new("B")]),
        );
        assert_eq!(json!("A"), Contributor::to_json_any(&[Contributor::new("A")]));
    }
}
