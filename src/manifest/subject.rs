use crate::manifest::json::{self, MapExt};
use crate::manifest::{
    HrefNormalizer, JsonEntity, Link, LocalizedString, ManifestError, ManifestResult, UNDEFINED_LANGUAGE,
    impl_serde_via_json,
};
use serde_json::{Map, Value};

/// A topic of a publication, optionally drawn from a classification scheme.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Subject {
    pub localized_name: LocalizedString,
    pub localized_sort_as: Option<LocalizedString>,
    /// The classification scheme, e.g. `http://id.worldcat.org/fast/`.
    pub scheme: Option<String>,
    /// The code of the subject within its scheme.
    pub code: Option<String>,
    /// Links to publications on the same subject.
    pub links: Vec<Link>,
}

impl Subject {
    pub fn new(name: impl Into<LocalizedString>) -> Self {
        Self {
            localized_name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        self.localized_name.default_translation()
    }

    pub fn sort_as(&self) -> &str {
        self.localized_sort_as
            .as_ref()
            .map_or("", LocalizedString::default_translation)
    }

    pub(crate) fn from_json_any(value: Option<&Value>, normalize: HrefNormalizer) -> ManifestResult<Vec<Self>> {
        match value {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(values)) => values
                .iter()
                .filter(|value| !value.is_null())
                .map(|value| Self::from_json(value, normalize))
                .collect(),
            Some(value) => Self::from_json(value, normalize).map(|subject| vec![subject]),
        }
    }
}

impl JsonEntity for Subject {
    fn from_json(value: &Value, normalize: HrefNormalizer) -> ManifestResult<Self> {
        let object = match value {
            Value::String(name) => return Ok(Self::new(name.as_str())),
            Value::Object(object) => object,
            _ => return Err(ManifestError::invalid("subject", "expected a string or an object")),
        };
        let name = object.get("name").ok_or(ManifestError::MissingField("name"))?;

        Ok(Self {
            localized_name: LocalizedString::from_json_field("name", name)?,
            localized_sort_as: LocalizedString::from_json_opt(object, "sortAs")?,
            scheme: json::non_empty_string(object.get("scheme")),
            code: json::non_empty_string(object.get("code")),
            links: Link::from_json_array(object.get("links"), normalize)?,
        })
    }

    fn to_json(&self) -> Value {
        let name_only = self.localized_sort_as.is_none()
            && self.scheme.is_none()
            && self.code.is_none()
            && self.links.is_empty();
        if name_only
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
        object.insert_some("scheme", self.scheme.as_deref());
        object.insert_some("code", self.code.as_deref());
        if !self.links.is_empty() {
            object.insert("links".to_owned(), Link::to_json_array(&self.links));
        }
        Value::Object(object)
    }
}

impl_serde_via_json!(Subject);
