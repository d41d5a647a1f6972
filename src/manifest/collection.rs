use crate::manifest::{HrefNormalizer, JsonEntity, Link, ManifestResult, impl_serde_via_json};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A group of links with its own metadata, such as `pageList` or `landmarks`.
///
/// # JSON
/// A collection is either an object with `metadata`, `links`, and role-keyed
/// subcollections, or a bare array of links.
/// A role holding several collections is written as an array of collection objects.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PublicationCollection {
    pub metadata: Map<String, Value>,
    pub links: Vec<Link>,
    /// Nested collections, keyed by role.
    pub subcollections: BTreeMap<String, Vec<PublicationCollection>>,
}

impl PublicationCollection {
    /// Creates a collection holding only `links`.
    pub fn new(links: Vec<Link>) -> Self {
        Self {
            links,
            ..Self::default()
        }
    }

    /// Parses every collection found under a role.
    ///
    /// Objects without `links` are skipped.
    pub(crate) fn from_json_any(value: &Value, normalize: HrefNormalizer) -> ManifestResult<Vec<Self>> {
        match value {
            Value::Object(object) => Ok(Self::from_object(object, normalize)?.into_iter().collect()),
            Value::Array(values) if values.iter().any(|value| value.get("href").is_some()) => {
                let links = Link::from_json_array(Some(value), normalize)?;
                Ok(vec![Self::new(links)])
            }
            Value::Array(values) => {
                let mut collections = Vec::new();
                for value in values.iter().filter_map(Value::as_object) {
                    collections.extend(Self::from_object(value, normalize)?);
                }
                Ok(collections)
            }
            _ => Ok(Vec::new()),
        }
    }

    fn from_object(object: &Map<String, Value>, normalize: HrefNormalizer) -> ManifestResult<Option<Self>> {
        if !object.get("links").is_some_and(Value::is_array) {
            log::warn!("Skipping a publication collection without links");
            return Ok(None);
        }

        let mut subcollections = BTreeMap::new();
        for (role, value) in object {
            if role == "metadata" || role == "links" {
                continue;
            }
            let collections = Self::from_json_any(value, normalize)?;
            if !collections.is_empty() {
                subcollections.insert(role.clone(), collections);
            }
        }

        Ok(Some(Self {
            metadata: object
                .get("metadata")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
            links: Link::from_json_array(object.get("links"), normalize)?,
            subcollections,
        }))
    }

    /// Writes a single collection as an object, and several as an array.
    ///
    /// A collection with only links collapses into an array of links.
    pub(crate) fn to_json_any(collections: &[Self]) -> Value {
        match collections {
            [collection] if collection.metadata.is_empty() && collection.subcollections.is_empty() => {
                Link::to_json_array(&collection.links)
            }
            [collection] => collection.to_json(),
            collections => Value::Array(collections.iter().map(Self::to_json).collect()),
        }
    }
}

impl JsonEntity for PublicationCollection {
    fn from_json(value: &Value, normalize: HrefNormalizer) -> ManifestResult<Self> {
        Ok(Self::from_json_any(value, normalize)?
            .into_iter()
            .next()
            .unwrap_or_default())
    }

    fn to_json(&self) -> Value {
        let mut object = Map::new();

        if !self.metadata.is_empty() {
            object.insert("metadata".to_owned(), Value::Object(self.metadata.clone()));
        }
        object.insert("links".to_owned(), Link::to_json_array(&self.links));
        for (role, collections) in &self.subcollections {
            object.insert(role.clone(), Self::to_json_any(collections));
        }
        Value::Object(object)
    }
}

impl_serde_via_json!(PublicationCollection);
