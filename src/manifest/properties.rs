use crate::manifest::{Encryption, Layout, Orientation, Overflow, Page, Spread};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form properties of a [`Link`](super::Link), with typed accessors for the
/// well-known keys.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(Map<String, Value>);

/// Details about the archive entry backing a link, under the `archive` property.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveProperties {
    /// The compressed length of the entry, or its length if stored uncompressed.
    pub entry_length: u64,
    /// Whether the entry is compressed within the archive.
    pub is_entry_compressed: bool,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw value under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the value under `key` if it is a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Returns the value under `key` if it is a boolean.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Inserts a value, replacing any previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Inserts all `other` properties, replacing existing keys.
    pub fn extend(&mut self, other: Properties) {
        self.0.extend(other.0);
    }

    /// Removes the value under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn clipped(&self) -> Option<bool> {
        self.get_bool("clipped")
    }

    pub fn layout(&self) -> Option<Layout> {
        self.get_str("layout").and_then(Layout::parse)
    }

    pub fn orientation(&self) -> Option<Orientation> {
        self.get_str("orientation").and_then(Orientation::parse)
    }

    pub fn overflow(&self) -> Option<Overflow> {
        self.get_str("overflow").and_then(Overflow::parse)
    }

    pub fn page(&self) -> Option<Page> {
        self.get_str("page").and_then(Page::parse)
    }

    pub fn spread(&self) -> Option<Spread> {
        self.get_str("spread").and_then(Spread::parse)
    }

    /// Media types of resources embedded in the content, such as `mathml` or `svg`.
    pub fn contains(&self) -> Vec<&str> {
        match self.get("contains") {
            Some(Value::Array(values)) => values.iter().filter_map(Value::as_str).collect(),
            Some(Value::String(value)) => vec![value.as_str()],
            _ => Vec::new(),
        }
    }

    /// How the resource is encrypted, if it is.
    pub fn encrypted(&self) -> Option<Encryption> {
        self.get("encrypted")
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Archive entry details injected by an archive-backed fetcher.
    pub fn archive(&self) -> Option<ArchiveProperties> {
        self.get("archive")
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

impl From<Map<String, Value>> for Properties {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<ArchiveProperties> for Value {
    fn from(archive: ArchiveProperties) -> Self {
        serde_json::json!({
            "entryLength": archive.entry_length,
            "isEntryCompressed": archive.is_entry_compressed,
        })
    }
}

impl From<Properties> for Value {
    fn from(properties: Properties) -> Self {
        Value::Object(properties.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{ArchiveProperties, Properties};
    use crate::manifest::{Layout, Page};
    use serde_json::json;

    #[test]
    fn test_accessors() {
        let properties: Properties = serde_json::from_value(json!({
            "layout": "fixed",
            "page": "left",
            "spread": "unknown",
            "contains": ["mathml", "svg"],
            "archive": {"entryLength": 3000, "isEntryCompressed": true},
            "encrypted": {"algorithm": "http://www.idpf.org/2008/embedding", "originalLength": 42},
        }))
        .unwrap();

        assert_eq!(Some(Layout::Fixed), properties.layout());
        assert_eq!(Some(Page::Left), properties.page());
        assert_eq!(None, properties.spread());
        assert_eq!(None, properties.clipped());
        assert_eq!(vec!["mathml", "svg"], properties.contains());
        assert_eq!(
            Some(ArchiveProperties {
                entry_length: 3000,
                is_entry_compressed: true,
            }),
            properties.archive(),
        );

        let encrypted = properties.encrypted().unwrap();
        assert_eq!("http://www.idpf.org/2008/embedding", encrypted.algorithm);
        assert_eq!(Some(42), encrypted.original_length);
    }
}
