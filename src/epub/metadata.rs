mod adapter;

pub(super) use self::adapter::{PubMetadataAdapter, duration};

use crate::epub::consts::{self, vocab};
use crate::manifest::LocalizedString;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Metadata items keyed by their resolved property.
pub(super) type MetadataItems = BTreeMap<String, Vec<MetadataItem>>;

/// A `<meta>` or Dublin Core element of the package document, with its refinements.
#[derive(Clone, Debug, Default, PartialEq)]
pub(super) struct MetadataItem {
    pub(super) property: String,
    pub(super) value: String,
    pub(super) lang: String,
    pub(super) scheme: Option<String>,
    /// The id of the refined item, without the leading `#`.
    pub(super) refines: Option<String>,
    pub(super) id: Option<String>,
    pub(super) children: MetadataItems,
}

impl MetadataItem {
    pub(super) fn new(property: impl Into<String>, value: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
            lang: lang.into(),
            ..Self::default()
        }
    }

    pub(super) fn add_child(&mut self, child: MetadataItem) {
        self.children
            .entry(child.property.clone())
            .or_default()
            .push(child);
    }

    /// The value of the first refinement named `property`.
    pub(super) fn first_value(&self, property: &str) -> Option<&str> {
        self.children
            .get(property)
            .and_then(|children| children.first())
            .map(|child| child.value.as_str())
    }

    fn first_meta(&self, name: &str) -> Option<&str> {
        self.first_value(&format!("{}{name}", vocab::META))
    }

    pub(super) fn file_as(&self) -> Option<LocalizedString> {
        let file_as = self
            .children
            .get(&format!("{}{}", vocab::META, consts::FILE_AS))?
            .first()?;
        Some(LocalizedString::from_translations([(
            file_as.lang.as_str(),
            file_as.value.as_str(),
        )]))
    }

    pub(super) fn title_type(&self) -> Option<&str> {
        self.first_meta(consts::TITLE_TYPE)
    }

    pub(super) fn display_seq(&self) -> Option<i64> {
        self.first_meta(consts::DISPLAY_SEQ)?.trim().parse().ok()
    }

    pub(super) fn authority(&self) -> Option<&str> {
        self.first_meta(consts::AUTHORITY)
    }

    pub(super) fn term(&self) -> Option<&str> {
        self.first_meta(consts::TERM)
    }

    pub(super) fn role(&self) -> Option<&str> {
        self.first_meta(consts::ROLE)
    }

    pub(super) fn collection_type(&self) -> Option<&str> {
        self.first_meta(consts::COLLECTION_TYPE)
    }

    pub(super) fn group_position(&self) -> Option<f64> {
        self.first_meta(consts::GROUP_POSITION)?.trim().parse().ok()
    }

    pub(super) fn identifier(&self) -> Option<&str> {
        self.first_value(&format!("{}identifier", vocab::DCTERMS))
    }

    /// The value in its language, along with any `alternate-script` refinements.
    pub(super) fn localized_string(&self) -> LocalizedString {
        let mut string = LocalizedString::from_translations([(self.lang.as_str(), self.value.as_str())]);

        let alternate_scripts = format!("{}{}", vocab::META, consts::ALTERNATE_SCRIPT);
        for script in self.children.get(&alternate_scripts).into_iter().flatten() {
            string.set(script.lang.as_str(), script.value.as_str());
        }
        string
    }

    /// The value as JSON: a plain string, or a mapping of
    /// its refinements plus `@value` when refined.
    pub(super) fn to_json(&self) -> Value {
        if self.children.is_empty() {
            return Value::String(self.value.clone());
        }
        let mut map = Map::new();

        for child in self.children.values().flatten() {
            map.insert(child.property.clone(), child.to_json());
        }
        map.insert("@value".to_owned(), Value::String(self.value.clone()));
        Value::Object(map)
    }
}

/// A `<link>` element of the package metadata.
#[derive(Clone, Debug, Default, PartialEq)]
pub(super) struct MetadataLink {
    pub(super) href: String,
    pub(super) rels: Vec<String>,
    pub(super) media_type: Option<String>,
    pub(super) refines: Option<String>,
    pub(super) properties: Vec<String>,
}

/// The package metadata with refinements resolved.
#[derive(Clone, Debug, Default, PartialEq)]
pub(super) struct EpubMetadata {
    /// Publication-wide items.
    pub(super) global: MetadataItems,
    /// Items refining a manifest item (or any non-metadata element), keyed by its id.
    pub(super) refine: HashMap<String, MetadataItems>,
    pub(super) links: Vec<MetadataLink>,
}

impl EpubMetadata {
    pub(super) fn new(items: Vec<MetadataItem>, links: Vec<MetadataLink>) -> Self {
        let mut metadata = Self {
            links,
            ..Self::default()
        };

        for item in resolve_hierarchy(items) {
            let group = match &item.refines {
                Some(refines) => metadata.refine.entry(refines.clone()).or_default(),
                None => &mut metadata.global,
            };
            group.entry(item.property.clone()).or_default().push(item);
        }
        metadata
    }
}

/// Nests every item refining another metadata item under it.
///
/// Roots are items refining nothing, or refining an id outside the metadata
/// (such as a manifest item).
/// A refinement already visited along the current path is skipped, breaking cycles.
fn resolve_hierarchy(items: Vec<MetadataItem>) -> Vec<MetadataItem> {
    let ids: HashSet<&str> = items.iter().filter_map(|item| item.id.as_deref()).collect();
    let mut by_refines: HashMap<&str, Vec<&MetadataItem>> = HashMap::new();

    for item in &items {
        if let Some(refines) = item.refines.as_deref() {
            by_refines.entry(refines).or_default().push(item);
        }
    }

    items
        .iter()
        .filter(|item| {
            item.refines
                .as_deref()
                .is_none_or(|refines| !ids.contains(refines))
        })
        .map(|root| resolve_item(root, &by_refines, &mut Vec::new()))
        .collect()
}

fn resolve_item<'a>(
    item: &'a MetadataItem,
    by_refines: &HashMap<&str, Vec<&'a MetadataItem>>,
    chain: &mut Vec<&'a str>,
) -> MetadataItem {
    let mut resolved = item.clone();
    let Some(id) = item.id.as_deref() else {
        return resolved;
    };
    chain.push(id);

    for refinement in by_refines.get(id).into_iter().flatten() {
        let visited = refinement
            .id
            .as_deref()
            .is_some_and(|id| chain.contains(&id));

        if !visited {
            resolved.add_child(resolve_item(refinement, by_refines, chain));
        }
    }
    chain.pop();
    resolved
}
