use crate::epub::clock::parse_clock_value;
use crate::epub::consts::{self, OPF_VERSION, vocab};
use crate::epub::metadata::{MetadataItem, MetadataItems, MetadataLink};
use crate::manifest::a11y::{A11y, AccessMode, Certification, Feature, Hazard, PrimaryAccessMode, Profile};
use crate::manifest::{
    Collection, Contributor, Layout, LocalizedString, Metadata, Orientation, Overflow, Presentation,
    ReadingProgression, Spread, Subject,
};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// MARC relator codes with a dedicated contributor list.
const KNOWN_ROLES: [&str; 8] = ["aut", "trl", "edt", "pbl", "art", "ill", "clr", "nrt"];

/// Conformance URLs of the EPUB Accessibility 1.0 WCAG levels.
const A11Y_PROFILES: [(&str, Profile); 3] = [
    ("accessibility-20170105.html#wcag-a", Profile::EPUB_A11Y_10_WCAG_20_A),
    ("accessibility-20170105.html#wcag-aa", Profile::EPUB_A11Y_10_WCAG_20_AA),
    ("accessibility-20170105.html#wcag-aaa", Profile::EPUB_A11Y_10_WCAG_20_AAA),
];

/// Computes the publication [`Metadata`] from the global package metadata.
pub(in crate::epub) struct PubMetadataAdapter<'a> {
    pub(in crate::epub) items: &'a MetadataItems,
    pub(in crate::epub) links: &'a [MetadataLink],
    pub(in crate::epub) version: &'a str,
    pub(in crate::epub) epub_version: f64,
    pub(in crate::epub) fallback_title: &'a str,
    pub(in crate::epub) unique_identifier_id: Option<&'a str>,
    pub(in crate::epub) reading_progression: ReadingProgression,
    pub(in crate::epub) display_options: &'a HashMap<String, String>,
}

impl PubMetadataAdapter<'_> {
    pub(in crate::epub) fn metadata(&self) -> Metadata {
        let mut metadata = Metadata {
            identifier: self.identifier(),
            conforms_to: vec![Metadata::PROFILE_EPUB.to_owned()],
            modified: self.first_value(vocab::DCTERMS, "modified").map(str::to_owned),
            published: self.first_value(vocab::DCTERMS, "date").map(str::to_owned),
            languages: self.values(vocab::DCTERMS, "language"),
            subjects: self.subjects(),
            description: self.first_value(vocab::DCTERMS, "description").map(str::to_owned),
            duration: duration(self.items),
            reading_progression: self.reading_progression,
            belongs_to: self.belongs_to(),
            presentation: Some(self.presentation()),
            accessibility: Some(self.accessibility()).filter(|a11y| !a11y.is_empty()),
            other_metadata: self.other_metadata(),
            ..Metadata::new(self.title())
        };
        metadata.localized_subtitle = self.subtitle();
        metadata.localized_sort_as = self.sort_as();
        self.add_contributors(&mut metadata);
        metadata
    }

    /// The EPUB 2 `<meta name="cover">` manifest item id.
    pub(in crate::epub) fn cover(&self) -> Option<&str> {
        self.items
            .get(consts::COVER)
            .and_then(|items| items.first())
            .map(|item| item.value.as_str())
    }

    fn all(&self, vocabulary: &str, name: &str) -> &[MetadataItem] {
        self.items
            .get(&format!("{vocabulary}{name}"))
            .map_or(&[], Vec::as_slice)
    }

    fn first_value(&self, vocabulary: &str, name: &str) -> Option<&str> {
        self.all(vocabulary, name)
            .first()
            .map(|item| item.value.as_str())
    }

    fn values(&self, vocabulary: &str, name: &str) -> Vec<String> {
        self.all(vocabulary, name)
            .iter()
            .map(|item| item.value.clone())
            .collect()
    }

    fn identifier(&self) -> Option<String> {
        let identifiers = self.all(vocab::DCTERMS, "identifier");

        self.unique_identifier_id
            .and_then(|id| identifiers.iter().find(|item| item.id.as_deref() == Some(id)))
            .or(identifiers.first())
            .map(|item| item.value.clone())
    }

    fn titles(&self) -> &[MetadataItem] {
        self.all(vocab::DCTERMS, consts::TITLE)
    }

    fn main_title(&self) -> Option<&MetadataItem> {
        let titles = self.titles();

        titles
            .iter()
            .find(|title| title.title_type() == Some("main"))
            .or(titles.first())
    }

    fn title(&self) -> LocalizedString {
        self.main_title()
            .map(MetadataItem::localized_string)
            .filter(|title| !title.default_translation().is_empty())
            .unwrap_or_else(|| LocalizedString::new(self.fallback_title))
    }

    fn subtitle(&self) -> Option<LocalizedString> {
        let mut subtitles = self
            .titles()
            .iter()
            .filter(|title| title.title_type() == Some("subtitle"))
            .collect::<Vec<_>>();

        subtitles.sort_by_key(|title| title.display_seq().unwrap_or_default());
        subtitles.first().map(|title| title.localized_string())
    }

    fn sort_as(&self) -> Option<LocalizedString> {
        self.main_title()
            .and_then(MetadataItem::file_as)
            .or_else(|| {
                self.items
                    .get(consts::CALIBRE_TITLE_SORT)
                    .and_then(|items| items.first())
                    .map(|item| LocalizedString::new(item.value.as_str()))
            })
    }

    fn subjects(&self) -> Vec<Subject> {
        let subjects = self
            .all(vocab::DCTERMS, "subject")
            .iter()
            .map(|item| Subject {
                localized_name: item.localized_string(),
                localized_sort_as: item.file_as(),
                scheme: item.authority().map(str::to_owned),
                code: item.term().map(str::to_owned),
                links: Vec::new(),
            })
            .collect::<Vec<_>>();

        match subjects.as_slice() {
            [subject]
                if subject.localized_name.len() == 1
                    && subject.localized_sort_as.is_none()
                    && subject.scheme.is_none()
                    && subject.code.is_none() =>
            {
                split_subject(subject)
            }
            _ => subjects,
        }
    }

    fn add_contributors(&self, metadata: &mut Metadata) {
        let contributors = [
            (vocab::DCTERMS, "creator", Some("aut")),
            (vocab::DCTERMS, "contributor", None),
            (vocab::DCTERMS, "publisher", Some("pbl")),
            (vocab::MEDIA, "narrator", Some("nrt")),
        ];

        for (vocabulary, name, default_role) in contributors {
            for item in self.all(vocabulary, name) {
                let role = item.role().or(default_role);
                let list = match role.filter(|role| KNOWN_ROLES.contains(role)) {
                    Some("aut") => &mut metadata.authors,
                    Some("trl") => &mut metadata.translators,
                    Some("edt") => &mut metadata.editors,
                    Some("pbl") => &mut metadata.publishers,
                    Some("art") => &mut metadata.artists,
                    Some("ill") => &mut metadata.illustrators,
                    Some("clr") => &mut metadata.colorists,
                    Some("nrt") => &mut metadata.narrators,
                    _ => &mut metadata.contributors,
                };
                list.push(contributor(item));
            }
        }
    }

    fn belongs_to(&self) -> BTreeMap<String, Vec<Collection>> {
        let mut belongs_to: BTreeMap<String, Vec<Collection>> = BTreeMap::new();

        for item in self.all(vocab::META, consts::BELONGS_TO_COLLECTION) {
            let role = match item.collection_type() {
                Some("series") => "series",
                _ => "collection",
            };
            belongs_to.entry(role.to_owned()).or_default().push(contributor(item));
        }

        if !belongs_to.contains_key("series") {
            let series = self.items.get(consts::CALIBRE_SERIES).and_then(|items| items.first());

            if let Some(series) = series {
                let position = self
                    .items
                    .get(consts::CALIBRE_SERIES_INDEX)
                    .and_then(|items| items.first())
                    .and_then(|index| index.value.trim().parse().ok());
                let collection = Collection {
                    position,
                    ..Collection::new(series.localized_string())
                };
                belongs_to.insert("series".to_owned(), vec![collection]);
            }
        }
        belongs_to
    }

    fn presentation(&self) -> Presentation {
        let rendition = |name| self.first_value(vocab::RENDITION, name);
        let mut presentation = Presentation::default();

        match rendition("flow") {
            Some("paginated") => presentation.overflow = Overflow::Paginated,
            Some("scrolled-continuous") => {
                presentation.overflow = Overflow::Scrolled;
                presentation.continuous = true;
            }
            Some("scrolled-doc") => presentation.overflow = Overflow::Scrolled,
            _ => {}
        }
        presentation.spread = match rendition("spread") {
            Some("none") => Spread::None,
            Some("landscape") => Spread::Landscape,
            Some("portrait" | "both") => Spread::Both,
            _ => Spread::Auto,
        };
        presentation.orientation = match rendition("orientation") {
            Some("landscape") => Orientation::Landscape,
            Some("portrait") => Orientation::Portrait,
            _ => Orientation::Auto,
        };

        let fixed = if self.epub_version < 3.0 {
            self.display_options
                .get("fixed-layout")
                .is_some_and(|fixed| fixed == "true")
        } else {
            rendition("layout") == Some("pre-paginated")
        };
        presentation.layout = Some(if fixed { Layout::Fixed } else { Layout::Reflowable });
        presentation
    }

    fn accessibility(&self) -> A11y {
        let schema = |name| self.values(vocab::SCHEMA, name);
        let a11y_value = |name| self.first_value(vocab::A11Y, name).map(str::to_owned);

        let conformance_links = self
            .links
            .iter()
            .filter(|link| link.rels.iter().any(|rel| *rel == format!("{}conformsTo", vocab::DCTERMS)))
            .map(|link| link.href.as_str());
        let mut conforms_to = Vec::new();

        for profile in self
            .all(vocab::DCTERMS, "conformsTo")
            .iter()
            .map(|item| item.value.as_str())
            .chain(conformance_links)
            .filter_map(a11y_profile)
        {
            if !conforms_to.contains(&profile) {
                conforms_to.push(profile);
            }
        }

        let certifier_report = self
            .links
            .iter()
            .find(|link| link.rels.iter().any(|rel| *rel == format!("{}certifierReport", vocab::A11Y)))
            .map(|link| link.href.clone());
        let certification = Certification {
            certified_by: a11y_value("certifiedBy"),
            credential: a11y_value("certifierCredential"),
            report: a11y_value("certifierReport").or(certifier_report),
        };

        A11y {
            conforms_to,
            certification: Some(certification).filter(|certification| !certification.is_empty()),
            summary: self
                .first_value(vocab::SCHEMA, "accessibilitySummary")
                .map(str::to_owned),
            access_modes: schema("accessMode")
                .iter()
                .map(|mode| AccessMode::from(mode.as_str()))
                .collect(),
            access_modes_sufficient: schema("accessModeSufficient")
                .iter()
                .map(|modes| {
                    modes
                        .split(',')
                        .map(str::trim)
                        .filter(|mode| !mode.is_empty())
                        .map(PrimaryAccessMode::from)
                        .collect::<Vec<_>>()
                })
                .filter(|modes| !modes.is_empty())
                .collect(),
            features: schema("accessibilityFeature")
                .iter()
                .map(|feature| Feature::from(feature.as_str()))
                .collect(),
            hazards: schema("accessibilityHazard")
                .iter()
                .map(|hazard| Hazard::from(hazard.as_str()))
                .collect(),
        }
    }

    fn other_metadata(&self) -> Map<String, Value> {
        let used = [
            (vocab::DCTERMS, "identifier"),
            (vocab::DCTERMS, "language"),
            (vocab::DCTERMS, consts::TITLE),
            (vocab::DCTERMS, "date"),
            (vocab::DCTERMS, "modified"),
            (vocab::DCTERMS, "description"),
            (vocab::DCTERMS, "duration"),
            (vocab::DCTERMS, "creator"),
            (vocab::DCTERMS, "publisher"),
            (vocab::DCTERMS, "contributor"),
            (vocab::DCTERMS, "subject"),
            (vocab::DCTERMS, "conformsTo"),
            (vocab::META, consts::BELONGS_TO_COLLECTION),
            (vocab::MEDIA, "narrator"),
            (vocab::MEDIA, "duration"),
            (vocab::RENDITION, "flow"),
            (vocab::RENDITION, "spread"),
            (vocab::RENDITION, "orientation"),
            (vocab::RENDITION, "layout"),
            (vocab::SCHEMA, "accessibilitySummary"),
            (vocab::SCHEMA, "accessMode"),
            (vocab::SCHEMA, "accessModeSufficient"),
            (vocab::SCHEMA, "accessibilityFeature"),
            (vocab::SCHEMA, "accessibilityHazard"),
            (vocab::A11Y, "certifiedBy"),
            (vocab::A11Y, "certifierCredential"),
            (vocab::A11Y, "certifierReport"),
        ]
        .map(|(vocabulary, name)| format!("{vocabulary}{name}"));

        let mut other = self
            .items
            .iter()
            .filter(|(property, _)| !used.contains(property))
            .map(|(property, items)| {
                let value = match items.as_slice() {
                    [item] => item.to_json(),
                    items => Value::Array(items.iter().map(MetadataItem::to_json).collect()),
                };
                (property.clone(), value)
            })
            .collect::<Map<_, _>>();

        other.insert(OPF_VERSION.to_owned(), Value::String(self.version.to_owned()));
        other
    }
}

/// The duration of a manifest item, from its `media:duration` refinement.
pub(in crate::epub) fn duration(items: &MetadataItems) -> Option<f64> {
    items
        .get(&format!("{}duration", vocab::MEDIA))
        .and_then(|items| items.first())
        .and_then(|item| parse_clock_value(&item.value))
}

fn contributor(item: &MetadataItem) -> Contributor {
    Contributor {
        localized_sort_as: item.file_as(),
        identifier: item.identifier().map(str::to_owned),
        roles: item.role().map(str::to_owned).into_iter().collect(),
        position: item.group_position(),
        ..Contributor::new(item.localized_string())
    }
}

/// Splits a plain subject such as `"fiction, adventure; classics"` into several.
fn split_subject(subject: &Subject) -> Vec<Subject> {
    let Some((language, names)) = subject.localized_name.translations().next() else {
        return Vec::new();
    };

    names
        .split([',', ';'])
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| Subject::new(LocalizedString::from_translations([(language, name)])))
        .collect()
}

/// Maps a conformance URL to an accessibility profile.
///
/// Only `http(s)://(www.)idpf.org/epub/a11y/` URLs are recognized.
fn a11y_profile(url: &str) -> Option<Profile> {
    let path = ["http://", "https://"]
        .iter()
        .find_map(|scheme| url.trim().strip_prefix(scheme))?;
    let path = path.strip_prefix("www.").unwrap_or(path);
    let document = path.strip_prefix("idpf.org/epub/a11y/")?;

    A11Y_PROFILES
        .iter()
        .find(|(suffix, _)| *suffix == document)
        .map(|(_, profile)| profile.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::metadata::EpubMetadata;

    fn dcterms(name: &str) -> String {
        format!("{}{name}", vocab::DCTERMS)
    }

    fn meta(name: &str) -> String {
        format!("{}{name}", vocab::META)
    }

    fn item(id: Option<&str>, refines: Option<&str>, property: String, value: &str) -> MetadataItem {
        MetadataItem {
            id: id.map(str::to_owned),
            refines: refines.map(str::to_owned),
            ..MetadataItem::new(property, value, "")
        }
    }

    fn adapt(items: Vec<MetadataItem>, f: impl FnOnce(&PubMetadataAdapter)) {
        let metadata = EpubMetadata::new(items, Vec::new());
        let display_options = HashMap::new();
        let adapter = PubMetadataAdapter {
            items: &metadata.global,
            links: &metadata.links,
            version: "3.0",
            epub_version: 3.0,
            fallback_title: "fallback",
            unique_identifier_id: Some("uid"),
            reading_progression: ReadingProgression::Auto,
            display_options: &display_options,
        };
        f(&adapter);
    }

    #[test]
    fn test_title_refinements() {
        let title = || item(Some("t1"), None, dcterms("title"), "Main");
        let title_type = || item(None, Some("t1"), meta("title-type"), "main");

        adapt(vec![title(), title_type()], |adapter| {
            assert_eq!("Main", adapter.title().default_translation());
            assert_eq!(None, adapter.sort_as());
        });
        adapt(
            vec![title(), title_type(), item(None, Some("t1"), meta("file-as"), "Adventures")],
            |adapter| {
                assert_eq!(Some(LocalizedString::new("Adventures")), adapter.sort_as());
            },
        );
    }

    #[test]
    fn test_title_fallback_and_subtitle() {
        let items = vec![
            item(Some("s2"), None, dcterms("title"), "Second"),
            item(None, Some("s2"), meta("title-type"), "subtitle"),
            item(None, Some("s2"), meta("display-seq"), "2"),
            item(Some("s1"), None, dcterms("title"), "First"),
            item(None, Some("s1"), meta("title-type"), "subtitle"),
            item(None, Some("s1"), meta("display-seq"), "1"),
        ];

        adapt(items, |adapter| {
            assert_eq!("Second", adapter.title().default_translation());
            assert_eq!("First", adapter.subtitle().unwrap().default_translation());
        });
        adapt(Vec::new(), |adapter| {
            assert_eq!("fallback", adapter.title().default_translation());
        });
    }

    #[test]
    fn test_identifier_by_id() {
        let items = vec![
            item(Some("isbn"), None, dcterms("identifier"), "9780000000000"),
            item(Some("uid"), None, dcterms("identifier"), "urn:uuid:1234"),
        ];

        adapt(items, |adapter| {
            assert_eq!(Some("urn:uuid:1234".to_owned()), adapter.identifier());
        });
    }

    #[test]
    fn test_collections() {
        let items = vec![
            item(Some("c1"), None, meta("belongs-to-collection"), "Series A"),
            item(None, Some("c1"), meta("collection-type"), "series"),
            item(None, Some("c1"), meta("group-position"), "2.0"),
            item(Some("c2"), None, meta("belongs-to-collection"), "Collection B"),
        ];

        adapt(items, |adapter| {
            let belongs_to = adapter.belongs_to();
            let series = &belongs_to["series"][0];
            let collection = &belongs_to["collection"][0];

            assert_eq!("Series A", series.name());
            assert_eq!(Some(2.0), series.position);
            assert_eq!("Collection B", collection.name());
            assert_eq!(None, collection.position);
        });
    }

    #[test]
    fn test_calibre_series() {
        let items = vec![
            item(None, None, consts::CALIBRE_SERIES.to_owned(), "Discworld"),
            item(None, None, consts::CALIBRE_SERIES_INDEX.to_owned(), "3"),
        ];

        adapt(items, |adapter| {
            let series = &adapter.belongs_to()["series"][0];
            assert_eq!("Discworld", series.name());
            assert_eq!(Some(3.0), series.position);
        });
    }

    #[test]
    fn test_contributors() {
        let items = vec![
            item(Some("a"), None, dcterms("creator"), "Author"),
            item(Some("t"), None, dcterms("contributor"), "Translator"),
            item(None, Some("t"), meta("role"), "trl"),
            item(Some("x"), None, dcterms("contributor"), "Someone"),
            item(None, Some("x"), meta("role"), "xyz"),
            item(None, None, dcterms("publisher"), "Publisher"),
            item(None, None, format!("{}narrator", vocab::MEDIA), "Narrator"),
        ];

        adapt(items, |adapter| {
            let mut metadata = Metadata::default();
            adapter.add_contributors(&mut metadata);

            assert_eq!("Author", metadata.authors[0].name());
            assert_eq!("Translator", metadata.translators[0].name());
            assert_eq!("Publisher", metadata.publishers[0].name());
            assert_eq!("Narrator", metadata.narrators[0].name());
            assert_eq!("Someone", metadata.contributors[0].name());
            assert_eq!(vec!["xyz"], metadata.contributors[0].roles);
        });
    }

    #[test]
    fn test_subjects() {
        adapt(vec![item(None, None, dcterms("subject"), "fiction, adventure; classics")], |adapter| {
            let subjects = adapter.subjects();
            let names = subjects.iter().map(Subject::name).collect::<Vec<_>>();
            assert_eq!(vec!["fiction", "adventure", "classics"], names);
        });

        let items = vec![
            item(Some("s"), None, dcterms("subject"), "Fiction, General"),
            item(None, Some("s"), meta("authority"), "BISAC"),
            item(None, Some("s"), meta("term"), "FIC000000"),
        ];
        adapt(items, |adapter| {
            let subjects = adapter.subjects();
            assert_eq!(1, subjects.len());
            assert_eq!(Some("BISAC"), subjects[0].scheme.as_deref());
            assert_eq!(Some("FIC000000"), subjects[0].code.as_deref());
        });
    }

    #[test]
    fn test_presentation() {
        let rendition = |name: &str| format!("{}{name}", vocab::RENDITION);
        let items = vec![
            item(None, None, rendition("layout"), "pre-paginated"),
            item(None, None, rendition("flow"), "scrolled-continuous"),
            item(None, None, rendition("spread"), "portrait"),
            item(None, None, rendition("orientation"), "landscape"),
        ];

        adapt(items, |adapter| {
            let presentation = adapter.presentation();
            assert_eq!(Some(Layout::Fixed), presentation.layout);
            assert_eq!(Overflow::Scrolled, presentation.overflow);
            assert!(presentation.continuous);
            assert_eq!(Spread::Both, presentation.spread);
            assert_eq!(Orientation::Landscape, presentation.orientation);
        });
    }

    #[test]
    fn test_accessibility() {
        let schema = |name: &str| format!("{}{name}", vocab::SCHEMA);
        let items = vec![
            item(None, None, dcterms("conformsTo"), "http://www.idpf.org/epub/a11y/accessibility-20170105.html#wcag-aa"),
            item(None, None, dcterms("conformsTo"), "https://example.com/unknown"),
            item(None, None, schema("accessMode"), "textual"),
            item(None, None, schema("accessModeSufficient"), "textual, visual"),
            item(None, None, schema("accessibilityFeature"), "tableOfContents"),
            item(None, None, schema("accessibilitySummary"), "Accessible."),
            item(None, None, format!("{}certifiedBy", vocab::A11Y), "Certifier"),
        ];

        adapt(items, |adapter| {
            let a11y = adapter.accessibility();
            assert_eq!(vec![Profile::EPUB_A11Y_10_WCAG_20_AA], a11y.conforms_to);
            assert_eq!(vec![AccessMode::TEXTUAL], a11y.access_modes);
            assert_eq!(
                vec![vec![PrimaryAccessMode::TEXTUAL, PrimaryAccessMode::VISUAL]],
                a11y.access_modes_sufficient,
            );
            assert_eq!(vec![Feature::TABLE_OF_CONTENTS], a11y.features);
            assert_eq!(Some("Accessible."), a11y.summary.as_deref());
            assert_eq!(Some("Certifier"), a11y.certification.unwrap().certified_by.as_deref());
        });
        adapt(Vec::new(), |adapter| {
            assert!(adapter.metadata().accessibility.is_none());
        });
    }

    #[test]
    fn test_other_metadata() {
        let items = vec![
            item(None, None, dcterms("rights"), "Public domain"),
            item(None, None, dcterms("source"), "A"),
            item(None, None, dcterms("source"), "B"),
            item(None, None, dcterms("language"), "en"),
        ];

        adapt(items, |adapter| {
            let other = adapter.other_metadata();
            assert_eq!(Value::from("Public domain"), other[&dcterms("rights")]);
            assert_eq!(serde_json::json!(["A", "B"]), other[&dcterms("source")]);
            assert_eq!(Value::from("3.0"), other[OPF_VERSION]);
            assert!(!other.contains_key(&dcterms("language")));
        });
    }
}
