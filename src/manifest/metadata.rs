use crate::manifest::json::{self, MapExt};
use crate::manifest::{
    A11y, Collection, Contributor, HrefNormalizer, JsonEntity, LocalizedString, ManifestError, ManifestResult,
    Presentation, Subject, impl_serde_via_json, keywords,
};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The `otherMetadata` key holding accessibility metadata inferred by a parser.
pub const INFERRED_ACCESSIBILITY: &str = "https://readium.org/webpub-manifest#inferredAccessibility";

/// Roles of contributors, paired with their JSON key.
const CONTRIBUTOR_KEYS: [&str; 13] = [
    "author",
    "translator",
    "editor",
    "artist",
    "illustrator",
    "letterer",
    "penciler",
    "colorist",
    "inker",
    "narrator",
    "contributor",
    "publisher",
    "imprint",
];

/// Keys of a metadata object with a dedicated field.
const METADATA_KEYS: [&str; 18] = [
    "identifier",
    "@type",
    "conformsTo",
    "title",
    "subtitle",
    "sortAs",
    "accessibility",
    "modified",
    "published",
    "language",
    "subject",
    "readingProgression",
    "description",
    "duration",
    "numberOfPages",
    "belongsTo",
    "belongs_to",
    "presentation",
];

keywords! {
    /// The direction in which resources are read.
    #[derive(Default)]
    ReadingProgression {
        /// Determined by the reading system, see [`Metadata::effective_reading_progression`].
        #[default]
        Auto => "auto",
        /// Left to right.
        Ltr => "ltr",
        /// Right to left.
        Rtl => "rtl",
        /// Top to bottom.
        Ttb => "ttb",
        /// Bottom to top.
        Btt => "btt",
    }
}

impl ReadingProgression {
    /// Returns `Some(true)` if the progression is horizontal, `Some(false)` if it is
    /// vertical, and [`None`] if it is [`ReadingProgression::Auto`].
    pub fn is_horizontal(&self) -> Option<bool> {
        match self {
            Self::Ltr | Self::Rtl => Some(true),
            Self::Ttb | Self::Btt => Some(false),
            Self::Auto => None,
        }
    }
}

/// Metadata of a publication.
///
/// Keys without a dedicated field are retained in [`Metadata::other_metadata`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Metadata {
    /// A unique identifier, such as a URN (`urn:isbn:...`).
    pub identifier: Option<String>,
    /// The schema.org type, e.g. `http://schema.org/Book`.
    pub r#type: Option<String>,
    /// Profiles the publication conforms to, e.g. [`Metadata::PROFILE_EPUB`].
    pub conforms_to: Vec<String>,
    pub localized_title: LocalizedString,
    pub localized_subtitle: Option<LocalizedString>,
    pub localized_sort_as: Option<LocalizedString>,
    pub accessibility: Option<A11y>,
    /// Last modification date, as found in the source (typically ISO 8601).
    pub modified: Option<String>,
    /// Publication date, as found in the source (typically ISO 8601).
    pub published: Option<String>,
    /// BCP-47 tags of the publication's languages.
    pub languages: Vec<String>,
    pub subjects: Vec<Subject>,
    pub authors: Vec<Contributor>,
    pub translators: Vec<Contributor>,
    pub editors: Vec<Contributor>,
    pub artists: Vec<Contributor>,
    pub illustrators: Vec<Contributor>,
    pub letterers: Vec<Contributor>,
    pub pencilers: Vec<Contributor>,
    pub colorists: Vec<Contributor>,
    pub inkers: Vec<Contributor>,
    pub narrators: Vec<Contributor>,
    /// Contributors whose role has no dedicated field.
    pub contributors: Vec<Contributor>,
    pub publishers: Vec<Contributor>,
    pub imprints: Vec<Contributor>,
    pub reading_progression: ReadingProgression,
    pub description: Option<String>,
    /// Total duration in seconds.
    pub duration: Option<f64>,
    pub number_of_pages: Option<u64>,
    /// Collections the publication belongs to, keyed by role (`series`, `collection`, ...).
    pub belongs_to: BTreeMap<String, Vec<Collection>>,
    pub presentation: Option<Presentation>,
    pub other_metadata: Map<String, Value>,
}

impl Metadata {
    pub const PROFILE_EPUB: &'static str = "https://readium.org/webpub-manifest/profiles/epub";
    pub const PROFILE_AUDIOBOOK: &'static str = "https://readium.org/webpub-manifest/profiles/audiobook";
    pub const PROFILE_DIVINA: &'static str = "https://readium.org/webpub-manifest/profiles/divina";
    pub const PROFILE_PDF: &'static str = "https://readium.org/webpub-manifest/profiles/pdf";

    /// Creates metadata with the given title.
    pub fn new(title: impl Into<LocalizedString>) -> Self {
        Self {
            localized_title: title.into(),
            ..Self::default()
        }
    }

    /// The default translation of the title.
    pub fn title(&self) -> &str {
        self.localized_title.default_translation()
    }

    pub fn subtitle(&self) -> Option<&str> {
        self.localized_subtitle
            .as_ref()
            .map(LocalizedString::default_translation)
    }

    pub fn sort_as(&self) -> Option<&str> {
        self.localized_sort_as
            .as_ref()
            .map(LocalizedString::default_translation)
    }

    /// The collections under the `collection` role.
    pub fn belongs_to_collections(&self) -> &[Collection] {
        self.belongs_to.get("collection").map_or(&[], Vec::as_slice)
    }

    /// The collections under the `series` role.
    pub fn belongs_to_series(&self) -> &[Collection] {
        self.belongs_to.get("series").map_or(&[], Vec::as_slice)
    }

    /// Resolves [`ReadingProgression::Auto`] from the publication's language.
    ///
    /// With exactly one language, Arabic, Persian, Hebrew and traditional Chinese
    /// (`zh-Hant`, `zh-TW`) read right to left.
    /// Everything else reads left to right.
    pub fn effective_reading_progression(&self) -> ReadingProgression {
        if self.reading_progression != ReadingProgression::Auto {
            return self.reading_progression;
        }
        let [language] = self.languages.as_slice() else {
            return ReadingProgression::Ltr;
        };
        let language = language.to_ascii_lowercase();

        if language == "zh-hant" || language == "zh-tw" {
            return ReadingProgression::Rtl;
        }
        match language.split(['-', '_']).next() {
            Some("ar" | "fa" | "he") => ReadingProgression::Rtl,
            _ => ReadingProgression::Ltr,
        }
    }

    fn contributors(&self, key: &str) -> &[Contributor] {
        match key {
            "author" => &self.authors,
            "translator" => &self.translators,
            "editor" => &self.editors,
            "artist" => &self.artists,
            "illustrator" => &self.illustrators,
            "letterer" => &self.letterers,
            "penciler" => &self.pencilers,
            "colorist" => &self.colorists,
            "inker" => &self.inkers,
            "narrator" => &self.narrators,
            "publisher" => &self.publishers,
            "imprint" => &self.imprints,
            _ => &self.contributors,
        }
    }

    fn contributors_mut(&mut self, key: &str) -> &mut Vec<Contributor> {
        match key {
            "author" => &mut self.authors,
            "translator" => &mut self.translators,
            "editor" => &mut self.editors,
            "artist" => &mut self.artists,
            "illustrator" => &mut self.illustrators,
            "letterer" => &mut self.letterers,
            "penciler" => &mut self.pencilers,
            "colorist" => &mut self.colorists,
            "inker" => &mut self.inkers,
            "narrator" => &mut self.narrators,
            "publisher" => &mut self.publishers,
            "imprint" => &mut self.imprints,
            _ => &mut self.contributors,
        }
    }
}

impl JsonEntity for Metadata {
    fn from_json(value: &Value, normalize: HrefNormalizer) -> ManifestResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| ManifestError::invalid("metadata", "expected a JSON object"))?;
        let title = object.get("title").ok_or(ManifestError::MissingField("title"))?;

        let mut metadata = Self {
            identifier: json::non_empty_string(object.get("identifier")),
            r#type: json::non_empty_string(object.get("@type")),
            conforms_to: json::string_set("conformsTo", object.get("conformsTo"))?,
            localized_title: LocalizedString::from_json_field("title", title)?,
            localized_subtitle: LocalizedString::from_json_opt(object, "subtitle")?,
            localized_sort_as: LocalizedString::from_json_opt(object, "sortAs")?,
            accessibility: object
                .get("accessibility")
                .map(|a11y| A11y::from_json(a11y, normalize))
                .transpose()?
                .filter(|a11y| !a11y.is_empty()),
            modified: json::non_empty_string(object.get("modified")),
            published: json::non_empty_string(object.get("published")),
            languages: json::string_set("language", object.get("language"))?,
            subjects: Subject::from_json_any(object.get("subject"), normalize)?,
            reading_progression: json::string(object.get("readingProgression"))
                .and_then(|progression| ReadingProgression::parse(&progression))
                .unwrap_or_default(),
            description: json::non_empty_string(object.get("description")),
            duration: json::float(object.get("duration")).filter(|duration| *duration >= 0.0),
            number_of_pages: json::float(object.get("numberOfPages"))
                .filter(|pages| *pages >= 0.0)
                .map(|pages| pages as u64),
            presentation: object
                .get("presentation")
                .filter(|presentation| presentation.is_object())
                .map(|presentation| serde_json::from_value(presentation.clone()))
                .transpose()
                .map_err(|error| ManifestError::invalid("presentation", error.to_string()))?,
            ..Self::default()
        };

        for key in CONTRIBUTOR_KEYS {
            *metadata.contributors_mut(key) = Contributor::from_json_any(object.get(key), normalize)?;
        }

        let belongs_to = object
            .get("belongsTo")
            .or_else(|| object.get("belongs_to"))
            .and_then(Value::as_object);
        for (role, collections) in belongs_to.into_iter().flatten() {
            let collections = Contributor::from_json_any(Some(collections), normalize)?;
            if !collections.is_empty() {
                metadata.belongs_to.insert(role.clone(), collections);
            }
        }

        metadata.other_metadata = object
            .iter()
            .filter(|(key, _)| !METADATA_KEYS.contains(&key.as_str()) && !CONTRIBUTOR_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(metadata)
    }

    fn to_json(&self) -> Value {
        let mut object = Map::new();

        object.insert_some("identifier", self.identifier.as_deref());
        object.insert_some("@type", self.r#type.as_deref());
        if !self.conforms_to.is_empty() {
            object.insert("conformsTo".to_owned(), json::collapsed_strings(&self.conforms_to));
        }
        object.insert("title".to_owned(), self.localized_title.to_json());
        object.insert_some("subtitle", self.localized_subtitle.as_ref().map(JsonEntity::to_json));
        object.insert_some("sortAs", self.localized_sort_as.as_ref().map(JsonEntity::to_json));
        object.insert_some("accessibility", self.accessibility.as_ref().map(JsonEntity::to_json));
        object.insert_some("modified", self.modified.as_deref());
        object.insert_some("published", self.published.as_deref());
        if !self.languages.is_empty() {
            object.insert("language".to_owned(), json::collapsed_strings(&self.languages));
        }
        if !self.subjects.is_empty() {
            let subjects = self.subjects.iter().map(JsonEntity::to_json).collect();
            object.insert("subject".to_owned(), Value::Array(subjects));
        }
        for key in CONTRIBUTOR_KEYS {
            let contributors = self.contributors(key);
            if !contributors.is_empty() {
                object.insert(key.to_owned(), Contributor::to_json_any(contributors));
            }
        }
        if self.reading_progression != ReadingProgression::Auto {
            object.insert("readingProgression".to_owned(), Value::from(self.reading_progression.as_str()));
        }
        object.insert_some("description", self.description.as_deref());
        object.insert_some("duration", self.duration);
        object.insert_some("numberOfPages", self.number_of_pages);
        if !self.belongs_to.is_empty() {
            let belongs_to = self
                .belongs_to
                .iter()
                .map(|(role, collections)| (role.clone(), Contributor::to_json_any(collections)))
                .collect();
            object.insert("belongsTo".to_owned(), Value::Object(belongs_to));
        }
        object.insert_some(
            "presentation",
            self.presentation
                .as_ref()
                .and_then(|presentation| serde_json::to_value(presentation).ok()),
        );
        for (key, value) in &self.other_metadata {
            object.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Value::Object(object)
    }
}

impl_serde_via_json!(Metadata);
