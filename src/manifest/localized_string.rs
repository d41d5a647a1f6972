use crate::manifest::{HrefNormalizer, JsonEntity, ManifestError, ManifestResult, impl_serde_via_json};
use serde_json::{Map, Value};
use std::fmt::Display;

/// The BCP-47 tag of a translation in an undefined language.
pub const UNDEFINED_LANGUAGE: &str = "und";

/// A string with translations keyed by BCP-47 language tag.
///
/// Translations keep their insertion order.
///
/// # JSON
/// - A bare string is a single translation in the [undefined language](UNDEFINED_LANGUAGE).
/// - An object maps language tags to translations.
///
/// ```
/// # use rpub::manifest::LocalizedString;
/// let title: LocalizedString = serde_json::from_str(r#"{"fr": "Le Titre", "en": "The Title"}"#).unwrap();
///
/// assert_eq!("Le Titre", title.get("fr"));
/// assert_eq!("The Title", title.get("de"));
/// assert_eq!("The Title", title.to_string());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LocalizedString(Vec<(String, String)>);

impl LocalizedString {
    /// Creates a localized string with a single translation in the undefined language.
    pub fn new(value: impl Into<String>) -> Self {
        Self(vec![(UNDEFINED_LANGUAGE.to_owned(), value.into())])
    }

    /// Creates a localized string from `(language, translation)` pairs.
    ///
    /// Empty language tags are mapped to the [undefined language](UNDEFINED_LANGUAGE).
    pub fn from_translations<L, V>(translations: impl IntoIterator<Item = (L, V)>) -> Self
    where
        L: Into<String>,
        V: Into<String>,
    {
        let mut string = Self::default();
        for (language, value) in translations {
            string.set(language, value);
        }
        string
    }

    /// Adds or replaces the translation for `language`.
    pub fn set(&mut self, language: impl Into<String>, value: impl Into<String>) {
        let mut language = language.into();
        if language.is_empty() {
            UNDEFINED_LANGUAGE.clone_into(&mut language);
        }
        let value = value.into();

        match self.0.iter_mut().find(|(tag, _)| *tag == language) {
            Some((_, existing)) => *existing = value,
            None => self.0.push((language, value)),
        }
    }

    /// Returns the translation for `language`, falling back to the
    /// [undefined language](UNDEFINED_LANGUAGE), then English, then the first translation.
    ///
    /// An empty string is returned if there are no translations.
    pub fn get(&self, language: &str) -> &str {
        let find = |language: &str| {
            self.0
                .iter()
                .find(|(tag, _)| tag == language)
                .map(|(_, value)| value.as_str())
        };

        find(language)
            .or_else(|| find(UNDEFINED_LANGUAGE))
            .or_else(|| find("en"))
            .or_else(|| self.0.first().map(|(_, value)| value.as_str()))
            .unwrap_or_default()
    }

    /// Returns the default translation.
    ///
    /// Equivalent to [`Self::get`] with the undefined language.
    pub fn default_translation(&self) -> &str {
        self.get(UNDEFINED_LANGUAGE)
    }

    /// The `(language, translation)` pairs.
    pub fn translations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(language, value)| (language.as_str(), value.as_str()))
    }

    /// The number of translations.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no translations.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn from_json_field(field: &'static str, value: &Value) -> ManifestResult<Self> {
        match value {
            Value::String(value) => Ok(Self::new(value.as_str())),
            Value::Object(translations) => {
                let mut string = Self::default();
                for (language, value) in translations {
                    let value = value.as_str().ok_or_else(|| {
                        ManifestError::invalid(field, format!("translation `{language}` is not a string"))
                    })?;
                    string.set(language.as_str(), value);
                }
                Ok(string)
            }
            _ => Err(ManifestError::invalid(field, "expected a string or an object")),
        }
    }

    /// Parses the optional localized string found at `object[field]`.
    pub(crate) fn from_json_opt(object: &Map<String, Value>, field: &'static str) -> ManifestResult<Option<Self>> {
        object
            .get(field)
            .filter(|value| !value.is_null())
            .map(|value| Self::from_json_field(field, value))
            .transpose()
    }
}

impl JsonEntity for LocalizedString {
    fn from_json(value: &Value, _: HrefNormalizer) -> ManifestResult<Self> {
        Self::from_json_field("localizedString", value)
    }

    fn to_json(&self) -> Value {
        match self.0.as_slice() {
            [(language, value)] if language == UNDEFINED_LANGUAGE => Value::from(value.as_str()),
            translations => Value::Object(
                translations
                    .iter()
                    .map(|(language, value)| (language.clone(), Value::from(value.as_str())))
                    .collect(),
            ),
        }
    }
}

impl_serde_via_json!(LocalizedString);

impl Display for LocalizedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.default_translation())
    }
}

impl From<&str> for LocalizedString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for LocalizedString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
