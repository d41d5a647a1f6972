//! Accessibility metadata of a publication.
//!
//! Vocabulary values (access modes, features, hazards, profiles) are string-backed so
//! that values outside the well-known sets survive a round trip.

use crate::manifest::json::{self, MapExt};
use crate::manifest::{HrefNormalizer, JsonEntity, ManifestResult, impl_serde_via_json};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

macro_rules! vocabulary {
    {
        $(#[$meta:meta])*
        $name:ident {
            $($constant:ident => $value:literal,)*
        }
    } => {
        $(#[$meta])*
        #[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Cow<'static, str>);

        impl $name {
            $(
            #[doc = concat!("`", $value, "`")]
            pub const $constant: Self = Self(Cow::Borrowed($value));
            )*

            pub fn new(value: impl Into<Cow<'static, str>>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(Cow::Owned(value.to_owned()))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

vocabulary! {
    /// An established accessibility standard a publication conforms to.
    Profile {
        EPUB_A11Y_10_WCAG_20_A => "http://www.idpf.org/epub/a11y/accessibility-20170105.html#wcag-a",
        EPUB_A11Y_10_WCAG_20_AA => "http://www.idpf.org/epub/a11y/accessibility-20170105.html#wcag-aa",
        EPUB_A11Y_10_WCAG_20_AAA => "http://www.idpf.org/epub/a11y/accessibility-20170105.html#wcag-aaa",
    }
}

vocabulary! {
    /// A sensory or cognitive faculty through which content may be perceived.
    AccessMode {
        AUDITORY => "auditory",
        CHART_ON_VISUAL => "chartOnVisual",
        CHEM_ON_VISUAL => "chemOnVisual",
        COLOR_DEPENDENT => "colorDependent",
        DIAGRAM_ON_VISUAL => "diagramOnVisual",
        MATH_ON_VISUAL => "mathOnVisual",
        MUSIC_ON_VISUAL => "musicOnVisual",
        TACTILE => "tactile",
        TEXT_ON_VISUAL => "textOnVisual",
        TEXTUAL => "textual",
        VISUAL => "visual",
    }
}

vocabulary! {
    /// An access mode that can be part of a sufficient set.
    PrimaryAccessMode {
        AUDITORY => "auditory",
        TACTILE => "tactile",
        TEXTUAL => "textual",
        VISUAL => "visual",
    }
}

vocabulary! {
    /// A content feature supporting accessibility.
    Feature {
        ANNOTATIONS => "annotations",
        ARIA => "ARIA",
        BOOKMARKS => "bookmark",
        INDEX => "index",
        PRINT_PAGE_NUMBERS => "printPageNumbers",
        READING_ORDER => "readingOrder",
        STRUCTURAL_NAVIGATION => "structuralNavigation",
        TABLE_OF_CONTENTS => "tableOfContents",
        TAGGED_PDF => "taggedPDF",
        ALTERNATIVE_TEXT => "alternativeText",
        AUDIO_DESCRIPTION => "audioDescription",
        CAPTIONS => "captions",
        DESCRIBED_MATH => "describeMath",
        LONG_DESCRIPTION => "longDescription",
        RUBY_ANNOTATIONS => "rubyAnnotations",
        SIGN_LANGUAGE => "signLanguage",
        TRANSCRIPT => "transcript",
        DISPLAY_TRANSFORMABILITY => "displayTransformability",
        SYNCHRONIZED_AUDIO_TEXT => "synchronizedAudioText",
        TIMING_CONTROL => "timingControl",
        UNLOCKED => "unlocked",
        CHEM_ML => "ChemML",
        LATEX => "latex",
        MATH_ML => "MathML",
        TTS_MARKUP => "ttsMarkup",
        HIGH_CONTRAST_AUDIO => "highContrastAudio",
        HIGH_CONTRAST_DISPLAY => "highContrastDisplay",
        LARGE_PRINT => "largePrint",
        BRAILLE => "braille",
        TACTILE_GRAPHIC => "tactileGraphic",
        TACTILE_OBJECT => "tactileObject",
        NONE => "none",
    }
}

vocabulary! {
    /// A physiologically dangerous characteristic of the content.
    Hazard {
        FLASHING => "flashing",
        NO_FLASHING_HAZARD => "noFlashingHazard",
        MOTION_SIMULATION => "motionSimulation",
        NO_MOTION_SIMULATION_HAZARD => "noMotionSimulationHazard",
        SOUND => "sound",
        NO_SOUND_HAZARD => "noSoundHazard",
        UNKNOWN => "unknown",
        NONE => "none",
    }
}

/// Who certified the accessibility of a publication.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Certification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certified_by: Option<String>,
    /// A credential or badge establishing the certifier's authority.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
    /// A link to the accessibility report.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
}

impl Certification {
    pub fn is_empty(&self) -> bool {
        self.certified_by.is_none() && self.credential.is_none() && self.report.is_none()
    }
}

/// Accessibility metadata.
///
/// ```
/// # use rpub::manifest::a11y::{A11y, AccessMode, PrimaryAccessMode};
/// let a11y: A11y = serde_json::from_str(r#"{
///     "accessMode": ["textual", "visual"],
///     "accessModeSufficient": ["textual", ["auditory", "visual"]]
/// }"#).unwrap();
///
/// assert_eq!(vec![AccessMode::TEXTUAL, AccessMode::VISUAL], a11y.access_modes);
/// assert_eq!(vec![PrimaryAccessMode::TEXTUAL], a11y.access_modes_sufficient[0]);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct A11y {
    pub conforms_to: Vec<Profile>,
    pub certification: Option<Certification>,
    /// A human-readable summary of the accessibility features or deficiencies.
    pub summary: Option<String>,
    pub access_modes: Vec<AccessMode>,
    /// Sets of access modes, any of which is sufficient to understand all the content.
    pub access_modes_sufficient: Vec<Vec<PrimaryAccessMode>>,
    pub features: Vec<Feature>,
    pub hazards: Vec<Hazard>,
}

impl A11y {
    pub fn is_empty(&self) -> bool {
        self.conforms_to.is_empty()
            && self.certification.is_none()
            && self.summary.is_none()
            && self.access_modes.is_empty()
            && self.access_modes_sufficient.is_empty()
            && self.features.is_empty()
            && self.hazards.is_empty()
    }

    /// Merges `other` into `self`.
    ///
    /// List values are appended when missing, while `other`'s certification and summary
    /// replace the current ones when present.
    pub fn merge(&mut self, other: &A11y) {
        fn append_missing<T: Clone + PartialEq>(target: &mut Vec<T>, values: &[T]) {
            for value in values {
                if !target.contains(value) {
                    target.push(value.clone());
                }
            }
        }

        append_missing(&mut self.conforms_to, &other.conforms_to);
        if other.certification.is_some() {
            self.certification.clone_from(&other.certification);
        }
        if other.summary.is_some() {
            self.summary.clone_from(&other.summary);
        }
        append_missing(&mut self.access_modes, &other.access_modes);
        append_missing(&mut self.features, &other.features);
        append_missing(&mut self.hazards, &other.hazards);

        for set in &other.access_modes_sufficient {
            let exists = self.access_modes_sufficient.iter().any(|existing| {
                existing.len() == set.len() && set.iter().all(|mode| existing.contains(mode))
            });
            if !exists {
                self.access_modes_sufficient.push(set.clone());
            }
        }
    }

    fn strings<T: for<'a> From<&'a str>>(values: Vec<String>) -> Vec<T> {
        values.iter().map(|value| T::from(value.as_str())).collect()
    }

    fn to_strings<'a, T: 'a + std::fmt::Display>(values: impl IntoIterator<Item = &'a T>) -> Vec<String> {
        values.into_iter().map(ToString::to_string).collect()
    }
}

impl JsonEntity for A11y {
    fn from_json(value: &Value, _: HrefNormalizer) -> ManifestResult<Self> {
        let Some(object) = value.as_object() else {
            return Ok(Self::default());
        };

        let mut access_modes_sufficient = Vec::new();
        if let Some(Value::Array(sets)) = object.get("accessModeSufficient") {
            for set in sets {
                let set = json::string_set("accessModeSufficient", Some(set))?;
                if !set.is_empty() {
                    access_modes_sufficient.push(Self::strings(set));
                }
            }
        }

        Ok(Self {
            conforms_to: Self::strings(json::string_set("conformsTo", object.get("conformsTo"))?),
            certification: object
                .get("certification")
                .filter(|value| value.is_object())
                .and_then(|value| serde_json::from_value(value.clone()).ok()),
            summary: json::non_empty_string(object.get("summary")),
            access_modes: Self::strings(json::string_set("accessMode", object.get("accessMode"))?),
            access_modes_sufficient,
            features: Self::strings(json::string_set("feature", object.get("feature"))?),
            hazards: Self::strings(json::string_set("hazard", object.get("hazard"))?),
        })
    }

    fn to_json(&self) -> Value {
        let mut object = Map::new();

        object.insert_non_empty("conformsTo", &Self::to_strings(&self.conforms_to));
        object.insert_some(
            "certification",
            self.certification
                .as_ref()
                .and_then(|certification| serde_json::to_value(certification).ok()),
        );
        object.insert_some("summary", self.summary.as_deref());
        object.insert_non_empty("accessMode", &Self::to_strings(&self.access_modes));
        if !self.access_modes_sufficient.is_empty() {
            let sets = self
                .access_modes_sufficient
                .iter()
                .map(|set| json::collapsed_strings(&Self::to_strings(set)))
                .collect();
            object.insert("accessModeSufficient".to_owned(), Value::Array(sets));
        }
        object.insert_non_empty("feature", &Self::to_strings(&self.features));
        object.insert_non_empty("hazard", &Self::to_strings(&self.hazards));
        Value::Object(object)
    }
}

impl_serde_via_json!(A11y);
