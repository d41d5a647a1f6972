use crate::manifest::Link;
use serde::{Deserialize, Serialize};

/// A sequence of resources and media fragments meant to be presented one after the other,
/// e.g. the text and audio clips of an EPUB media overlay.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GuidedNavigationDocument {
    /// Links related to this document, such as `prev` and `next`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
    pub guided: Vec<GuidedNavigationObject>,
}

/// One step of a [`GuidedNavigationDocument`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuidedNavigationObject {
    /// An audio resource or fragment, e.g. `chapter1.mp3#t=0.5,3`.
    #[serde(rename = "audioref", skip_serializing_if = "Option::is_none")]
    pub audio_ref: Option<String>,
    #[serde(rename = "imgref", skip_serializing_if = "Option::is_none")]
    pub img_ref: Option<String>,
    /// A textual resource or fragment, e.g. `chapter1.xhtml#p1`.
    #[serde(rename = "textref", skip_serializing_if = "Option::is_none")]
    pub text_ref: Option<String>,
    /// The textual equivalent of the referenced resources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Structural semantics, e.g. `footnote`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub role: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<GuidedNavigationObject>,
}
