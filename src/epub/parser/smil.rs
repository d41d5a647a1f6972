use crate::epub::clock::parse_clock_value;
use crate::epub::consts::ns;
use crate::epub::errors::{EpubError, EpubResult};
use crate::epub::parser::resolve_href;
use crate::manifest::{GuidedNavigationDocument, GuidedNavigationObject};
use crate::parser::{XmlDocument, XmlElement};
use crate::util::str::StrExt;

/// Converts a media overlay located at `path` into a guided navigation document.
///
/// # Errors
/// - [`EpubError::NoSmilFound`]: The root is not a SMIL 3.0 or 2.0 `<smil>` element.
/// - [`EpubError::NoSmilBody`]: There is no `<body>`.
/// - [`EpubError::EmptySmilBody`]: The body has no `<par>` or `<seq>`.
/// - [`EpubError::MissingAttribute`]: A `<seq>` has no `epub:textref`,
///   or a `<text>` has no `src`.
/// - [`EpubError::MissingElement`]: A `<par>` has no `<text>`.
pub(crate) fn parse_smil(document: &XmlDocument, path: &str) -> EpubResult<GuidedNavigationDocument> {
    let smil = document.root();
    let namespace = [ns::SMIL, ns::SMIL2]
        .into_iter()
        .find(|namespace| smil.is(namespace, "smil"))
        .ok_or(EpubError::NoSmilFound)?;
    let body = smil.child(namespace, "body").ok_or(EpubError::NoSmilBody)?;

    let parser = SmilParser { namespace, path };
    let guided = parser.parse_children(body)?;

    if guided.is_empty() {
        return Err(EpubError::EmptySmilBody);
    }
    Ok(GuidedNavigationDocument {
        links: Vec::new(),
        guided,
    })
}

struct SmilParser<'a> {
    namespace: &'a str,
    path: &'a str,
}

impl SmilParser<'_> {
    fn parse_children(&self, parent: &XmlElement) -> EpubResult<Vec<GuidedNavigationObject>> {
        parent
            .elements()
            .filter(|element| element.namespace() == Some(self.namespace))
            .filter_map(|element| match element.local_name() {
                "seq" => Some(self.parse_seq(element)),
                "par" => Some(self.parse_par(element)),
                _ => None,
            })
            .collect()
    }

    fn parse_seq(&self, seq: &XmlElement) -> EpubResult<GuidedNavigationObject> {
        let text_ref = seq
            .attribute_ns(ns::OPS, "textref")
            .and_then(|textref| textref.non_blank())
            .ok_or_else(|| EpubError::MissingAttribute(format!("`epub:textref` on <seq> in `{}`", self.path)))?;

        Ok(GuidedNavigationObject {
            text_ref: self.resolve(text_ref),
            role: roles(seq),
            children: self.parse_children(seq)?,
            ..GuidedNavigationObject::default()
        })
    }

    fn parse_par(&self, par: &XmlElement) -> EpubResult<GuidedNavigationObject> {
        let text = par
            .child(self.namespace, "text")
            .ok_or_else(|| EpubError::MissingElement(format!("<text> within <par> in `{}`", self.path)))?;
        let text_ref = text
            .attribute("src")
            .and_then(|src| src.non_blank())
            .ok_or_else(|| EpubError::MissingAttribute(format!("`src` on <text> in `{}`", self.path)))?;

        Ok(GuidedNavigationObject {
            text_ref: self.resolve(text_ref),
            audio_ref: par
                .child(self.namespace, "audio")
                .and_then(|audio| self.parse_audio(audio)),
            role: roles(par),
            ..GuidedNavigationObject::default()
        })
    }

    /// The audio source, with a `#t=begin,end` media fragment when clipped.
    fn parse_audio(&self, audio: &XmlElement) -> Option<String> {
        let src = self.resolve(audio.attribute("src")?.non_blank()?)?;
        let begin = self.clock_value(audio, "clipBegin");
        let end = self.clock_value(audio, "clipEnd");

        if begin.is_none() && end.is_none() {
            return Some(src);
        }
        let format = |value: Option<f64>| value.map(|value| value.to_string()).unwrap_or_default();
        Some(format!("{src}#t={},{}", format(begin), format(end)))
    }

    fn clock_value(&self, audio: &XmlElement, name: &str) -> Option<f64> {
        let raw = audio.attribute(name)?;
        let value = parse_clock_value(raw);

        if value.is_none() {
            log::warn!("Ignoring invalid `{name}` clock value `{raw}` in `{}`", self.path);
        }
        value
    }

    fn resolve(&self, href: &str) -> Option<String> {
        resolve_href(href, self.path)
    }
}

fn roles(element: &XmlElement) -> Vec<String> {
    element
        .attribute_ns(ns::OPS, "type")
        .map(|types| types.split_whitespace().map(str::to_owned).collect())
        .unwrap_or_default()
}
