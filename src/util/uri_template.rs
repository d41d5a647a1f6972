//! A lightweight implementation of URI Templates ([RFC 6570](https://tools.ietf.org/html/rfc6570)).
//!
//! Only simple string expansion (`{var}`) and form-style query expansion (`{?var}`)
//! are supported, which covers the templated links used by publication services.

use crate::util::href::Href;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;

static PARAMETER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\??([^}]+)\}").expect("static regex")
});
static EXPANSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{(\??)([^}]+)\}").expect("static regex")
});

/// Marker for literal `+` characters, which would otherwise be read as encoded spaces.
const PLUS_MARKER: &str = "~~+~~";

/// A templated URI, such as `/~readium/guided{?ref}`.
///
/// ```
/// # use rpub::util::uri_template::UriTemplate;
/// # use std::collections::HashMap;
/// let template = UriTemplate::new("/search{?query,lang}");
/// assert_eq!(vec!["query", "lang"], template.parameters());
///
/// let params = HashMap::from([("query".to_owned(), "hello world".to_owned())]);
/// assert_eq!("/search?query=hello%20world&lang=", template.expand(&params));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UriTemplate(String);

impl UriTemplate {
    /// Creates a template from its raw form.
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// The raw template.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The unique variable names, in order of first appearance.
    pub fn parameters(&self) -> Vec<&str> {
        let mut parameters = Vec::new();

        for captures in PARAMETER.captures_iter(&self.0) {
            let Some(names) = captures.get(1) else {
                continue;
            };
            for name in names.as_str().split(',') {
                if !parameters.contains(&name) {
                    parameters.push(name);
                }
            }
        }
        parameters
    }

    /// Expands the template by replacing its variables with `parameters`.
    ///
    /// Missing variables expand to an empty string.
    /// The result is percent-encoded, and literal `+` characters become `%2B`.
    pub fn expand(&self, parameters: &HashMap<String, String>) -> String {
        let parameters = parameters
            .iter()
            .map(|(key, value)| (key.as_str(), value.replace('+', PLUS_MARKER)))
            .collect::<HashMap<_, _>>();

        let expanded = EXPANSION.replace_all(&self.0, |captures: &Captures| {
            let names = captures.get(2).map_or("", |names| names.as_str());

            if captures.get(1).is_some_and(|form| !form.as_str().is_empty()) {
                expand_form_style(names, &parameters)
            } else {
                expand_simple_string(names, &parameters)
            }
        });

        let encoded = Href::new(expanded.as_ref(), "")
            .percent_encoded_string()
            .unwrap_or_else(|_| expanded.into_owned());

        encoded.replace(PLUS_MARKER, "%2B")
    }
}

fn expand_simple_string(names: &str, parameters: &HashMap<&str, String>) -> String {
    names
        .split(',')
        .map(|name| parameters.get(name).map_or("", String::as_str))
        .collect::<Vec<_>>()
        .join(",")
}

fn expand_form_style(names: &str, parameters: &HashMap<&str, String>) -> String {
    let pairs = names
        .split(',')
        .map(|name| format!("{name}={}", parameters.get(name).map_or("", String::as_str)))
        .collect::<Vec<_>>();

    format!("?{}", pairs.join("&"))
}

impl std::fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
