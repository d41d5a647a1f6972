//! Resolution of EPUB property data types (`prefix:reference`) into full IRIs.
//!
//! See <https://www.w3.org/TR/epub/#sec-property-datatype>.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*(\w+):\s*(\S+)").expect("static regex"));

/// Characters escaped within the reference of a property.
const REFERENCE_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Maps a prefix (e.g., `rendition`) to its vocabulary IRI.
pub(crate) type PrefixMap = HashMap<String, String>;

/// Parses a `prefix` attribute, such as `foaf: http://xmlns.com/foaf/spec/ dbp: http://dbpedia.org/ontology/`.
pub(crate) fn parse_prefixes(prefixes: &str) -> PrefixMap {
    PREFIX
        .captures_iter(prefixes)
        .map(|captures| (captures[1].to_owned(), captures[2].to_owned()))
        .collect()
}

/// Combines `reserved` prefixes with `declared` ones, the latter taking precedence.
pub(crate) fn prefix_map(reserved: &[(&str, &str)], declared: Option<&str>) -> PrefixMap {
    let mut map: PrefixMap = reserved
        .iter()
        .map(|(prefix, iri)| ((*prefix).to_owned(), (*iri).to_owned()))
        .collect();
    map.extend(declared.map(parse_prefixes).unwrap_or_default());
    map
}

/// Splits a space-separated list of properties.
pub(crate) fn parse_properties(properties: &str) -> impl Iterator<Item = &str> {
    properties.split_whitespace()
}

/// Resolves `property` into a full IRI.
///
/// - An unprefixed property is appended to `default_vocab`,
///   or kept as-is without a default vocabulary.
/// - A known prefix is replaced by its IRI.
/// - Anything else is returned unchanged.
pub(crate) fn resolve_property(
    property: &str,
    prefixes: &PrefixMap,
    default_vocab: Option<&str>,
) -> String {
    let parts = property
        .splitn(2, ':')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>();

    match parts.as_slice() {
        [reference] => {
            let reference = utf8_percent_encode(reference, REFERENCE_ENCODE_SET);
            format!("{}{reference}", default_vocab.unwrap_or_default())
        }
        [prefix, reference] => match prefixes.get(*prefix) {
            Some(iri) => {
                let separator = if iri.ends_with(['#', '/']) { "" } else { "#" };
                let reference = utf8_percent_encode(reference, REFERENCE_ENCODE_SET);
                format!("{iri}{separator}{reference}")
            }
            None => property.to_owned(),
        },
        _ => property.to_owned(),
    }
}

/// Resolves every property of a space-separated list.
pub(crate) fn resolve_properties(
    properties: Option<&str>,
    prefixes: &PrefixMap,
    default_vocab: Option<&str>,
) -> Vec<String> {
    properties
        .map(|properties| {
            parse_properties(properties)
                .map(|property| resolve_property(property, prefixes, default_vocab))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::consts::{PACKAGE_RESERVED_PREFIXES, vocab};

    #[test]
    fn test_parse_prefixes() {
        let prefixes = parse_prefixes(
            " foaf: http://xmlns.com/foaf/spec/\n dbp: http://dbpedia.org/ontology/",
        );

        assert_eq!(2, prefixes.len());
        assert_eq!("http://xmlns.com/foaf/spec/", prefixes["foaf"]);
        assert_eq!("http://dbpedia.org/ontology/", prefixes["dbp"]);
    }

    #[test]
    fn test_declared_prefix_overrides_reserved() {
        let prefixes = prefix_map(&PACKAGE_RESERVED_PREFIXES, Some("media: http://example.org/media#"));

        assert_eq!("http://example.org/media#", prefixes["media"]);
        assert_eq!(vocab::RENDITION, prefixes["rendition"]);
    }

    #[test]
    fn test_resolve_property() {
        let prefixes = prefix_map(&PACKAGE_RESERVED_PREFIXES, Some("foaf: http://xmlns.com/foaf/spec"));

        #[rustfmt::skip]
        let expected = [
            ("http://idpf.org/epub/vocab/package/meta/#title-type", "title-type", Some(vocab::META)),
            ("http://www.idpf.org/vocab/rendition/#layout", "rendition:layout", Some(vocab::META)),
            ("http://xmlns.com/foaf/spec#name", "foaf:name", Some(vocab::META)),
            ("http://idpf.org/epub/vocab/package/item/#nav", "nav", Some(vocab::ITEM)),
            ("cover", "cover", None),
            ("calibre:series", "calibre:series", None),
            ("unknown:property", "unknown:property", Some(vocab::META)),
        ];

        for (expect, property, default_vocab) in expected {
            assert_eq!(expect, resolve_property(property, &prefixes, default_vocab), "{property}");
        }
    }

    #[test]
    fn test_resolve_properties() {
        let prefixes = prefix_map(&PACKAGE_RESERVED_PREFIXES, None);
        let properties = resolve_properties(Some("  nav\tscripted  "), &prefixes, Some(vocab::ITEM));

        assert_eq!(
            vec![
                "http://idpf.org/epub/vocab/package/item/#nav",
                "http://idpf.org/epub/vocab/package/item/#scripted",
            ],
            properties,
        );
        assert!(resolve_properties(None, &prefixes, Some(vocab::ITEM)).is_empty());
    }
}
