//! EPUB 3 navigation document.

use crate::epub::consts::{CONTENT_RESERVED_PREFIXES, ns, vocab};
use crate::epub::parser::resolve_href;
use crate::epub::parser::toc::{Navigation, is_empty_entry};
use crate::epub::property::{PrefixMap, prefix_map, resolve_properties};
use crate::manifest::Link;
use crate::parser::XmlElement;

/// Navigation types keyed by their bare name instead of their IRI.
const WELL_KNOWN_TYPES: [&str; 7] = ["toc", "page-list", "landmarks", "lot", "loi", "loa", "lov"];

/// Maps every `<nav>` within `<body>` to each of its `epub:type` values.
pub(super) fn parse(html: &XmlElement, path: &str) -> Navigation {
    let prefixes = prefix_map(&CONTENT_RESERVED_PREFIXES, html.attribute_ns(ns::OPS, "prefix"));
    let mut navigation = Navigation::new();

    let Some(body) = html.child(ns::XHTML, "body") else {
        return navigation;
    };

    for nav in body
        .descendants()
        .into_iter()
        .filter(|element| element.is(ns::XHTML, "nav"))
    {
        let types = nav_types(nav, &prefixes);
        let links = nav
            .child(ns::XHTML, "ol")
            .map(|ol| parse_list(ol, path))
            .unwrap_or_default();

        if types.is_empty() || links.is_empty() {
            continue;
        }
        for r#type in types {
            navigation.insert(r#type, links.clone());
        }
    }
    navigation
}

fn nav_types(nav: &XmlElement, prefixes: &PrefixMap) -> Vec<String> {
    resolve_properties(nav.attribute_ns(ns::OPS, "type"), prefixes, Some(vocab::TYPE))
        .into_iter()
        .map(|r#type| match r#type.strip_prefix(vocab::TYPE) {
            Some(name) if WELL_KNOWN_TYPES.contains(&name) => name.to_owned(),
            _ => r#type,
        })
        .collect()
}

fn parse_list(ol: &XmlElement, path: &str) -> Vec<Link> {
    ol.children(ns::XHTML, "li")
        .filter_map(|li| parse_list_item(li, path))
        .collect()
}

/// An `<li>` holds a label (`<a>` or `<span>`) and an optional nested `<ol>`.
fn parse_list_item(li: &XmlElement, path: &str) -> Option<Link> {
    let label = li.elements().next().filter(|first| !first.is(ns::XHTML, "ol"));
    let href = label
        .filter(|label| label.is(ns::XHTML, "a"))
        .and_then(|a| a.attribute("href"))
        .and_then(|href| resolve_href(href, path))
        .unwrap_or_else(|| "#".to_owned());

    let link = Link {
        title: Some(label.map(XmlElement::collapsed_text).unwrap_or_default()),
        children: li
            .child(ns::XHTML, "ol")
            .map(|ol| parse_list(ol, path))
            .unwrap_or_default(),
        ..Link::new(href)
    };
    (!is_empty_entry(&link)).then_some(link)
}

#[cfg(test)]
mod tests {
    use crate::epub::consts::vocab;
    use crate::parser::XmlDocument;

    const PATH: &str = "/OEBPS/nav/nav.xhtml";

    fn parse(body: &str) -> super::Navigation {
        let html = format!(
            r#"<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops"
                 epub:prefix="custom: http://example.org/custom#"><body>{body}</body></html>"#
        );
        let document = XmlDocument::parse(html.as_bytes()).unwrap();
        super::parse(document.root(), PATH)
    }

    #[test]
    fn test_toc() {
        let navigation = parse(
            r#"<section>
                 <nav epub:type="toc">
                   <h1>Contents</h1>
                   <ol>
                     <li>
                       <span>Part   One</span>
                       <ol>
                         <li><a href="../c1.xhtml">Chapter <em>1</em></a></li>
                         <li><a href="../c2.xhtml"> </a></li>
                       </ol>
                     </li>
                     <li><span>Empty</span></li>
                     <li><a href="../c3.xhtml#end">Chapter 3</a></li>
                   </ol>
                 </nav>
               </section>"#,
        );
        let toc = &navigation["toc"];

        assert_eq!(2, toc.len());
        assert_eq!("#", toc[0].href);
        assert_eq!(Some("Part One"), toc[0].title.as_deref());
        assert_eq!(1, toc[0].children.len());
        assert_eq!("/OEBPS/c1.xhtml", toc[0].children[0].href);
        assert_eq!(Some("Chapter 1"), toc[0].children[0].title.as_deref());
        assert_eq!("/OEBPS/c3.xhtml#end", toc[1].href);
    }

    #[test]
    fn test_types() {
        let navigation = parse(
            r#"<nav epub:type="page-list landmarks">
                 <ol><li><a href="p.xhtml#p1">1</a></li></ol>
               </nav>
               <nav epub:type="custom:extras">
                 <ol><li><a href="extra.xhtml">Extra</a></li></ol>
               </nav>
               <nav epub:type="appendix">
                 <ol><li><a href="appendix.xhtml">Appendix</a></li></ol>
               </nav>
               <nav epub:type="lot"><ol/></nav>
               <nav><ol><li><a href="untyped.xhtml">Untyped</a></li></ol></nav>"#,
        );

        #[rustfmt::skip]
        let expected = [
            "page-list".to_owned(),
            "landmarks".to_owned(),
            "http://example.org/custom#extras".to_owned(),
            format!("{}appendix", vocab::TYPE),
        ];
        for key in &expected {
            assert!(navigation.contains_key(key), "{key}");
        }
        assert_eq!(expected.len(), navigation.len());
        assert_eq!("/OEBPS/nav/p.xhtml#p1", navigation["page-list"][0].href);
    }
}
