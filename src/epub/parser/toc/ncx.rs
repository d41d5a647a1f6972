//! EPUB 2 Navigation Control file (NCX).

use crate::epub::consts::ns;
use crate::epub::parser::resolve_href;
use crate::epub::parser::toc::{Navigation, is_empty_entry};
use crate::manifest::Link;
use crate::parser::XmlElement;
use crate::util::str::StrExt;

/// Maps `<navMap>` to `toc` and `<pageList>` to `page-list`.
pub(super) fn parse(ncx: &XmlElement, path: &str) -> Navigation {
    let mut navigation = Navigation::new();

    if let Some(nav_map) = ncx.child(ns::NCX, "navMap") {
        let toc = parse_nav_points(nav_map, path);
        if !toc.is_empty() {
            navigation.insert("toc".to_owned(), toc);
        }
    }
    if let Some(page_list) = ncx.child(ns::NCX, "pageList") {
        let pages = page_list
            .children(ns::NCX, "pageTarget")
            .filter_map(|target| parse_page_target(target, path))
            .collect::<Vec<_>>();
        if !pages.is_empty() {
            navigation.insert("page-list".to_owned(), pages);
        }
    }
    navigation
}

fn parse_nav_points(parent: &XmlElement, path: &str) -> Vec<Link> {
    parent
        .children(ns::NCX, "navPoint")
        .filter_map(|point| parse_nav_point(point, path))
        .collect()
}

fn parse_nav_point(point: &XmlElement, path: &str) -> Option<Link> {
    let mut link = Link::new(content_href(point, path).unwrap_or_else(|| "#".to_owned()));
    link.title = Some(label(point));
    link.children = parse_nav_points(point, path);

    (!is_empty_entry(&link)).then_some(link)
}

/// A page target requires both a label and a target.
fn parse_page_target(target: &XmlElement, path: &str) -> Option<Link> {
    let href = content_href(target, path)?;
    let title = label(target);

    (!title.is_empty()).then(|| Link {
        title: Some(title),
        ..Link::new(href)
    })
}

fn label(element: &XmlElement) -> String {
    element
        .child_path(ns::NCX, &["navLabel", "text"])
        .map(XmlElement::collapsed_text)
        .unwrap_or_default()
}

fn content_href(element: &XmlElement, path: &str) -> Option<String> {
    element
        .child(ns::NCX, "content")
        .and_then(|content| content.attribute("src"))
        .and_then(|src| src.non_blank())
        .and_then(|src| resolve_href(src, path))
}
