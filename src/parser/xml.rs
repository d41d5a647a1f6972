//! A small namespace-aware XML tree.
//!
//! # Overview
//! Package documents, navigation documents, NCX, SMIL, and `encryption.xml` are all small,
//! so they are read fully into an [`XmlDocument`] and queried by
//! `(namespace, local name)` pairs instead of prefixes, which vary between publications.
//!
//! ```
//! # use rpub::parser::XmlDocument;
//! const OPF: &str = "http://www.idpf.org/2007/opf";
//!
//! let document = XmlDocument::parse(br#"
//!     <opf:package xmlns:opf="http://www.idpf.org/2007/opf" version="3.0">
//!         <opf:metadata>Text &amp; more</opf:metadata>
//!     </opf:package>
//! "#).unwrap();
//!
//! let root = document.root();
//! assert!(root.is(OPF, "package"));
//! assert_eq!(Some("3.0"), root.attribute("version"));
//! assert_eq!("Text & more", root.child(OPF, "metadata").unwrap().text());
//! ```

use crate::parser::ParserResult;
use crate::util::str::StrExt;
use crate::util::utf::{self, UtfError};
use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use std::borrow::Cow;

/// The namespace bound to the reserved `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Possible errors while reading an XML document.
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum XmlError {
    /// The document is not well-formed.
    #[error("[Malformed]: {0}")]
    Malformed(#[from] quick_xml::Error),

    /// The document is not valid UTF-8 or UTF-16.
    #[error("[InvalidEncoding]: {0}")]
    InvalidEncoding(#[from] UtfError),

    /// The document contains no root element.
    #[error("[MissingRoot]: The document contains no root element")]
    MissingRoot,
}

/// A node within an [`XmlElement`].
#[derive(Clone, Debug, PartialEq)]
pub enum XmlNode {
    /// A child element.
    Element(XmlElement),
    /// Unescaped character data (text or CDATA).
    Text(String),
}

/// An attribute with its resolved namespace.
#[derive(Clone, Debug, PartialEq)]
pub struct XmlAttribute {
    namespace: Option<String>,
    prefix: Option<String>,
    local_name: String,
    value: String,
}

impl XmlAttribute {
    /// The resolved namespace, if the attribute is prefixed with a bound prefix.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// The raw prefix, such as `opf` in `opf:role`.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// The name without its prefix.
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// The unescaped value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// An element with its resolved namespace, attributes, and children.
#[derive(Clone, Debug, PartialEq)]
pub struct XmlElement {
    namespace: Option<String>,
    prefix: Option<String>,
    local_name: String,
    attributes: Vec<XmlAttribute>,
    children: Vec<XmlNode>,
}

impl XmlElement {
    /// The resolved namespace; [`None`] when the element is not in any namespace.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// The raw prefix, such as `opf` in `opf:package`.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// The name without its prefix.
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Returns `true` if the element is `local_name` within `namespace`.
    pub fn is(&self, namespace: &str, local_name: &str) -> bool {
        self.local_name == local_name && self.namespace.as_deref() == Some(namespace)
    }

    /// All attributes, excluding namespace declarations.
    pub fn attributes(&self) -> &[XmlAttribute] {
        &self.attributes
    }

    /// The value of the unprefixed attribute `local_name`.
    pub fn attribute(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| attribute.prefix.is_none() && attribute.local_name == local_name)
            .map(XmlAttribute::value)
    }

    /// The value of attribute `local_name` within `namespace`.
    pub fn attribute_ns(&self, namespace: &str, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| {
                attribute.local_name == local_name
                    && attribute.namespace.as_deref() == Some(namespace)
            })
            .map(XmlAttribute::value)
    }

    /// Like [`Self::attribute_ns`], additionally accepting `prefix` when it is not bound
    /// to any namespace (a common mistake for legacy `opf:` attributes).
    pub fn attribute_ns_or_prefixed(
        &self,
        namespace: &str,
        prefix: &str,
        local_name: &str,
    ) -> Option<&str> {
        self.attribute_ns(namespace, local_name).or_else(|| {
            self.attributes
                .iter()
                .find(|attribute| {
                    attribute.local_name == local_name
                        && attribute.namespace.is_none()
                        && attribute.prefix.as_deref() == Some(prefix)
                })
                .map(XmlAttribute::value)
        })
    }

    /// The `xml:lang` attribute.
    pub fn lang(&self) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| {
                attribute.local_name == "lang"
                    && (attribute.namespace.as_deref() == Some(XML_NAMESPACE)
                        || attribute.prefix.as_deref() == Some("xml"))
            })
            .map(XmlAttribute::value)
    }

    /// All child nodes, including text.
    pub fn nodes(&self) -> &[XmlNode] {
        &self.children
    }

    /// Direct child elements.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    /// Direct child elements named `local_name` within `namespace`.
    pub fn children<'a, 'b>(
        &'a self,
        namespace: &'b str,
        local_name: &'b str,
    ) -> impl Iterator<Item = &'a XmlElement> + use<'a, 'b> {
        self.elements()
            .filter(move |element| element.is(namespace, local_name))
    }

    /// The first direct child element named `local_name` within `namespace`.
    pub fn child(&self, namespace: &str, local_name: &str) -> Option<&XmlElement> {
        self.children(namespace, local_name).next()
    }

    /// Follows a path of direct children, all within `namespace`.
    pub fn child_path(&self, namespace: &str, path: &[&str]) -> Option<&XmlElement> {
        path.iter()
            .try_fold(self, |element, name| element.child(namespace, name))
    }

    /// All descendant elements in document order (excluding `self`).
    pub fn descendants(&self) -> Vec<&XmlElement> {
        fn collect<'a>(element: &'a XmlElement, into: &mut Vec<&'a XmlElement>) {
            for child in element.elements() {
                into.push(child);
                collect(child, into);
            }
        }
        let mut descendants = Vec::new();
        collect(self, &mut descendants);
        descendants
    }

    /// The first descendant named `local_name` within `namespace`, in document order.
    pub fn find(&self, namespace: &str, local_name: &str) -> Option<&XmlElement> {
        self.elements().find_map(|child| {
            if child.is(namespace, local_name) {
                Some(child)
            } else {
                child.find(namespace, local_name)
            }
        })
    }

    /// The concatenated text of this element and all its descendants.
    pub fn text(&self) -> String {
        fn collect(element: &XmlElement, into: &mut String) {
            for node in &element.children {
                match node {
                    XmlNode::Text(text) => into.push_str(text),
                    XmlNode::Element(child) => collect(child, into),
                }
            }
        }
        let mut text = String::new();
        collect(self, &mut text);
        text
    }

    /// [`Self::text`] with runs of whitespace collapsed into single spaces.
    pub fn collapsed_text(&self) -> String {
        self.text().collapse_whitespace()
    }
}

/// A parsed XML document.
#[derive(Clone, Debug, PartialEq)]
pub struct XmlDocument {
    root: XmlElement,
}

impl XmlDocument {
    /// Parses `data`, which may be UTF-8 or UTF-16 with a byte order mark.
    ///
    /// # Errors
    /// - [`XmlError::InvalidEncoding`] if the data cannot be decoded.
    /// - [`XmlError::Malformed`] if the data is not well-formed.
    /// - [`XmlError::MissingRoot`] if there is no root element.
    pub fn parse(data: &[u8]) -> ParserResult<Self> {
        let data = utf::into_utf8(data.to_vec())?;
        let mut reader = NsReader::from_reader(data.as_slice());
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root = None;

        loop {
            let (resolved, event) = reader.read_resolved_event()?;
            let namespace = owned_namespace(resolved);

            match event {
                Event::Start(start) => {
                    stack.push(new_element(&reader, namespace, &start)?);
                }
                Event::Empty(start) => {
                    let element = new_element(&reader, namespace, &start)?;
                    attach(&mut stack, &mut root, element);
                }
                Event::End(_) => {
                    if let Some(element) = stack.pop() {
                        attach(&mut stack, &mut root, element);
                    }
                }
                Event::Text(text) => {
                    let raw = String::from_utf8_lossy(&text);
                    push_text(&mut stack, unescape(&raw));
                }
                Event::CData(cdata) => {
                    push_text(&mut stack, String::from_utf8_lossy(&cdata));
                }
                Event::GeneralRef(reference) => {
                    let name = String::from_utf8_lossy(&reference);
                    push_text(&mut stack, resolve_reference(&name));
                }
                Event::Eof => break,
                _ => {}
            }
        }

        root.map(|root| Self { root }).ok_or(XmlError::MissingRoot)
    }

    /// The root element.
    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// Consumes the document, returning the root element.
    pub fn into_root(self) -> XmlElement {
        self.root
    }
}

fn owned_namespace(resolved: ResolveResult) -> Option<String> {
    match resolved {
        ResolveResult::Bound(namespace) => {
            Some(String::from_utf8_lossy(namespace.as_ref()).into_owned())
        }
        _ => None,
    }
}

fn new_element(
    reader: &NsReader<&[u8]>,
    namespace: Option<String>,
    start: &BytesStart,
) -> ParserResult<XmlElement> {
    let name = start.name();
    let mut attributes = Vec::new();

    for attribute in start.attributes() {
        let attribute = attribute.map_err(quick_xml::Error::from)?;
        let key = attribute.key;

        // Namespace declarations are already applied by the reader
        if key.as_ref() == b"xmlns" || key.as_ref().starts_with(b"xmlns:") {
            continue;
        }
        let (resolved, local_name) = reader.resolve_attribute(key);
        let raw = String::from_utf8_lossy(&attribute.value);

        attributes.push(XmlAttribute {
            namespace: owned_namespace(resolved),
            prefix: key
                .prefix()
                .map(|prefix| String::from_utf8_lossy(prefix.as_ref()).into_owned()),
            local_name: String::from_utf8_lossy(local_name.as_ref()).into_owned(),
            value: unescape(&raw).into_owned(),
        });
    }

    Ok(XmlElement {
        namespace,
        prefix: name
            .prefix()
            .map(|prefix| String::from_utf8_lossy(prefix.as_ref()).into_owned()),
        local_name: String::from_utf8_lossy(name.local_name().as_ref()).into_owned(),
        attributes,
        children: Vec::new(),
    })
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => {}
    }
}

fn push_text(stack: &mut [XmlElement], text: Cow<'_, str>) {
    let Some(parent) = stack.last_mut() else {
        return;
    };
    // Merge adjacent text split at entity references
    if let Some(XmlNode::Text(previous)) = parent.children.last_mut() {
        previous.push_str(&text);
    } else {
        parent.children.push(XmlNode::Text(text.into_owned()));
    }
}

fn unescape(raw: &str) -> Cow<'_, str> {
    quick_xml::escape::unescape(raw).unwrap_or(Cow::Borrowed(raw))
}

fn resolve_reference(name: &str) -> Cow<'static, str> {
    if let Some(code) = name.strip_prefix('#') {
        let code = match code.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => code.parse(),
        };
        if let Some(char) = code.ok().and_then(char::from_u32) {
            return Cow::Owned(char.to_string());
        }
    }
    match quick_xml::escape::resolve_predefined_entity(name) {
        Some(resolved) => Cow::Borrowed(resolved),
        None if name == "nbsp" => Cow::Borrowed("\u{a0}"),
        None => Cow::Owned(format!("&{name};")),
    }
}
