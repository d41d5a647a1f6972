//! XML parsing shared by the format parsers and [`Resource::read_as_xml`](crate::fetcher::Resource::read_as_xml).

pub mod xml;

pub use self::xml::{XmlDocument, XmlElement, XmlError, XmlNode};

pub(crate) type ParserResult<T> = Result<T, XmlError>;
