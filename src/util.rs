//! Reference resolution and small shared helpers.
//!
//! - [`href`]: resolution of publication references against a base.
//! - [`url`]: absolute and relative URLs with a closed set of schemes.
//! - [`uri_template`]: RFC 6570 templates for service links.

pub mod href;
pub mod uri_template;
pub mod url;

pub(crate) mod str;
pub(crate) mod sync;
pub(crate) mod uri;
pub(crate) mod utf;

pub use self::utf::UtfError;
pub use self::sync::SendAndSync;
