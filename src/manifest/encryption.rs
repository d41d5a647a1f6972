use serde::{Deserialize, Serialize};

/// How a resource is encrypted, under the `encrypted` link property.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Encryption {
    /// The URI of the encryption algorithm, e.g. `http://www.idpf.org/2008/embedding`.
    pub algorithm: String,
    /// The encryption scheme, e.g. `http://readium.org/2014/01/lcp`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    /// The profile of the encryption scheme.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// The compression applied before encryption (`deflate` or `none`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression: Option<String>,
    /// The length of the resource before compression and encryption.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_length: Option<u64>,
}

impl Encryption {
    pub fn new(algorithm: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            ..Self::default()
        }
    }
}
