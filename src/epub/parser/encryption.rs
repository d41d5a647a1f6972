use crate::epub::consts::{self, LCP_CONTENT_KEY, LCP_SCHEME, ns};
use crate::epub::errors::EpubError;
use crate::epub::parser::{EpubParser, resolve_href};
use crate::fetcher::ResourceError;
use crate::manifest::Encryption;
use crate::parser::XmlElement;
use crate::util::str::StrExt;
use std::collections::HashMap;

impl EpubParser<'_> {
    /// Parses `META-INF/encryption.xml`, keyed by the absolute href of each encrypted resource.
    ///
    /// The file is optional.
    pub(super) fn parse_encryption(&self) -> HashMap<String, Encryption> {
        match self.read_xml(consts::ENCRYPTION) {
            Ok(document) => parse_encrypted_data(document.root()),
            Err(EpubError::Resource(ResourceError::NotFound { .. })) => HashMap::new(),
            Err(error) => {
                log::warn!("Ignoring unreadable `{}`: {error}", consts::ENCRYPTION);
                HashMap::new()
            }
        }
    }
}

fn parse_encrypted_data(root: &XmlElement) -> HashMap<String, Encryption> {
    root.descendants()
        .into_iter()
        .filter(|element| element.is(ns::ENC, "EncryptedData"))
        .filter_map(|data| {
            let uri = data
                .child_path(ns::ENC, &["CipherData", "CipherReference"])
                .and_then(|reference| reference.attribute("URI"))
                .and_then(|uri| uri.non_blank())?;
            let href = resolve_href(uri, "")?;
            Some((href, encryption(data)))
        })
        .collect()
}

fn encryption(data: &XmlElement) -> Encryption {
    let algorithm = data
        .child(ns::ENC, "EncryptionMethod")
        .and_then(|method| method.attribute("Algorithm"))
        .unwrap_or_default();
    let mut encryption = Encryption::new(algorithm);

    let retrieval = data
        .child_path(ns::SIG, &["KeyInfo", "RetrievalMethod"])
        .or_else(|| {
            // `KeyInfo` within the encryption namespace is a common authoring slip
            data.child(ns::ENC, "KeyInfo")
                .and_then(|info| info.child(ns::SIG, "RetrievalMethod"))
        })
        .and_then(|method| method.attribute("URI"));
    if retrieval == Some(LCP_CONTENT_KEY) {
        encryption.scheme = Some(LCP_SCHEME.to_owned());
    }

    let compression = data
        .child_path(ns::ENC, &["EncryptionProperties", "EncryptionProperty"])
        .and_then(|property| property.child(ns::COMP, "Compression"));
    if let Some(compression) = compression {
        encryption.original_length = compression
            .attribute("OriginalLength")
            .and_then(|length| length.trim().parse().ok());
        encryption.compression = Some(
            match compression.attribute("Method").map(str::trim) {
                Some("8") => "deflate",
                _ => "none",
            }
            .to_owned(),
        );
    }
    encryption
}

#[cfg(test)]
mod tests {
    use crate::epub::consts;
    use crate::epub::parser::tests::MemoryFetcher;
    use crate::epub::{EpubParser, EpubSettings};
    use crate::manifest::Encryption;

    const ENCRYPTION: &str = r#"<encryption xmlns="urn:oasis:names:tc:opendocument:xmlns:container"
        xmlns:enc="http://www.w3.org/2001/04/xmlenc#" xmlns:ds="http://www.w3.org/2000/09/xmldsig#"
        xmlns:comp="http://www.idpf.org/2016/encryption#compression">
      <enc:EncryptedData>
        <enc:EncryptionMethod Algorithm="http://www.w3.org/2001/04/xmlenc#aes256-cbc"/>
        <ds:KeyInfo><ds:RetrievalMethod URI="license.lcpl#/encryption/content_key"
                                        Type="http://readium.org/2014/01/lcp#EncryptedContentKey"/></ds:KeyInfo>
        <enc:CipherData><enc:CipherReference URI="OEBPS/chapter%201.xhtml"/></enc:CipherData>
        <enc:EncryptionProperties>
          <enc:EncryptionProperty>
            <comp:Compression Method="8" OriginalLength="13872"/>
          </enc:EncryptionProperty>
        </enc:EncryptionProperties>
      </enc:EncryptedData>
      <enc:EncryptedData>
        <enc:EncryptionMethod Algorithm="http://www.idpf.org/2008/embedding"/>
        <enc:CipherData><enc:CipherReference URI="OEBPS/fonts/font.otf"/></enc:CipherData>
      </enc:EncryptedData>
      <enc:EncryptedData>
        <enc:EncryptionMethod Algorithm="http://www.idpf.org/2008/embedding"/>
      </enc:EncryptedData>
    </encryption>"#;

    #[test]
    fn test_parse_encryption() {
        let fetcher = MemoryFetcher::default().with(consts::ENCRYPTION, ENCRYPTION);
        let settings = EpubSettings::default();
        let encryption = EpubParser::new(&settings, &fetcher).parse_encryption();

        assert_eq!(2, encryption.len());
        assert_eq!(
            Encryption {
                scheme: Some(consts::LCP_SCHEME.to_owned()),
                compression: Some("deflate".to_owned()),
                original_length: Some(13872),
                ..Encryption::new("http://www.w3.org/2001/04/xmlenc#aes256-cbc")
            },
            encryption["/OEBPS/chapter 1.xhtml"],
        );
        assert_eq!(
            Encryption::new(consts::IDPF_OBFUSCATION),
            encryption["/OEBPS/fonts/font.otf"],
        );
    }

    #[test]
    fn test_missing_encryption() {
        let settings = EpubSettings::default();
        let fetcher = MemoryFetcher::default();

        assert!(EpubParser::new(&settings, &fetcher).parse_encryption().is_empty());
    }
}
