//! Font deobfuscation.
//!
//! EPUB allows embedded fonts to be obfuscated by XOR-ing their first bytes with a key
//! derived from the publication identifier.
//! See <https://www.w3.org/TR/epub/#sec-font-obfuscation>.

use crate::epub::consts::{ADOBE_OBFUSCATION, IDPF_OBFUSCATION};
use crate::fetcher::{BoxedResource, Resource, ResourceError, ResourceResult, ResourceTransformer};
use crate::manifest::{Link, Manifest};
use sha1::{Digest, Sha1};
use std::collections::HashMap;
use std::path::Path;

/// Obfuscated byte count of the IDPF algorithm.
const IDPF_LENGTH: u64 = 1040;
/// Obfuscated byte count of the Adobe algorithm.
const ADOBE_LENGTH: u64 = 1024;

/// The obfuscation algorithms of a publication, applied as a [`ResourceTransformer`].
#[derive(Clone, Debug)]
pub struct Deobfuscator {
    identifier: Option<String>,
    /// Obfuscation algorithm keyed by href.
    algorithms: HashMap<String, String>,
}

impl Deobfuscator {
    /// Collects the obfuscated resources declared by `manifest`.
    pub fn new(manifest: &Manifest) -> Self {
        let mut algorithms = HashMap::new();
        let links = manifest
            .reading_order
            .iter()
            .chain(&manifest.resources)
            .chain(&manifest.links);

        for link in links {
            collect_algorithms(link, &mut algorithms);
        }
        Self {
            identifier: manifest.metadata.identifier.clone(),
            algorithms,
        }
    }

    fn key(&self, algorithm: &str) -> Option<(Vec<u8>, u64)> {
        let identifier = self.identifier.as_deref()?;

        match algorithm {
            IDPF_OBFUSCATION => Some((idpf_key(identifier), IDPF_LENGTH)),
            ADOBE_OBFUSCATION => adobe_key(identifier).map(|key| (key, ADOBE_LENGTH)),
            _ => {
                log::warn!("Unsupported obfuscation algorithm `{algorithm}`");
                None
            }
        }
    }
}

fn collect_algorithms(link: &Link, algorithms: &mut HashMap<String, String>) {
    if let Some(encryption) = link.properties.encrypted() {
        if encryption.scheme.is_none() {
            algorithms.insert(link.href.clone(), encryption.algorithm);
        }
    }
    for child in link.alternates.iter().chain(&link.children) {
        collect_algorithms(child, algorithms);
    }
}

impl ResourceTransformer for Deobfuscator {
    fn transform(&self, resource: BoxedResource) -> BoxedResource {
        let key = self
            .algorithms
            .get(&resource.link().href)
            .and_then(|algorithm| self.key(algorithm));

        match key {
            Some((key, length)) if !key.is_empty() => Box::new(DeobfuscatingResource {
                resource,
                key,
                length,
            }),
            _ => resource,
        }
    }
}

/// The IDPF key: the SHA-1 digest of the identifier stripped of whitespace.
fn idpf_key(identifier: &str) -> Vec<u8> {
    let identifier = identifier
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>();
    Sha1::digest(identifier.as_bytes()).to_vec()
}

/// The Adobe key: the bytes of the identifier's UUID.
fn adobe_key(identifier: &str) -> Option<Vec<u8>> {
    let uuid = identifier
        .trim()
        .trim_start_matches("urn:uuid:")
        .replace('-', "");

    if uuid.len() % 2 != 0 {
        log::warn!("Invalid Adobe obfuscation identifier `{identifier}`");
        return None;
    }
    (0..uuid.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(uuid.get(i..i + 2)?, 16).ok())
        .collect::<Option<Vec<_>>>()
        .or_else(|| {
            log::warn!("Invalid Adobe obfuscation identifier `{identifier}`");
            None
        })
}

/// XORs the first `length` bytes of `resource` with `key`.
///
/// Reads are ranged, so any slice deobfuscates to the same bytes as the full resource.
struct DeobfuscatingResource {
    resource: BoxedResource,
    key: Vec<u8>,
    length: u64,
}

impl DeobfuscatingResource {
    fn deobfuscate(&self, data: &mut [u8], offset: u64) {
        if offset >= self.length {
            return;
        }
        let end = (self.length - offset).min(data.len() as u64) as usize;

        for (i, byte) in data[..end].iter_mut().enumerate() {
            let position = offset as usize + i;
            *byte ^= self.key[position % self.key.len()];
        }
    }
}

impl Resource for DeobfuscatingResource {
    fn link(&self) -> &Link {
        self.resource.link()
    }

    fn file(&self) -> Option<&Path> {
        self.resource.file()
    }

    fn length(&self) -> ResourceResult<u64> {
        self.resource.length()
    }

    fn read(&self, start: i64, end: i64) -> ResourceResult<Vec<u8>> {
        if end < start {
            return Err(ResourceError::range_not_satisfiable(format!(
                "{start}..={end}: end of range smaller than start"
            )));
        }
        let mut data = self.resource.read(start, end)?;
        let offset = if start == 0 && end == 0 { 0 } else { start.max(0) as u64 };

        self.deobfuscate(&mut data, offset);
        Ok(data)
    }

    fn close(&self) {
        self.resource.close();
    }
}

#[cfg(test)]
mod tests {
    use super::{Deobfuscator, adobe_key, idpf_key};
    use crate::epub::consts::{ADOBE_OBFUSCATION, IDPF_OBFUSCATION};
    use crate::fetcher::{BoxedResource, BytesResource, Resource, ResourceTransformer};
    use crate::manifest::{Encryption, Link, Manifest, Metadata};

    const IDENTIFIER: &str = "urn:uuid:36d5078e-ff7d-468e-a5f3-f47c14b91f2f";

    fn font() -> Vec<u8> {
        (0..3000u32).map(|i| (i * 7 % 251) as u8).collect()
    }

    fn obfuscate(data: &[u8], key: &[u8], length: usize) -> Vec<u8> {
        data.iter()
            .enumerate()
            .map(|(i, byte)| if i < length { byte ^ key[i % key.len()] } else { *byte })
            .collect()
    }

    fn manifest(algorithm: &str) -> Manifest {
        let mut font = Link::new("/fonts/font.otf");
        font.properties.insert(
            "encrypted",
            serde_json::to_value(Encryption::new(algorithm)).unwrap(),
        );
        Manifest {
            metadata: Metadata {
                identifier: Some(IDENTIFIER.to_owned()),
                ..Metadata::new("Title")
            },
            resources: vec![font],
            ..Manifest::default()
        }
    }

    fn resource(href: &str, data: Vec<u8>) -> BoxedResource {
        Box::new(BytesResource::new(Link::new(href), move || Ok(data.clone())))
    }

    #[test]
    fn test_idpf_deobfuscation() {
        let cleartext = font();
        let obfuscated = obfuscate(&cleartext, &idpf_key(IDENTIFIER), 1040);
        let deobfuscator = Deobfuscator::new(&manifest(IDPF_OBFUSCATION));
        let resource = deobfuscator.transform(resource("/fonts/font.otf", obfuscated.clone()));

        let deobfuscated = resource.read(0, 0).unwrap();
        assert_eq!(cleartext[..1040], deobfuscated[..1040]);
        assert_eq!(obfuscated[1040..], deobfuscated[1040..]);
        assert_eq!(3000, resource.length().unwrap());
    }

    #[test]
    fn test_ranged_reads() {
        let cleartext = font();
        let obfuscated = obfuscate(&cleartext, &adobe_key(IDENTIFIER).unwrap(), 1024);
        let deobfuscator = Deobfuscator::new(&manifest(ADOBE_OBFUSCATION));
        let resource = deobfuscator.transform(resource("/fonts/font.otf", obfuscated));

        #[rustfmt::skip]
        let ranges = [(0, 10), (-5, 20), (1000, 1100), (1023, 1024), (2000, 2999), (17, 5000)];

        for (start, end) in ranges {
            let expected_start = start.max(0) as usize;
            let expected_end = (end as usize + 1).min(cleartext.len());
            assert_eq!(
                cleartext[expected_start..expected_end],
                resource.read(start, end).unwrap(),
                "{start}..={end}",
            );
        }
        assert!(resource.read(10, 5).is_err());

        let mut streamed = Vec::new();
        resource.stream(&mut streamed, 0, 0).unwrap();
        assert_eq!(cleartext, streamed);
    }

    #[test]
    fn test_pass_through() {
        let data = font();
        let deobfuscator = Deobfuscator::new(&manifest("http://example.org/unknown"));

        let unknown = deobfuscator.transform(resource("/fonts/font.otf", data.clone()));
        let other = deobfuscator.transform(resource("/fonts/other.otf", data.clone()));

        assert_eq!(data, unknown.read(0, 0).unwrap());
        assert_eq!(data, other.read(0, 0).unwrap());
    }

    #[test]
    fn test_adobe_key() {
        assert_eq!(
            Some(vec![
                0x36, 0xd5, 0x07, 0x8e, 0xff, 0x7d, 0x46, 0x8e,
                0xa5, 0xf3, 0xf4, 0x7c, 0x14, 0xb9, 0x1f, 0x2f,
            ]),
            adobe_key(IDENTIFIER),
        );
        assert_eq!(None, adobe_key("urn:uuid:not-hex"));
    }
}
