use std::string::{FromUtf8Error, FromUtf16Error};
use thiserror::Error;

/// Failure to decode bytes into text.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum UtfError {
    /// UTF-16 data must contain an even amount of bytes.
    #[error("UTF-16 data needs to contain an even amount of bytes")]
    UnevenByteCount,
    /// The data is not valid UTF-8.
    #[error(transparent)]
    InvalidUtf8(FromUtf8Error),
    /// The data is not valid UTF-16.
    #[error(transparent)]
    InvalidUtf16(FromUtf16Error),
    /// The declared charset cannot be decoded.
    #[error("Unsupported charset `{0}`")]
    UnsupportedCharset(String),
}

#[derive(Copy, Clone)]
enum Endian {
    Little,
    Big,
}

/// Decodes `data` according to a declared `charset` (such as a media type's `charset`).
///
/// A UTF-16 byte order mark takes precedence over the declared charset.
/// Without a charset, UTF-8 is assumed.
pub(crate) fn decode(data: Vec<u8>, charset: Option<&str>) -> Result<String, UtfError> {
    if is_utf16(&data) {
        return from_utf16(&data);
    }
    let charset = charset.map(str::to_ascii_uppercase);

    match charset.as_deref() {
        None | Some("UTF-8" | "UTF8" | "US-ASCII" | "ASCII") => into_utf8_str(data),
        Some("UTF-16LE") => from_utf16_with(&data, Endian::Little),
        Some("UTF-16BE" | "UTF-16") => from_utf16_with(&data, Endian::Big),
        Some("ISO-8859-1" | "LATIN1" | "ISO_8859-1") => Ok(data.iter().map(|&b| char::from(b)).collect()),
        Some(other) => Err(UtfError::UnsupportedCharset(other.to_owned())),
    }
}

// Support for UTF-16 by converting it to UTF-8
pub(crate) fn into_utf8(data: Vec<u8>) -> Result<Vec<u8>, UtfError> {
    if is_utf16(&data) {
        from_utf16(&data).map(String::into_bytes)
    } else {
        Ok(strip_utf8_bom(data))
    }
}

pub(crate) fn into_utf8_str(data: Vec<u8>) -> Result<String, UtfError> {
    if is_utf16(&data) {
        from_utf16(&data)
    } else {
        String::from_utf8(strip_utf8_bom(data)).map_err(UtfError::InvalidUtf8)
    }
}

fn strip_utf8_bom(mut data: Vec<u8>) -> Vec<u8> {
    if data.starts_with(b"\xEF\xBB\xBF") {
        data.drain(..3);
    }
    data
}

/// Checks if a UTF-16 byte order mark (BOM) exists
fn is_utf16(data: &[u8]) -> bool {
    data.starts_with(b"\xFF\xFE") || data.starts_with(b"\xFE\xFF")
}

fn from_utf16(data: &[u8]) -> Result<String, UtfError> {
    // Determine byte order for little endian (le) and big endian (be)
    let endian = if data.starts_with(b"\xFF") {
        Endian::Little
    } else {
        Endian::Big
    };
    from_utf16_with(&data[2..], endian)
}

fn from_utf16_with(data: &[u8], endian: Endian) -> Result<String, UtfError> {
    let endian = match endian {
        Endian::Little => u16::from_le_bytes,
        Endian::Big => u16::from_be_bytes,
    };

    let utf16 = data
        .chunks(2)
        .map(|chunk| chunk.try_into().map(endian))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| UtfError::UnevenByteCount)?;

    String::from_utf16(utf16.as_ref()).map_err(UtfError::InvalidUtf16)
}

#[cfg(test)]
mod tests {
    const UTF_8: &str = "UTF-8";
    const UTF_16_LE: &[u8] = b"\xFF\xFE\x55\x00\x54\x00\x46\x00\x2D\x00\x38\x00";
    const UTF_16_BE: &[u8] = b"\xFE\xFF\x00\x55\x00\x54\x00\x46\x00\x2D\x00\x38";
    const UTF_16_LE_NO_BOM: &[u8] = b"\x55\x00\x54\x00\x46\x00\x2D\x00\x38\x00";
    // Malformed; has a BOM although, does not have an even number of bytes
    const UTF_16_MALFORMED: &[u8] = b"\xFF\xFE\x55";

    #[test]
    fn test_is_utf16() {
        assert!(super::is_utf16(UTF_16_LE));
        assert!(super::is_utf16(UTF_16_BE));
        assert!(super::is_utf16(UTF_16_MALFORMED));
        assert!(!super::is_utf16(UTF_16_LE_NO_BOM));
        assert!(!super::is_utf16(UTF_8.as_ref()));
        assert!(!super::is_utf16(b""));
    }

    #[test]
    fn test_into_utf8() {
        let utf8_bytes = UTF_8.as_bytes();

        assert_eq!(utf8_bytes, super::into_utf8(utf8_bytes.to_vec()).unwrap());
        assert_eq!(utf8_bytes, super::into_utf8(UTF_16_LE.to_vec()).unwrap());
        assert_eq!(utf8_bytes, super::into_utf8(UTF_16_BE.to_vec()).unwrap());
        assert_eq!(utf8_bytes, super::into_utf8(b"\xEF\xBB\xBFUTF-8".to_vec()).unwrap());
        assert!(super::into_utf8(UTF_16_MALFORMED.to_vec()).is_err());
    }

    #[test]
    fn test_decode_with_charset() {
        #[rustfmt::skip]
        let expected: [(&[u8], Option<&str>); 6] = [
            (UTF_8.as_bytes(), None),
            (UTF_8.as_bytes(), Some("utf-8")),
            (UTF_16_LE, Some("ISO-8859-1")),
            (UTF_16_BE, None),
            (UTF_16_LE_NO_BOM, Some("UTF-16LE")),
            (b"UTF-8", Some("us-ascii")),
        ];

        for (data, charset) in expected {
            assert_eq!(UTF_8, super::decode(data.to_vec(), charset).unwrap());
        }
    }

    #[test]
    fn test_decode_latin1_and_unsupported() {
        assert_eq!("caf\u{e9}", super::decode(b"caf\xE9".to_vec(), Some("iso-8859-1")).unwrap());
        assert!(matches!(
            super::decode(b"abc".to_vec(), Some("Shift_JIS")),
            Err(super::UtfError::UnsupportedCharset(_)),
        ));
        assert!(super::decode(b"\xC3".to_vec(), None).is_err());
    }
}
