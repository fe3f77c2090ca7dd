//! Utility functions.

use std::borrow::Cow;

/// Decode source bytes as UTF-8, stripping a leading byte order mark.
///
/// Returns `None` for malformed input. Source pages are UTF-8 only, so
/// there is no fallback encoding.
pub fn decode_utf8(bytes: &[u8]) -> Option<Cow<'_, str>> {
    let (result, malformed) = encoding_rs::UTF_8.decode_with_bom_removal(bytes);
    if malformed { None } else { Some(result) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8() {
        assert_eq!(decode_utf8("宋書".as_bytes()).as_deref(), Some("宋書"));
    }

    #[test]
    fn test_decode_strips_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("卷一".as_bytes());

        assert_eq!(decode_utf8(&bytes).as_deref(), Some("卷一"));
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(decode_utf8(&[0x66, 0xFF, 0xFE]).is_none());
        // GBK-encoded text is not UTF-8
        assert!(decode_utf8(&[0xCB, 0xCE, 0xCA, 0xE9]).is_none());
    }
}
