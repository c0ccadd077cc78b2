//! Encoding of records into bytes, and the policy for handling characters
//! that don't round-trip through the configured encoding.

use encoding_rs::Encoding;

use crate::error::{Result, WriterError};

/// What to do with a record that is not representable in the configured
/// encoding.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum UnicodeErrorPolicy {
    /// Fail the write with [`crate::error::WriterError::Encoding`].
    Strict,
    /// Drop unrepresentable characters and keep going. Default, matching
    /// Python's `concurrent-log-handler` default of `errors="ignore"` at
    /// the logging layer.
    #[default]
    Ignore,
    /// Substitute the encoding's standard replacement character/sequence.
    Replace,
}

/// Encodes `record` (already-formatted text, without its terminator) to
/// bytes in `encoding`, applying `policy` to unrepresentable characters.
pub(crate) fn encode(record: &str, encoding: &'static Encoding, policy: UnicodeErrorPolicy) -> Result<Vec<u8>> {
    if encoding == encoding_rs::UTF_8 {
        // UTF-8 is always representable; no policy ever applies.
        return Ok(record.as_bytes().to_vec());
    }

    let (cow, _, had_unmappable) = encoding.encode(record);
    match (had_unmappable, policy) {
        (false, _) => Ok(cow.into_owned()),
        (true, UnicodeErrorPolicy::Strict) => Err(WriterError::Encoding),
        (true, UnicodeErrorPolicy::Ignore) => Ok(strip_replacement_bytes(record, encoding)),
        (true, UnicodeErrorPolicy::Replace) => Ok(cow.into_owned()),
    }
}

/// `Encoding::encode` already substitutes numeric character references or
/// `?`-like replacements depending on the target encoding; to implement
/// `Ignore` we instead encode character-by-character and drop anything that
/// doesn't round-trip, since `encoding_rs` has no built-in "drop" mode.
fn strip_replacement_bytes(record: &str, encoding: &'static Encoding) -> Vec<u8> {
    let mut out = Vec::with_capacity(record.len());
    for ch in record.chars() {
        let mut buf = [0u8; 4];
        let s = ch.encode_utf8(&mut buf);
        let (encoded, _, unmappable) = encoding.encode(s);
        if !unmappable {
            out.extend_from_slice(&encoded);
        }
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn utf8_is_always_representable() {
        let bytes = encode("héllo\u{1f600}", encoding_rs::UTF_8, UnicodeErrorPolicy::Strict).unwrap();
        assert_eq!(bytes, "héllo\u{1f600}".as_bytes());
    }

    #[test]
    fn strict_rejects_unmappable_characters() {
        let err = encode("caf\u{e9}\u{1f600}", encoding_rs::WINDOWS_1252, UnicodeErrorPolicy::Strict);
        assert!(matches!(err, Err(WriterError::Encoding)));
    }

    #[test]
    fn ignore_drops_unmappable_characters() {
        let bytes = encode("a\u{1f600}b", encoding_rs::WINDOWS_1252, UnicodeErrorPolicy::Ignore).unwrap();
        assert_eq!(bytes, b"ab");
    }

    #[test]
    fn replace_substitutes_unmappable_characters() {
        let bytes = encode("a\u{1f600}b", encoding_rs::WINDOWS_1252, UnicodeErrorPolicy::Replace).unwrap();
        assert!(bytes.starts_with(b"a"));
        assert!(bytes.ends_with(b"b"));
        assert!(bytes.len() > 2);
    }
}
