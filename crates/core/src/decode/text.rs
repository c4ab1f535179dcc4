//! Text run decoding.
//!
//! Printable data between commands is decoded for display by trying, in
//! order: GBK (GB18030 — the dominant encoding for this printer family),
//! strict UTF-8, then Latin-1. The first decode that succeeds without
//! replacement characters wins; Latin-1 maps every byte, so decoding is
//! total. The raw bytes are always preserved alongside the decoded form.

/// Decode a text run for display.
pub(crate) fn decode_text(bytes: &[u8]) -> String {
    let (decoded, _, had_errors) = encoding_rs::GB18030.decode(bytes);
    if !had_errors {
        return decoded.into_owned();
    }
    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_decodes_verbatim() {
        assert_eq!(decode_text(b"Hello"), "Hello");
        assert_eq!(decode_text(b""), "");
    }

    #[test]
    fn gbk_takes_priority() {
        // "你好" in GBK.
        assert_eq!(decode_text(&[0xC4, 0xE3, 0xBA, 0xC3]), "你好");
    }

    #[test]
    fn utf8_fallback_when_gbk_rejects() {
        // UTF-8 "中" is e4 b8 ad: the trailing 0xad is a dangling GB18030
        // lead byte, so the GBK attempt reports errors and UTF-8 wins.
        assert_eq!(decode_text("中".as_bytes()), "中");
    }

    #[test]
    fn latin1_is_total() {
        // 0xFF is invalid as a GB18030 lead and as UTF-8.
        let s = decode_text(&[0xFF, b' ', 0xE9]);
        assert_eq!(s, "ÿ é");
        assert!(!s.contains('\u{FFFD}'));
    }
}
