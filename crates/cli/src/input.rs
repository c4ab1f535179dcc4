//! Capture-file input parsing.
//!
//! Hex captures are whitespace-separated tokens (`1b 40 0a`), with each
//! token an even-length run of hex digits — so both `1b 40` and packed
//! `1b400a` forms parse.

use thiserror::Error;

/// A hex capture file could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    /// A token contained a non-hex character.
    #[error("invalid hex token {token:?} (token #{index})")]
    BadToken {
        /// The offending token.
        token: String,
        /// 0-based token position in the input.
        index: usize,
    },
    /// A token had an odd number of hex digits.
    #[error("odd-length hex token {token:?} (token #{index})")]
    OddLength {
        /// The offending token.
        token: String,
        /// 0-based token position in the input.
        index: usize,
    },
}

/// Parse hex text into bytes.
pub fn parse_hex(text: &str) -> Result<Vec<u8>, InputError> {
    let mut out = Vec::new();
    for (index, token) in text.split_whitespace().enumerate() {
        if !token.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(InputError::BadToken {
                token: token.to_string(),
                index,
            });
        }
        if token.len() % 2 != 0 {
            return Err(InputError::OddLength {
                token: token.to_string(),
                index,
            });
        }
        for pair in token.as_bytes().chunks(2) {
            let hi = hex_value(pair[0]);
            let lo = hex_value(pair[1]);
            out.push((hi << 4) | lo);
        }
    }
    Ok(out)
}

fn hex_value(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        b'A'..=b'F' => b - b'A' + 10,
        _ => unreachable!("token pre-validated as hex"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spaced_tokens() {
        assert_eq!(parse_hex("1b 40 0A"), Ok(vec![0x1B, 0x40, 0x0A]));
    }

    #[test]
    fn packed_tokens_and_newlines() {
        assert_eq!(parse_hex("1b40\n0a"), Ok(vec![0x1B, 0x40, 0x0A]));
        assert_eq!(parse_hex(""), Ok(Vec::new()));
    }

    #[test]
    fn rejects_non_hex() {
        assert!(matches!(
            parse_hex("1b zz"),
            Err(InputError::BadToken { index: 1, .. })
        ));
    }

    #[test]
    fn rejects_odd_length() {
        assert!(matches!(
            parse_hex("1b 400"),
            Err(InputError::OddLength { index: 1, .. })
        ));
    }
}
