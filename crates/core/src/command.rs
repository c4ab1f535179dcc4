use std::borrow::Cow;

use serde::{Serialize, Serializer};

use escpos_emu_audit::hex_dump;

/// Mnemonic used for commands the decoder could not classify.
pub const MALFORMED: &str = "MALFORMED";

// Raw byte fields serialize as the same space-separated lowercase hex used
// in the audit trail, so JSON dumps and log lines read identically.
fn serialize_hex<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex_dump(bytes))
}

/// The decoded result of one recognised ESC/POS instruction, one run of
/// text, or one malformed byte sequence.
#[derive(Debug, Clone, Serialize)]
pub struct Command {
    /// Wall-clock moment the command finished decoding
    /// (ISO-8601, millisecond precision).
    pub timestamp: String,
    /// Short canonical form, e.g. `"ESC @"`, `"GS I"`, `"LF"`, `"TEXT"`,
    /// or [`MALFORMED`].
    pub mnemonic: Cow<'static, str>,
    /// Human-readable description in the emulator's UI language. Empty for
    /// `TEXT` commands.
    pub display_name: Cow<'static, str>,
    /// The raw parameter bytes that followed the opcode (possibly empty).
    #[serde(serialize_with = "serialize_hex")]
    pub params: Vec<u8>,
    /// Decoded string form; present only for `TEXT` commands.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// The exact byte sequence that made up this command, opcode included.
    #[serde(serialize_with = "serialize_hex")]
    pub raw: Vec<u8>,
}

impl Command {
    /// Whether this record marks a failed decode attempt rather than a
    /// recognised command. Malformed commands never produce responses.
    pub fn is_malformed(&self) -> bool {
        self.mnemonic == MALFORMED
    }
}

/// One byte string to deliver on the notify channel, with the description
/// that goes into the `RSP` audit line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    /// The reply payload.
    #[serde(serialize_with = "serialize_hex")]
    pub bytes: Vec<u8>,
    /// What the reply means.
    pub description: Cow<'static, str>,
}

impl Response {
    /// Build a response from its payload and description.
    pub fn new(bytes: Vec<u8>, description: impl Into<Cow<'static, str>>) -> Self {
        Response {
            bytes,
            description: description.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(mnemonic: &'static str) -> Command {
        Command {
            timestamp: "2026-01-01T00:00:00.000".into(),
            mnemonic: Cow::Borrowed(mnemonic),
            display_name: Cow::Borrowed(""),
            params: vec![0x01],
            text: None,
            raw: vec![0x1B, 0x61, 0x01],
        }
    }

    #[test]
    fn malformed_flag_follows_mnemonic() {
        assert!(cmd(MALFORMED).is_malformed());
        assert!(!cmd("ESC a").is_malformed());
    }

    #[test]
    fn byte_fields_serialize_as_hex() {
        let json = serde_json::to_value(cmd("ESC a")).expect("serialize");
        assert_eq!(json["raw"], "1b 61 01");
        assert_eq!(json["params"], "01");
        assert!(json.get("text").is_none());
    }
}
