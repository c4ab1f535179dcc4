//! Status-query response rules.
//!
//! A pure mapping from one decoded command to the byte strings the client
//! expects on the notify channel. The reply encodings (`0x16`, `0x12`) are
//! the values this printer family returns in practice and are preserved
//! verbatim; they do not follow any published status-bit layout.

use crate::command::{Command, Response};

/// Default one-byte acknowledgement for commands without a scripted reply.
///
/// Caller contract: when [`responses_for`] produced nothing for an entire
/// burst and at least one non-malformed command was decoded, send a single
/// [`DEFAULT_ACK`]. See [`needs_default_ack`].
pub const DEFAULT_ACK: u8 = 0x00;

/// Model identifier returned for `GS I` n=1 and used as the advertised name.
pub const DEVICE_NAME: &str = "BT-B36";
/// Printer type code returned for `GS I` n=2.
pub const PRINTER_TYPE: u8 = 0x02;
/// Firmware version string returned for `GS I` n=3.
pub const FIRMWARE_VERSION: &str = "0.1.3";

// The BLE surface the decoder's callers implement. Not used by the decoder
// itself; exported so the peripheral side and the emulator agree on one set
// of constants.

/// Primary GATT service UUID.
pub const SERVICE_UUID: &str = "0000ff00-0000-1000-8000-00805f9b34fb";
/// Notify characteristic UUID (status bytes travel printer → host).
pub const NOTIFY_CHAR_UUID: &str = "0000ff01-0000-1000-8000-00805f9b34fb";
/// Write characteristic UUID (print data travels host → printer).
pub const WRITE_CHAR_UUID: &str = "0000ff02-0000-1000-8000-00805f9b34fb";

/// Responses a single decoded command elicits, in send order.
///
/// Almost always zero or one. Unlisted parameter values and malformed
/// commands produce nothing — the caller's default ACK covers those.
pub fn responses_for(cmd: &Command) -> Vec<Response> {
    if cmd.is_malformed() {
        return Vec::new();
    }
    let n = cmd.params.first().copied();
    let resp = match (cmd.mnemonic.as_ref(), n) {
        ("DLE EOT", Some(1)) => Response::new(vec![0x16], "在線、無錯誤"),
        ("DLE EOT", Some(2)) => Response::new(vec![0x12], "離線狀態正常"),
        ("DLE EOT", Some(3)) => Response::new(vec![0x12], "無錯誤"),
        ("DLE EOT", Some(4)) => Response::new(vec![0x12], "紙張充足"),
        ("GS I", Some(1)) => Response::new(DEVICE_NAME.as_bytes().to_vec(), "印表機型號"),
        ("GS I", Some(2)) => Response::new(vec![PRINTER_TYPE], "印表機類型"),
        ("GS I", Some(3)) => Response::new(FIRMWARE_VERSION.as_bytes().to_vec(), "韌體版本"),
        ("GS r", Some(1)) => Response::new(vec![0x00], "紙張狀態正常"),
        ("GS r", Some(2)) => Response::new(vec![0x00], "錢箱狀態"),
        ("ESC v", _) => Response::new(vec![0x00], "紙張感測器正常"),
        _ => return Vec::new(),
    };
    vec![resp]
}

/// Whether the caller should send the default ACK for a finished burst:
/// no scripted responses, and at least one well-formed command decoded.
/// Malformed-only bursts get nothing.
pub fn needs_default_ack(commands: &[Command], responses: &[Response]) -> bool {
    responses.is_empty() && commands.iter().any(|c| !c.is_malformed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::MALFORMED;
    use std::borrow::Cow;

    fn cmd(mnemonic: &'static str, params: Vec<u8>) -> Command {
        Command {
            timestamp: String::new(),
            mnemonic: Cow::Borrowed(mnemonic),
            display_name: Cow::Borrowed(""),
            params,
            text: None,
            raw: Vec::new(),
        }
    }

    #[test]
    fn dle_eot_status_bytes() {
        assert_eq!(responses_for(&cmd("DLE EOT", vec![1]))[0].bytes, vec![0x16]);
        for n in [2u8, 3, 4] {
            assert_eq!(responses_for(&cmd("DLE EOT", vec![n]))[0].bytes, vec![0x12]);
        }
        assert!(responses_for(&cmd("DLE EOT", vec![5])).is_empty());
    }

    #[test]
    fn printer_id_replies() {
        assert_eq!(responses_for(&cmd("GS I", vec![1]))[0].bytes, b"BT-B36");
        assert_eq!(responses_for(&cmd("GS I", vec![2]))[0].bytes, vec![0x02]);
        assert_eq!(responses_for(&cmd("GS I", vec![3]))[0].bytes, b"0.1.3");
        assert!(responses_for(&cmd("GS I", vec![4])).is_empty());
    }

    #[test]
    fn sensor_and_drawer_replies() {
        assert_eq!(responses_for(&cmd("GS r", vec![1]))[0].bytes, vec![0x00]);
        assert_eq!(responses_for(&cmd("GS r", vec![2]))[0].bytes, vec![0x00]);
        assert!(responses_for(&cmd("GS r", vec![3])).is_empty());
        assert_eq!(responses_for(&cmd("ESC v", Vec::new()))[0].bytes, vec![0x00]);
    }

    #[test]
    fn asb_and_print_commands_stay_silent() {
        assert!(responses_for(&cmd("GS a", vec![0xFF])).is_empty());
        assert!(responses_for(&cmd("ESC @", Vec::new())).is_empty());
        assert!(responses_for(&cmd("LF", Vec::new())).is_empty());
    }

    #[test]
    fn malformed_never_replies() {
        // Even a MALFORMED record whose params would match a query rule.
        assert!(responses_for(&cmd(MALFORMED, vec![1])).is_empty());
    }

    #[test]
    fn default_ack_rules() {
        let ok = cmd("ESC @", Vec::new());
        let bad = cmd(MALFORMED, Vec::new());
        let rsp = Response::new(vec![0x16], "x");

        assert!(needs_default_ack(&[ok.clone()], &[]));
        assert!(!needs_default_ack(&[ok], &[rsp]));
        assert!(!needs_default_ack(&[bad], &[]));
        assert!(!needs_default_ack(&[], &[]));
    }
}
