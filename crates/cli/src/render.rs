//! Pretty terminal rendering for decoded captures.

use escpos_emu_audit::{hex_dump, hex_dump_truncated};
use escpos_emu_core::{describe, Command, Response};
use escpos_emu_tables::ParamPolicy;

/// Print one decoded command in the audit trail's column layout
/// (mnemonic, display name, parameter summary, raw hex).
pub(crate) fn print_command(cmd: &Command) {
    let summary = describe::summarize(cmd);
    let raw_hex = hex_dump_truncated(&cmd.raw);
    if summary.is_empty() {
        println!("{:<12} {:<25} | {raw_hex}", cmd.mnemonic, cmd.display_name);
    } else {
        println!(
            "{:<12} {:<25} {summary} | {raw_hex}",
            cmd.mnemonic, cmd.display_name
        );
    }
}

/// Print one generated response.
pub(crate) fn print_response(resp: &Response) {
    println!("  → {:<20} | {}", resp.description, hex_dump(&resp.bytes));
}

/// Print the decode summary footer.
pub(crate) fn print_summary(commands: &[Command], responses: &[Response], default_acks: usize) {
    let malformed = commands.iter().filter(|c| c.is_malformed()).count();
    println!(
        "{} commands ({malformed} malformed), {} responses, {default_acks} default ACK",
        commands.len(),
        responses.len(),
    );
}

/// Short label for a parameter-length policy in `commands` listings.
pub(crate) fn policy_label(policy: ParamPolicy) -> String {
    match policy {
        ParamPolicy::Fixed(0) => "no params".to_string(),
        ParamPolicy::Fixed(n) => format!("{n} param bytes"),
        ParamPolicy::TerminatedByNul => "NUL-terminated".to_string(),
        ParamPolicy::EscStarBitImage => "m nL nH + data".to_string(),
        ParamPolicy::GsVZeroRaster => "m xL xH yL yH + raster".to_string(),
        ParamPolicy::GsParenL => "pL pH + payload".to_string(),
        ParamPolicy::GsKBarcode => "barcode data".to_string(),
        ParamPolicy::GsVCut => "cut mode [+ feed]".to_string(),
    }
}
