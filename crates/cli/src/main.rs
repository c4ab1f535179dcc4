//! ESC/POS emulator CLI — replay captured byte streams through the decoder
//! and inspect the command catalogue.

mod input;
mod render;

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use escpos_emu_audit::AuditLog;
use escpos_emu_core::{needs_default_ack, Command, Decoder, Response};
use escpos_emu_tables::{DLE_COMMANDS, ESC_COMMANDS, FS_COMMANDS, GS_COMMANDS, GS_PAREN_L, GS_V0};

use crate::render::{policy_label, print_command, print_response, print_summary};

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "escpos-emu",
    version,
    about = "ESC/POS decoder harness — replay captures, inspect the command catalogue"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Decode a captured ESC/POS byte stream and print the commands and
    /// responses the emulator would produce.
    Decode {
        /// Capture file (raw binary by default). Use "-" for stdin.
        #[arg(value_name = "FILE")]
        file: String,
        /// Treat the input as whitespace-separated hex text.
        #[arg(long)]
        hex: bool,
        /// Split the input into N-byte bursts, as a BLE transport would,
        /// to exercise cross-packet reassembly.
        #[arg(long, value_name = "N")]
        mtu: Option<usize>,
        /// Output mode.
        #[arg(long, value_enum, default_value_t = Output::Pretty)]
        output: Output,
        /// Echo the audit trail to stderr while decoding.
        #[arg(long)]
        audit: bool,
        /// Also write the session audit log under this directory, as the
        /// emulator service does.
        #[arg(long, value_name = "DIR")]
        log_dir: Option<PathBuf>,
    },
    /// List every command in the catalogue.
    Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Output {
    /// Column layout matching the audit trail.
    Pretty,
    /// Machine-readable JSON.
    Json,
}

fn main() {
    env_logger::init();
    if let Err(err) = run(Cli::parse()) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.cmd {
        Cmd::Decode {
            file,
            hex,
            mtu,
            output,
            audit,
            log_dir,
        } => decode(&file, hex, mtu, output, audit, log_dir),
        Cmd::Commands => {
            list_commands();
            Ok(())
        }
    }
}

// ── decode ──────────────────────────────────────────────────────────────

fn decode(
    file: &str,
    hex: bool,
    mtu: Option<usize>,
    output: Output,
    audit: bool,
    log_dir: Option<PathBuf>,
) -> Result<()> {
    let raw = read_input(file)?;
    let bytes = if hex {
        input::parse_hex(&String::from_utf8_lossy(&raw))
            .with_context(|| format!("parsing {file} as hex"))?
    } else {
        raw
    };

    let mut log = AuditLog::disabled();
    if audit {
        log = log.with_writer(Box::new(io::stderr()));
    }
    if let Some(dir) = &log_dir {
        log = log
            .with_log_file(dir)
            .with_context(|| format!("creating audit log under {}", dir.display()))?;
    }

    let mut decoder = Decoder::new(log);
    let mut commands: Vec<Command> = Vec::new();
    let mut responses: Vec<Response> = Vec::new();
    let mut default_acks = 0usize;

    let burst_size = mtu.unwrap_or(bytes.len()).max(1);
    let bursts: Vec<&[u8]> = if bytes.is_empty() {
        vec![&bytes[..]]
    } else {
        bytes.chunks(burst_size).collect()
    };
    for burst in bursts {
        let (c, r) = decoder.feed(burst);
        if needs_default_ack(&c, &r) {
            default_acks += 1;
        }
        commands.extend(c);
        responses.extend(r);
    }

    // The capture has ended; surface a trailing text run.
    if let Some(cmd) = decoder.flush_pending_text() {
        commands.push(cmd);
    }
    let pending = decoder.pending_bytes();

    match output {
        Output::Pretty => {
            for cmd in &commands {
                print_command(cmd);
            }
            for resp in &responses {
                print_response(resp);
            }
            if !pending.is_empty() {
                println!("({} bytes still buffered: incomplete command)", pending.len());
            }
            print_summary(&commands, &responses, default_acks);
        }
        Output::Json => {
            let doc = serde_json::json!({
                "commands": commands,
                "responses": responses,
                "default_acks": default_acks,
                "pending_bytes": pending.len(),
            });
            let mut stdout = io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, &doc).context("writing JSON output")?;
            writeln!(stdout).ok();
        }
    }
    Ok(())
}

fn read_input(file: &str) -> Result<Vec<u8>> {
    if file == "-" {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .context("reading stdin")?;
        Ok(buf)
    } else {
        fs::read(file).with_context(|| format!("reading {file}"))
    }
}

// ── commands ────────────────────────────────────────────────────────────

fn list_commands() {
    let sections: [(&str, &[(u8, escpos_emu_tables::CommandDef)]); 4] = [
        ("ESC (0x1B)", ESC_COMMANDS),
        ("GS (0x1D)", GS_COMMANDS),
        ("DLE (0x10)", DLE_COMMANDS),
        ("FS (0x1C)", FS_COMMANDS),
    ];
    for (title, table) in sections {
        println!("{title}");
        for (code, def) in table {
            println!(
                "  {:<12} 0x{code:02X}  {:<25} {}",
                def.mnemonic,
                def.name,
                policy_label(def.policy)
            );
        }
        if title.starts_with("GS") {
            for def in [&GS_V0, &GS_PAREN_L] {
                println!(
                    "  {:<12} ----  {:<25} {}",
                    def.mnemonic,
                    def.name,
                    policy_label(def.policy)
                );
            }
        }
        println!();
    }
    println!("Controls");
    for (code, def) in escpos_emu_tables::CONTROL_CHARS {
        println!("  {:<12} 0x{code:02X}  {}", def.mnemonic, def.name);
    }
}
