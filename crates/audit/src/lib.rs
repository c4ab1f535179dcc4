//! Audit trail for the ESC/POS emulator.
//!
//! Provides [`Record`], the audit record kinds emitted by the decoder
//! (packet received, command decoded, response sent), [`format_record`] to
//! render one record as a timestamped line, and [`AuditLog`], a fan-out sink
//! that duplicates every line to an append-only log file and the console.
//!
//! The sink is deliberately dumb: it accepts byte writes in call order and
//! makes no flushing or lifetime promises beyond that. Write failures never
//! reach the decoder — they are swallowed and reported once per session
//! through the [`log`] facade.

#![warn(missing_docs)]

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

/// Raw hex dumps in `CMD` lines are cut off after this many bytes so a
/// multi-kilobyte raster does not swamp the log.
pub const RAW_DUMP_LIMIT: usize = 32;

// ── Hex helpers ─────────────────────────────────────────────────────────

/// Format bytes as space-separated lowercase hex (`"1b 40"`).
pub fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{b:02x}"));
    }
    out
}

/// Like [`hex_dump`], but truncated to [`RAW_DUMP_LIMIT`] bytes with a
/// trailing `...` marker when the input is longer.
pub fn hex_dump_truncated(bytes: &[u8]) -> String {
    if bytes.len() > RAW_DUMP_LIMIT {
        format!("{}...", hex_dump(&bytes[..RAW_DUMP_LIMIT]))
    } else {
        hex_dump(bytes)
    }
}

/// Current local time formatted for record prefixes
/// (ISO-8601 with millisecond precision).
pub fn timestamp_now() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
}

// ── Records ─────────────────────────────────────────────────────────────

/// One audit record, borrowed from the decoder's working data.
#[derive(Debug, Clone, Copy)]
pub enum Record<'a> {
    /// A raw transport burst arrived (logged before decoding starts).
    Packet {
        /// The full burst payload.
        bytes: &'a [u8],
    },
    /// A command finished decoding.
    Command {
        /// Canonical mnemonic (`"ESC @"`, `"TEXT"`, `"MALFORMED"`, …).
        mnemonic: &'a str,
        /// Display name in the emulator's UI language.
        name: &'a str,
        /// Human-readable parameter summary; may be empty.
        summary: &'a str,
        /// The exact bytes the command consumed, prefix included.
        raw: &'a [u8],
    },
    /// A response byte string was produced for a status query.
    Response {
        /// What the response means.
        description: &'a str,
        /// The bytes queued for the notify channel.
        bytes: &'a [u8],
    },
    /// The ASB enable mask changed (`GS a n`); no reply is sent.
    AsbUpdate {
        /// The new enable mask.
        mask: u8,
    },
    /// Decoder session started.
    Startup,
    /// Where this session's log file lives.
    LogFile {
        /// Path of the append-only log file.
        path: &'a Path,
    },
}

/// Render a record as a single line with the given timestamp prefix.
pub fn format_record(timestamp: &str, record: &Record<'_>) -> String {
    let body = match record {
        Record::Packet { bytes } => {
            format!("PKT  received {} bytes: {}", bytes.len(), hex_dump(bytes))
        }
        Record::Command {
            mnemonic,
            name,
            summary,
            raw,
        } => {
            let raw_hex = hex_dump_truncated(raw);
            if summary.is_empty() {
                format!("CMD  {mnemonic:<12} {name:<25} | {raw_hex}")
            } else {
                format!("CMD  {mnemonic:<12} {name:<25} {summary} | {raw_hex}")
            }
        }
        Record::Response { description, bytes } => {
            format!("RSP  → response {description} | {}", hex_dump(bytes))
        }
        Record::AsbUpdate { mask } => {
            format!("RSP  ASB 設定更新: n=0x{mask:02X}")
        }
        Record::Startup => "--- ESC/POS 解碼器啟動 ---".to_string(),
        Record::LogFile { path } => format!("Log 檔案: {}", path.display()),
    };
    format!("[{timestamp}] {body}")
}

// ── Sink ────────────────────────────────────────────────────────────────

/// Fan-out audit sink: every record line is written, in order, to each
/// registered writer.
///
/// One `AuditLog` belongs to exactly one decoder session. Writers are
/// assumed externally serialised — the decoder is single-threaded per
/// session and holds the log only for the duration of one record write.
pub struct AuditLog {
    writers: Vec<Box<dyn Write + Send>>,
    file_path: Option<PathBuf>,
    write_failed: bool,
}

impl AuditLog {
    /// A sink that drops every record. Useful for tests and for replaying
    /// captures where only the decoded output matters.
    pub fn disabled() -> Self {
        Self::from_writers(Vec::new())
    }

    /// Build a sink over caller-supplied writers.
    pub fn from_writers(writers: Vec<Box<dyn Write + Send>>) -> Self {
        AuditLog {
            writers,
            file_path: None,
            write_failed: false,
        }
    }

    /// Create the standard session sink: an append-only UTF-8 file
    /// `<dir>/escpos_YYYYMMDD_HHMMSS.log` plus the console.
    pub fn create_in(dir: impl AsRef<Path>) -> io::Result<AuditLog> {
        Ok(Self::disabled()
            .with_log_file(dir)?
            .with_writer(Box::new(io::stdout())))
    }

    /// Register an additional writer (builder style).
    pub fn with_writer(mut self, writer: Box<dyn Write + Send>) -> Self {
        self.writers.push(writer);
        self
    }

    /// Open this session's log file under `dir` and register it as a
    /// writer. The directory is created if missing; the file name carries
    /// the session start time at seconds resolution.
    pub fn with_log_file(mut self, dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let name = format!("escpos_{}.log", Local::now().format("%Y%m%d_%H%M%S"));
        let path = dir.join(name);
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        self.writers.push(Box::new(file));
        self.file_path = Some(path);
        Ok(self)
    }

    /// Path of this session's log file, when one was created.
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Append one record to every writer.
    ///
    /// Never fails: a writer error marks the session and is reported once
    /// via `log::warn!`, then writing continues on the remaining writers.
    pub fn record(&mut self, record: &Record<'_>) {
        if self.writers.is_empty() {
            return;
        }
        let line = format_record(&timestamp_now(), record);
        for w in &mut self.writers {
            if writeln!(w, "{line}").is_err() && !self.write_failed {
                self.write_failed = true;
                log::warn!("audit sink write failed; further failures are silent");
            }
        }
    }

    /// Whether any writer has failed during this session.
    pub fn write_failed(&self) -> bool {
        self.write_failed
    }
}

impl std::fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLog")
            .field("writers", &self.writers.len())
            .field("file_path", &self.file_path)
            .field("write_failed", &self.write_failed)
            .finish()
    }
}
