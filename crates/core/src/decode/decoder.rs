use std::borrow::Cow;
use std::mem;

use escpos_emu_audit::{timestamp_now, AuditLog, Record};
use escpos_emu_tables::{control_char, is_prefix, ParamPolicy, Prefix, GS_PAREN_L, GS_V0};

use super::state::{ParserState, Pending, VarStage};
use super::text::decode_text;
use crate::command::{Command, Response, MALFORMED};
use crate::{describe, respond};

/// Streaming ESC/POS decoder for one client session.
///
/// Create one decoder per session and feed it every transport burst in
/// arrival order. `feed` is total: any byte sequence returns normally, with
/// anomalies surfaced as `MALFORMED` command records. The caller must not
/// invoke `feed` concurrently on the same instance; per-session writes are
/// expected to be serialised by the transport layer.
pub struct Decoder {
    audit: AuditLog,
    state: ParserState,
    /// Bytes consumed since the last emitted command. Drained into a
    /// command's `raw` field on emission.
    carry: Vec<u8>,
    /// Pending run of plain data bytes, flushed to a `TEXT` command when a
    /// control or prefix byte arrives.
    text: Vec<u8>,
    /// Last `GS a n` enable mask (Automatic Status Back).
    asb_mask: u8,
}

impl Decoder {
    /// Create a decoder writing its audit trail to `audit`.
    /// Writes the startup record immediately.
    pub fn new(mut audit: AuditLog) -> Self {
        audit.record(&Record::Startup);
        if let Some(path) = audit.file_path().map(|p| p.to_path_buf()) {
            audit.record(&Record::LogFile { path: &path });
        }
        Decoder {
            audit,
            state: ParserState::Idle,
            carry: Vec::new(),
            text: Vec::new(),
            asb_mask: 0,
        }
    }

    /// Decode one transport burst.
    ///
    /// Returns the commands whose final byte arrived in this burst, in
    /// consumption order, and the responses they triggered. Bytes belonging
    /// to a command still in flight stay buffered; the next call resumes as
    /// though the concatenated input had arrived at once.
    pub fn feed(&mut self, data: &[u8]) -> (Vec<Command>, Vec<Response>) {
        self.audit.record(&Record::Packet { bytes: data });

        let mut commands = Vec::new();
        let mut responses = Vec::new();
        let mut i = 0usize;
        while i < data.len() {
            // Take the state so emission paths can move the pending command
            // out; every arm either finishes (leaving Idle) or stores the
            // continuation back.
            let state = mem::replace(&mut self.state, ParserState::Idle);
            i = match state {
                ParserState::Idle => self.step_idle(data, i, &mut commands, &mut responses),
                ParserState::Prefix(prefix) => {
                    self.step_prefix(prefix, data, i, &mut commands, &mut responses)
                }
                ParserState::GsTwoByte { first } => {
                    self.step_gs_two_byte(first, data, i, &mut commands)
                }
                ParserState::FixedParam { pending, needed } => {
                    self.step_fixed(pending, needed, data, i, &mut commands, &mut responses)
                }
                ParserState::VariableParam { pending, stage } => {
                    self.step_variable(pending, stage, data, i, &mut commands, &mut responses)
                }
            };
        }
        (commands, responses)
    }

    /// Discard carry-over, text accumulator, and parser state. The next
    /// `feed` begins fresh. Used on client disconnect.
    pub fn reset(&mut self) {
        self.state = ParserState::Idle;
        self.carry.clear();
        self.text.clear();
        self.asb_mask = 0;
    }

    /// Bytes consumed but not yet bound to an emitted command: the pending
    /// text run followed by the carry-over of the in-flight command. The
    /// concatenation of all emitted `raw` fields plus these bytes equals the
    /// concatenation of all input bursts.
    pub fn pending_bytes(&self) -> Vec<u8> {
        let mut out = self.text.clone();
        out.extend_from_slice(&self.carry);
        out
    }

    /// Emit the pending text run, if any, as a `TEXT` command.
    ///
    /// The decoder defers trailing text because the next burst may extend
    /// the run; callers that know the stream has ended (capture replay,
    /// session teardown) use this to surface the tail.
    pub fn flush_pending_text(&mut self) -> Option<Command> {
        let mut out = Vec::new();
        self.flush_text(&mut out);
        out.pop()
    }

    /// The last `GS a n` enable mask seen this session.
    pub fn asb_mask(&self) -> u8 {
        self.asb_mask
    }

    /// Whether the audit sink has seen a write failure this session.
    pub fn audit_write_failed(&self) -> bool {
        self.audit.write_failed()
    }

    // ── Idle ────────────────────────────────────────────────────────────

    fn step_idle(
        &mut self,
        data: &[u8],
        i: usize,
        commands: &mut Vec<Command>,
        responses: &mut Vec<Response>,
    ) -> usize {
        let b = data[i];

        if let Some(prefix) = Prefix::from_byte(b) {
            self.flush_text(commands);
            self.carry.push(b);
            self.state = ParserState::Prefix(prefix);
            return i + 1;
        }

        if let Some(def) = control_char(b) {
            self.flush_text(commands);
            self.carry.push(b);
            let pending = Pending::from_def(def, 1);
            self.finish_command(pending, commands, responses);
            return i + 1;
        }

        // Plain data: absorb the whole run in one go.
        let mut j = i + 1;
        while j < data.len() && !is_prefix(data[j]) && control_char(data[j]).is_none() {
            j += 1;
        }
        self.text.extend_from_slice(&data[i..j]);
        j
    }

    // ── Second opcode byte after a prefix ───────────────────────────────

    fn step_prefix(
        &mut self,
        prefix: Prefix,
        data: &[u8],
        i: usize,
        commands: &mut Vec<Command>,
        responses: &mut Vec<Response>,
    ) -> usize {
        let b = data[i];

        // GS v 0 and GS ( L are two-byte opcodes; the policy cannot be
        // chosen until the third byte is visible.
        if prefix == Prefix::Gs && (b == 0x76 || b == 0x28) {
            self.carry.push(b);
            self.state = ParserState::GsTwoByte { first: b };
            return i + 1;
        }

        match prefix.lookup(b) {
            Some(def) => {
                self.carry.push(b);
                let pending = Pending::from_def(def, self.carry.len());
                match def.policy {
                    ParamPolicy::Fixed(0) => {
                        self.finish_command(pending, commands, responses);
                    }
                    ParamPolicy::Fixed(n) => {
                        self.state = ParserState::FixedParam { pending, needed: n };
                    }
                    ParamPolicy::TerminatedByNul => {
                        self.state = ParserState::VariableParam {
                            pending,
                            stage: VarStage::NulTerminated,
                        };
                    }
                    ParamPolicy::EscStarBitImage => {
                        self.state = ParserState::VariableParam {
                            pending,
                            stage: VarStage::BitImageHeader,
                        };
                    }
                    ParamPolicy::GsVCut => {
                        self.state = ParserState::VariableParam {
                            pending,
                            stage: VarStage::CutMode,
                        };
                    }
                    ParamPolicy::GsKBarcode => {
                        self.state = ParserState::VariableParam {
                            pending,
                            stage: VarStage::BarcodeKind,
                        };
                    }
                    ParamPolicy::GsVZeroRaster | ParamPolicy::GsParenL => {
                        unreachable!("two-byte opcodes are resolved via GsTwoByte")
                    }
                }
            }
            None => {
                // Unknown (prefix, byte) pair: both bytes become one
                // MALFORMED record and decoding resumes after it.
                self.carry.push(b);
                let at = self.carry.len();
                self.finish_malformed(unknown_name(prefix), at, commands);
            }
        }
        i + 1
    }

    fn step_gs_two_byte(
        &mut self,
        first: u8,
        data: &[u8],
        i: usize,
        commands: &mut Vec<Command>,
    ) -> usize {
        let b = data[i];

        if first == 0x76 {
            if b == 0x30 {
                self.carry.push(b);
                self.state = ParserState::VariableParam {
                    pending: Pending::from_def(&GS_V0, 3),
                    stage: VarStage::RasterHeader,
                };
                return i + 1;
            }
            // Not GS v 0. The record carries only `1D 76`; the current byte
            // is left unconsumed and reprocessed from Idle.
            let at = self.carry.len();
            self.finish_malformed(Cow::Borrowed("未知 GS v 指令"), at, commands);
            return i;
        }

        // first == 0x28: GS ( L, or the generic GS ( x extension family —
        // all share the pL/pH length-prefix policy.
        self.carry.push(b);
        let pending = if b == 0x4C {
            Pending::from_def(&GS_PAREN_L, 3)
        } else {
            Pending {
                mnemonic: Cow::Owned(paren_mnemonic(b)),
                name: Cow::Borrowed("擴充功能"),
                param_start: 3,
            }
        };
        self.state = ParserState::VariableParam {
            pending,
            stage: VarStage::ParenHeader,
        };
        i + 1
    }

    // ── Fixed-length parameters ─────────────────────────────────────────

    fn step_fixed(
        &mut self,
        pending: Pending,
        needed: usize,
        data: &[u8],
        i: usize,
        commands: &mut Vec<Command>,
        responses: &mut Vec<Response>,
    ) -> usize {
        let have = self.carry.len() - pending.param_start;
        let take = (needed - have).min(data.len() - i);
        self.carry.extend_from_slice(&data[i..i + take]);
        if self.carry.len() - pending.param_start == needed {
            self.finish_command(pending, commands, responses);
        } else {
            self.state = ParserState::FixedParam { pending, needed };
        }
        i + take
    }

    // ── Variable-length parameters ──────────────────────────────────────

    fn step_variable(
        &mut self,
        pending: Pending,
        stage: VarStage,
        data: &[u8],
        i: usize,
        commands: &mut Vec<Command>,
        responses: &mut Vec<Response>,
    ) -> usize {
        match stage {
            VarStage::NulTerminated => match data[i..].iter().position(|&b| b == 0x00) {
                Some(k) => {
                    self.carry.extend_from_slice(&data[i..=i + k]);
                    self.finish_command(pending, commands, responses);
                    i + k + 1
                }
                None => {
                    self.carry.extend_from_slice(&data[i..]);
                    self.state = ParserState::VariableParam {
                        pending,
                        stage: VarStage::NulTerminated,
                    };
                    data.len()
                }
            },

            VarStage::BitImageHeader => {
                let next = self.fill_params(&pending, 3, data, i);
                if self.carry.len() - pending.param_start < 3 {
                    self.state = ParserState::VariableParam {
                        pending,
                        stage: VarStage::BitImageHeader,
                    };
                    return next;
                }
                let p = &self.carry[pending.param_start..];
                let (m, n) = (p[0], p[1] as usize | (p[2] as usize) << 8);
                let len = match m {
                    0 | 1 => n,
                    32 | 33 => n * 3,
                    _ => {
                        // Unknown bit-image mode: the data length cannot be
                        // trusted, so only the header is consumed.
                        let at = pending.param_start;
                        self.finish_malformed(Cow::Borrowed("無效位元映像模式"), at, commands);
                        return next;
                    }
                };
                self.continue_with_data(pending, len, commands, responses);
                next
            }

            VarStage::RasterHeader => {
                let next = self.fill_params(&pending, 5, data, i);
                if self.carry.len() - pending.param_start < 5 {
                    self.state = ParserState::VariableParam {
                        pending,
                        stage: VarStage::RasterHeader,
                    };
                    return next;
                }
                let p = &self.carry[pending.param_start..];
                let x = p[1] as usize | (p[2] as usize) << 8;
                let y = p[3] as usize | (p[4] as usize) << 8;
                self.continue_with_data(pending, x.saturating_mul(y), commands, responses);
                next
            }

            VarStage::ParenHeader => {
                let next = self.fill_params(&pending, 2, data, i);
                if self.carry.len() - pending.param_start < 2 {
                    self.state = ParserState::VariableParam {
                        pending,
                        stage: VarStage::ParenHeader,
                    };
                    return next;
                }
                let p = &self.carry[pending.param_start..];
                let len = p[0] as usize | (p[1] as usize) << 8;
                self.continue_with_data(pending, len, commands, responses);
                next
            }

            VarStage::CutMode => {
                let m = data[i];
                self.carry.push(m);
                match m {
                    0 | 1 | 48 | 49 => self.finish_command(pending, commands, responses),
                    65 | 66 => {
                        self.state = ParserState::VariableParam {
                            pending,
                            stage: VarStage::CutFeed,
                        };
                    }
                    _ => {
                        let at = pending.param_start;
                        self.finish_malformed(Cow::Borrowed("無效切紙模式"), at, commands);
                    }
                }
                i + 1
            }

            VarStage::CutFeed => {
                self.carry.push(data[i]);
                self.finish_command(pending, commands, responses);
                i + 1
            }

            VarStage::BarcodeKind => {
                let m = data[i];
                self.carry.push(m);
                let stage = if m <= 6 {
                    // Format A: data runs to a NUL sentinel.
                    VarStage::NulTerminated
                } else {
                    // Format B: an explicit length byte follows.
                    VarStage::BarcodeLen
                };
                self.state = ParserState::VariableParam { pending, stage };
                i + 1
            }

            VarStage::BarcodeLen => {
                let n = data[i] as usize;
                self.carry.push(data[i]);
                self.continue_with_data(pending, n, commands, responses);
                i + 1
            }

            VarStage::Data { remaining } => {
                let take = remaining.min(data.len() - i);
                self.carry.extend_from_slice(&data[i..i + take]);
                let remaining = remaining - take;
                if remaining == 0 {
                    self.finish_command(pending, commands, responses);
                } else {
                    self.state = ParserState::VariableParam {
                        pending,
                        stage: VarStage::Data { remaining },
                    };
                }
                i + take
            }
        }
    }

    /// Collect parameter bytes up to a total of `total`, returning the new
    /// input position.
    fn fill_params(&mut self, pending: &Pending, total: usize, data: &[u8], i: usize) -> usize {
        let have = self.carry.len() - pending.param_start;
        let take = (total - have).min(data.len() - i);
        self.carry.extend_from_slice(&data[i..i + take]);
        i + take
    }

    /// Enter the payload stage, emitting immediately when the computed
    /// length is zero (e.g. a zero-width raster).
    fn continue_with_data(
        &mut self,
        pending: Pending,
        len: usize,
        commands: &mut Vec<Command>,
        responses: &mut Vec<Response>,
    ) {
        if len == 0 {
            self.finish_command(pending, commands, responses);
        } else {
            self.state = ParserState::VariableParam {
                pending,
                stage: VarStage::Data { remaining: len },
            };
        }
    }

    // ── Emission ────────────────────────────────────────────────────────

    fn flush_text(&mut self, commands: &mut Vec<Command>) {
        if self.text.is_empty() {
            return;
        }
        let raw = mem::take(&mut self.text);
        let text = decode_text(&raw);
        let cmd = Command {
            timestamp: timestamp_now(),
            mnemonic: Cow::Borrowed("TEXT"),
            display_name: Cow::Borrowed(""),
            params: Vec::new(),
            text: Some(text),
            raw,
        };
        self.log_command(&cmd);
        commands.push(cmd);
    }

    fn finish_command(
        &mut self,
        pending: Pending,
        commands: &mut Vec<Command>,
        responses: &mut Vec<Response>,
    ) {
        let raw = mem::take(&mut self.carry);
        let params = raw[pending.param_start..].to_vec();
        let cmd = Command {
            timestamp: timestamp_now(),
            mnemonic: pending.mnemonic,
            display_name: pending.name,
            params,
            text: None,
            raw,
        };
        self.log_command(&cmd);

        if cmd.mnemonic == "GS a" {
            // ASB enable is session state; the real device replies nothing
            // here, so neither do we.
            if let Some(&mask) = cmd.params.first() {
                self.asb_mask = mask;
                self.audit.record(&Record::AsbUpdate { mask });
            }
        } else {
            for resp in respond::responses_for(&cmd) {
                self.audit.record(&Record::Response {
                    description: &resp.description,
                    bytes: &resp.bytes,
                });
                responses.push(resp);
            }
        }
        commands.push(cmd);
    }

    fn finish_malformed(
        &mut self,
        name: Cow<'static, str>,
        param_start: usize,
        commands: &mut Vec<Command>,
    ) {
        let raw = mem::take(&mut self.carry);
        let params = raw[param_start..].to_vec();
        let cmd = Command {
            timestamp: timestamp_now(),
            mnemonic: Cow::Borrowed(MALFORMED),
            display_name: name,
            params,
            text: None,
            raw,
        };
        self.log_command(&cmd);
        commands.push(cmd);
    }

    fn log_command(&mut self, cmd: &Command) {
        let summary = describe::summarize(cmd);
        self.audit.record(&Record::Command {
            mnemonic: &cmd.mnemonic,
            name: &cmd.display_name,
            summary: &summary,
            raw: &cmd.raw,
        });
    }
}

impl std::fmt::Debug for Decoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decoder")
            .field("state", &self.state)
            .field("carry", &self.carry.len())
            .field("text", &self.text.len())
            .field("asb_mask", &self.asb_mask)
            .finish()
    }
}

fn unknown_name(prefix: Prefix) -> Cow<'static, str> {
    Cow::Borrowed(match prefix {
        Prefix::Esc => "未知 ESC 指令",
        Prefix::Gs => "未知 GS 指令",
        Prefix::Dle => "未知 DLE 指令",
        Prefix::Fs => "未知 FS 指令",
    })
}

fn paren_mnemonic(sub: u8) -> String {
    if sub.is_ascii_graphic() {
        format!("GS ( {}", sub as char)
    } else {
        format!("GS ( 0x{sub:02X}")
    }
}
