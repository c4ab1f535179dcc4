//! ESC/POS emulator core: streaming decoder and response generator.
//!
//! Parses opaque byte bursts from a transport (BLE writes, in the reference
//! deployment) as an ESC/POS command stream, even when individual commands
//! are fragmented across packets, and synthesizes the status bytes a client
//! expects in reply to query commands. The main entry point is
//! [`Decoder::feed`]; [`respond::responses_for`] holds the reply rules.
//!
//! The decoder never errors: malformed input becomes a `MALFORMED` command
//! record and decoding resumes with the next byte.

#![warn(missing_docs)]

/// Decoded command and response data model.
pub mod command;
/// The streaming state machine: per-byte classification, carry-over buffer,
/// text accumulation.
pub mod decode;
/// Human-readable parameter summaries for the audit trail.
pub mod describe;
/// Status-query response rules and the BLE surface constants callers need.
pub mod respond;

pub use command::{Command, Response, MALFORMED};
pub use decode::Decoder;
pub use respond::{needs_default_ack, responses_for, DEFAULT_ACK};
