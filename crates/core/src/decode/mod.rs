//! The streaming ESC/POS state machine.
//!
//! Bytes are classified one at a time against the command catalogue; bytes
//! belonging to a partially decoded command are held in the carry-over
//! buffer across `feed` calls, so a command fragmented over any number of
//! transport packets decodes exactly as if it had arrived in one burst.

mod decoder;
mod state;
mod text;

pub use decoder::Decoder;
