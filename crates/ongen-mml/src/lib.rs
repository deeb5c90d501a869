//! Music macro language (MML) compiler for ongen.
//!
//! Compiles one voice of MML text into a [`SequenceLog`] of timestamped
//! key-on/key-off commands that an [`Engine`] channel can play.
//!
//! ```text
//! o4 l8 v12 cde f+4. r8 < c2 >
//! ```
//!
//! ## Statements
//!
//! | statement | meaning |
//! |---|---|
//! | `c d e f g a b` | note, optional `+`/`-`, optional length, up to two dots |
//! | `r` | rest, optional length and dots |
//! | `l n` | default length (`4` = quarter note) |
//! | `o n` | octave; note number = semitone + 12 × octave |
//! | `<` `>` | octave up / down |
//! | `q n` | gate time in sixteenths of the note length (0-16) |
//! | `v n` | volume 0-15, scaled to 0-127 |
//! | `k n` | detune, emitted as pitch-bend bits |
//! | `@ n` | timbre (recorded, not emitted) |
//! | `% n`, `s n` | accepted and ignored |
//!
//! Numbers are an optional `-` and one to three digits.
//!
//! Two-phase design: parse → [`Spanned`] statements, then compile → log.
//!
//! [`Engine`]: ongen_core::Engine

pub mod compile;
pub mod error;
pub mod parse;

pub use compile::Compiler;
pub use error::MmlError;
pub use parse::{Spanned, Statement, parse};

use ongen_core::SequenceLog;

/// Compile `mml` with `whole_note_ticks` per whole note, starting at
/// `origin_tick`. Returns the log and the tick just past its last note.
///
/// # Example
///
/// ```rust
/// let (log, end) = ongen_mml::compile("l4 cdef", 1600, 0).unwrap();
/// assert_eq!(log.len(), 8);
/// assert_eq!(end, 1600);
/// ```
pub fn compile(
    mml: &str,
    whole_note_ticks: u64,
    origin_tick: u64,
) -> Result<(SequenceLog, u64), MmlError> {
    Compiler::new(whole_note_ticks).compile(mml, origin_tick)
}
