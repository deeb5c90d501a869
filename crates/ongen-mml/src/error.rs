//! Error types for MML compilation.

use thiserror::Error;

/// Errors from parsing or compiling an MML string.
///
/// Every variant carries the byte position of the offending statement.
#[derive(Debug, Error)]
pub enum MmlError {
    /// A character that starts no statement.
    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar {
        /// Byte position in the input string.
        pos: usize,
        /// The unexpected character.
        ch: char,
    },

    /// A numbered command without its number.
    #[error("'{command}' at position {pos} expects a number")]
    MissingNumber {
        /// Byte position of the command.
        pos: usize,
        /// The command letter.
        command: char,
    },

    /// A number outside the range its command accepts.
    #[error("'{command}{value}' at position {pos}: {reason}")]
    InvalidValue {
        /// Byte position of the command.
        pos: usize,
        /// The command letter.
        command: char,
        /// The rejected value.
        value: i32,
        /// Accepted range.
        reason: &'static str,
    },

    /// Octave and pitch combine to a note number outside 0-127.
    #[error("note number {note} at position {pos} is out of range")]
    NoteOutOfRange {
        /// Byte position of the note.
        pos: usize,
        /// Computed note number.
        note: i32,
    },

    /// The sequence log rejected an entry (usually because it is full).
    #[error("sequence error at position {pos}: {source}")]
    Sequence {
        /// Byte position of the statement being emitted.
        pos: usize,
        /// Underlying engine error.
        #[source]
        source: ongen_core::Error,
    },
}

impl MmlError {
    /// Byte position the error refers to.
    pub fn position(&self) -> usize {
        match self {
            Self::UnexpectedChar { pos, .. }
            | Self::MissingNumber { pos, .. }
            | Self::InvalidValue { pos, .. }
            | Self::NoteOutOfRange { pos, .. }
            | Self::Sequence { pos, .. } => *pos,
        }
    }
}
