//! Error types for MIDI import.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from reading a Standard MIDI File or turning it into a sequence.
#[derive(Debug, Error)]
pub enum MidiError {
    /// Failed to read the file
    #[error("failed to read MIDI file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The bytes are not a valid Standard MIDI File
    #[error("failed to parse MIDI file: {0}")]
    Parse(#[from] midly::Error),

    /// SMPTE timecode or a zero tick division
    #[error("unsupported MIDI timing: only a non-zero ticks-per-quarter division is supported")]
    UnsupportedTiming,

    /// A MIDI channel outside 0-15
    #[error("MIDI channel {0} out of range (0-15)")]
    InvalidChannel(u8),

    /// The sequence log rejected an entry
    #[error("sequence error: {0}")]
    Sequence(#[from] ongen_core::Error),
}

impl MidiError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MidiError::ReadFile {
            path: path.into(),
            source,
        }
    }
}

/// Convenience result type for MIDI import.
pub type Result<T> = std::result::Result<T, MidiError>;
