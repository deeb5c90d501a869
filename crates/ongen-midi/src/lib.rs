//! Standard MIDI File import for ongen.
//!
//! Parses an SMF into note events ([`MidiFile`]) and turns one MIDI channel
//! at a time into a [`SequenceLog`] an engine channel can play
//! ([`Importer`]).
//!
//! - Note-on velocity becomes the key-on's per-note volume.
//! - A note-on with velocity 0 is a note-off.
//! - Events of one MIDI channel are merged across tracks.
//! - Two marker meta events whose text is the byte `0x01` delimit a loop,
//!   which becomes the log's loop region.
//! - An optional drum channel folds snares onto note 1 and everything else
//!   onto note 120.
//!
//! # Example
//!
//! ```rust
//! use ongen_midi::{Importer, MidiFile};
//!
//! // One quarter note of middle C, 480 ticks per quarter.
//! let mut bytes = b"MThd\0\0\0\x06\0\0\0\x01\x01\xe0MTrk\0\0\0\x0d".to_vec();
//! bytes.extend_from_slice(&[0x00, 0x90, 60, 100, 0x83, 0x60, 0x80, 60, 0, 0x00, 0xff, 0x2f, 0x00]);
//!
//! let file = MidiFile::parse(&bytes).unwrap();
//! let (log, end) = Importer::new(&file).import(0, 0).unwrap();
//! assert_eq!(log.len(), 2);
//! assert_eq!(log.entries()[0].command.volume(), Some(100));
//! assert_eq!(end, 480 * file.tick_scale());
//! ```
//!
//! [`SequenceLog`]: ongen_core::SequenceLog

pub mod error;
pub mod file;
pub mod import;

#[cfg(test)]
mod testutil;

pub use error::{MidiError, Result};
pub use file::{DEFAULT_TEMPO, MIDI_CHANNELS, MidiFile, MidiLoop, NoteEvent, NoteKind};
pub use import::Importer;
