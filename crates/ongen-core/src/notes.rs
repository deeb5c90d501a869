//! Note number to frequency tables.

use libm::{exp2f, powf};

/// Lowest octave of the 12-tone table (C1 through B1), in Hz.
pub const TWELVE_TONE: [f32; 12] = [
    32.703196, // C
    34.647829, // C#
    36.708096, // D
    38.890873, // D#
    41.203445, // E
    43.653529, // F
    46.249303, // F#
    48.999429, // G
    51.913087, // G#
    55.0,      // A
    58.270470, // A#
    61.735413, // B
];

/// Number of slots in the custom note table.
pub const CUSTOM_NOTE_SLOTS: usize = 128;

/// Frequency of `note` (0-127) from the 12-tone table.
///
/// `table[note % 12] * 2^(note / 12) * 0.25`. Note 1 is scaled by a further
/// tenth.
///
/// ```rust
/// use ongen_core::notes::standard_frequency;
///
/// assert!((standard_frequency(57) - 220.0).abs() < 0.01);
/// ```
pub fn standard_frequency(note: u8) -> f32 {
    let octave = i32::from(note / 12);
    let base = TWELVE_TONE[usize::from(note % 12)] * powf(2.0, octave as f32) * 0.25;
    if note == 1 { base / 10.0 } else { base }
}

/// Frequency `semitones` away from `freq` in equal temperament.
#[inline]
pub fn transpose(freq: f32, semitones: f32) -> f32 {
    freq * exp2f(semitones / 12.0)
}

/// Which table a channel resolves note numbers against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NoteMapping {
    /// The 12-tone table with octave scaling.
    #[default]
    Standard,
    /// The engine's custom table; unset slots fall back to the standard table.
    Custom,
}

/// 128-slot override table for non-standard tunings or drum maps.
#[derive(Clone, Debug)]
pub struct CustomNoteTable {
    slots: [Option<f32>; CUSTOM_NOTE_SLOTS],
}

impl Default for CustomNoteTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CustomNoteTable {
    /// An empty table.
    pub const fn new() -> Self {
        Self {
            slots: [None; CUSTOM_NOTE_SLOTS],
        }
    }

    /// Unset every slot.
    pub fn clear(&mut self) {
        self.slots = [None; CUSTOM_NOTE_SLOTS];
    }

    /// Set slot `note` to `freq` Hz. Returns `false` if `note` is out of range.
    pub fn set(&mut self, note: usize, freq: f32) -> bool {
        match self.slots.get_mut(note) {
            Some(slot) => {
                *slot = Some(freq);
                true
            }
            None => false,
        }
    }

    /// Frequency stored in slot `note`, if any.
    pub fn get(&self, note: u8) -> Option<f32> {
        self.slots.get(usize::from(note)).copied().flatten()
    }

    /// Resolve `note` under `mapping`.
    pub fn resolve(&self, mapping: NoteMapping, note: u8) -> f32 {
        match mapping {
            NoteMapping::Standard => standard_frequency(note),
            NoteMapping::Custom => self.get(note).unwrap_or_else(|| standard_frequency(note)),
        }
    }
}
