//! Channel command words.
//!
//! A [`Command`] is a 32-bit value with a fixed bit layout shared by every
//! producer (sequence compilers, interactive input) and by both scheduling
//! tiers. The zero word is an empty ring slot.
//!
//! | bits          | meaning                               |
//! |---------------|---------------------------------------|
//! | `0x8000_0000` | enable                                |
//! | `0x4000_0000` | no-key (parameter-only update)        |
//! | `0x0080_0000` | volume present                        |
//! | `0x007f_0000` | volume (0-127)                        |
//! | `0x0000_8000` | pitch bend down                       |
//! | `0x0000_4000` | pitch bend up                         |
//! | `0x0000_3f00` | bend magnitude (0-63)                 |
//! | `0x0000_0080` | key-on                                |
//! | `0x0000_007f` | note number                           |

use core::fmt;

/// Enable bit; a command without it is ignored.
pub const ENABLE: u32 = 0x8000_0000;
/// Parameter-only update: key state is left untouched.
pub const NO_KEY: u32 = 0x4000_0000;
/// Key-on bit; an enabled command without it is a key-off.
pub const KEY_ON: u32 = 0x0000_0080;
/// Note number mask.
pub const NOTE_MASK: u32 = 0x0000_007f;
/// Pitch bend upward.
pub const PITCH_UP: u32 = 0x0000_4000;
/// Pitch bend downward.
pub const PITCH_DOWN: u32 = 0x0000_8000;
/// Either bend direction.
pub const PITCH_MASK: u32 = PITCH_UP | PITCH_DOWN;
/// Bend magnitude mask.
pub const PITCH_PARAM_MASK: u32 = 0x0000_3f00;
/// Volume override present.
pub const VOLUME: u32 = 0x0080_0000;
/// Volume override mask.
pub const VOLUME_MASK: u32 = 0x007f_0000;

/// Largest pitch bend magnitude.
pub const PITCH_BEND_MAX: u8 = 63;

/// Direction and magnitude of a pitch bend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PitchBend {
    /// Bend toward two semitones up, magnitude 0-63.
    Up(u8),
    /// Bend toward two semitones down, magnitude 0-63.
    Down(u8),
}

impl PitchBend {
    /// Magnitude of the bend (0-63).
    pub fn amount(self) -> u8 {
        match self {
            Self::Up(a) | Self::Down(a) => a,
        }
    }

    fn bits(self) -> u32 {
        match self {
            Self::Up(a) => PITCH_UP | (u32::from(a.min(PITCH_BEND_MAX)) << 8),
            Self::Down(a) => PITCH_DOWN | (u32::from(a.min(PITCH_BEND_MAX)) << 8),
        }
    }
}

/// A single channel command word.
///
/// ```rust
/// use ongen_core::{Command, PitchBend};
///
/// let cmd = Command::key_on(60).with_volume(100).with_pitch_bend(PitchBend::Up(32));
/// assert!(cmd.is_enabled() && cmd.is_key_on());
/// assert_eq!(cmd.note(), 60);
/// assert_eq!(cmd.volume(), Some(100));
/// assert_eq!(Command::from_bits(cmd.bits()), cmd);
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Command(u32);

impl Command {
    /// The empty slot value; never applied.
    pub const EMPTY: Self = Self(0);

    /// Wrap raw bits produced by an external sequencer.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bits.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Key-on for `note` (0-127). Note 0 keeps the current pitch.
    pub const fn key_on(note: u8) -> Self {
        Self(ENABLE | KEY_ON | (note as u32 & NOTE_MASK))
    }

    /// Key-off.
    pub const fn key_off() -> Self {
        Self(ENABLE)
    }

    /// Parameter-only update that leaves key state alone.
    pub const fn update() -> Self {
        Self(ENABLE | NO_KEY)
    }

    /// Set the note number.
    pub const fn with_note(self, note: u8) -> Self {
        Self((self.0 & !NOTE_MASK) | (note as u32 & NOTE_MASK))
    }

    /// Attach a per-note volume override (clamped to 127).
    pub fn with_volume(self, volume: u8) -> Self {
        let v = u32::from(volume.min(127));
        Self((self.0 & !VOLUME_MASK) | VOLUME | (v << 16))
    }

    /// Attach a pitch bend.
    pub fn with_pitch_bend(self, bend: PitchBend) -> Self {
        Self((self.0 & !(PITCH_MASK | PITCH_PARAM_MASK)) | bend.bits())
    }

    /// Mark as a parameter-only update.
    pub const fn without_key(self) -> Self {
        Self(self.0 | NO_KEY)
    }

    /// True for the empty slot value.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Enable bit set.
    pub const fn is_enabled(self) -> bool {
        self.0 & ENABLE != 0
    }

    /// Key-on bit set.
    pub const fn is_key_on(self) -> bool {
        self.0 & KEY_ON != 0
    }

    /// No-key bit set.
    pub const fn is_no_key(self) -> bool {
        self.0 & NO_KEY != 0
    }

    /// Note number (0 means "no note change").
    pub const fn note(self) -> u8 {
        (self.0 & NOTE_MASK) as u8
    }

    /// Volume override, if present.
    pub const fn volume(self) -> Option<u8> {
        if self.0 & VOLUME != 0 {
            Some(((self.0 & VOLUME_MASK) >> 16) as u8)
        } else {
            None
        }
    }

    /// Pitch bend, if either direction bit is present.
    ///
    /// When both direction bits are set, up wins.
    pub const fn pitch_bend(self) -> Option<PitchBend> {
        let amount = ((self.0 & PITCH_PARAM_MASK) >> 8) as u8;
        if self.0 & PITCH_UP != 0 {
            Some(PitchBend::Up(amount))
        } else if self.0 & PITCH_DOWN != 0 {
            Some(PitchBend::Down(amount))
        } else {
            None
        }
    }
}

impl From<u32> for Command {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

impl From<Command> for u32 {
    fn from(cmd: Command) -> Self {
        cmd.0
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command({:#010x})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_on_layout() {
        assert_eq!(Command::key_on(60).bits(), 0x8000_00bc);
        assert_eq!(Command::key_off().bits(), ENABLE);
    }

    #[test]
    fn test_note_is_masked() {
        assert_eq!(Command::key_on(200).note(), 200 & 0x7f);
    }

    #[test]
    fn test_volume_roundtrip_and_clamp() {
        let cmd = Command::key_on(1).with_volume(64);
        assert_eq!(cmd.volume(), Some(64));
        assert_eq!(cmd.bits() & VOLUME_MASK, 64 << 16);
        assert_eq!(Command::key_off().with_volume(255).volume(), Some(127));
        assert_eq!(Command::key_off().volume(), None);
    }

    #[test]
    fn test_pitch_bend_bits() {
        let up = Command::key_on(60).with_pitch_bend(PitchBend::Up(63));
        assert_eq!(up.bits() & (PITCH_MASK | PITCH_PARAM_MASK), PITCH_UP | 0x3f00);
        assert_eq!(up.pitch_bend(), Some(PitchBend::Up(63)));

        let down = up.with_pitch_bend(PitchBend::Down(5));
        assert_eq!(down.pitch_bend(), Some(PitchBend::Down(5)));
        assert_eq!(down.bits() & PITCH_UP, 0);
    }

    #[test]
    fn test_pitch_bend_clamped() {
        let cmd = Command::key_off().with_pitch_bend(PitchBend::Up(200));
        assert_eq!(cmd.pitch_bend(), Some(PitchBend::Up(63)));
    }

    #[test]
    fn test_update_sets_no_key() {
        let cmd = Command::update().with_volume(10);
        assert!(cmd.is_enabled());
        assert!(cmd.is_no_key());
        assert!(!cmd.is_key_on());
        assert!(Command::key_on(3).without_key().is_no_key());
    }

    #[test]
    fn test_empty() {
        assert!(Command::EMPTY.is_empty());
        assert!(!Command::EMPTY.is_enabled());
        assert!(!Command::key_off().is_empty());
    }
}
