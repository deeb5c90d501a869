//! Per-channel synthesis state.
//!
//! A [`Channel`] holds everything one output voice needs between samples:
//! envelope, pitch, volumes, generator binding, noise register, its
//! near-term [`CommandRing`], and optionally a bound [`SequenceLog`].
//!
//! Channels are owned by the [`Engine`](crate::Engine); callers mutate them
//! through engine operations and read them through [`Channel`]'s accessors.
//!
//! # Envelope
//!
//! The gain accumulator is a fixed-point value in `[0, GAIN_MAX]` driven by
//! a three-phase state machine stepped once per sample:
//!
//! ```text
//! Attack ──gain reaches GAIN_MAX──▶ Decay ──gain reaches sustain──▶ SustainRelease
//!   │                                 │                                 ▲
//!   └────────────── key off ──────────┴─────────────────────────────────┘
//! ```
//!
//! In `SustainRelease` a held key fades from the sustain level by
//! `fade_rate` per sample; a released key ramps down by `decay_rate` while
//! above sustain and by `release_rate` below it.

use crate::command::{Command, PitchBend};
use crate::error::{Error, Result};
use crate::noise::NoiseRegister;
use crate::notes::{CustomNoteTable, NoteMapping, transpose};
use crate::ring::CommandRing;
use crate::sequence::SequenceLog;
use crate::wavetable::{BASE_GENERATOR_FREQUENCY, GeneratorSource, TABLE_LENGTH, WavetableBank};

/// Full-scale value of the gain accumulator.
pub const GAIN_MAX: i32 = 131_072;

/// Largest note, global, or system volume.
pub const VOLUME_MAX: u8 = 127;

/// Frequency of a freshly reset channel, in Hz.
pub const DEFAULT_FREQUENCY: f32 = 440.0;

/// Gain a held note snaps to when its sustain fade runs out.
const FADE_FLOOR_GAIN: i32 = 4;

/// Key counter value for a released key.
const KEY_OFF: i32 = -1;

const VOLUME_SCALE: i32 = VOLUME_MAX as i32 * VOLUME_MAX as i32;

/// Envelope parameters in gain units per sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Adsr {
    /// Gain added per sample during attack.
    pub attack_rate: i32,
    /// Gain removed per sample during decay (and release above sustain).
    pub decay_rate: i32,
    /// Gain held after decay, `0..=GAIN_MAX`.
    pub sustain_level: i32,
    /// Gain removed per sample after key-off below sustain.
    pub release_rate: i32,
    /// Gain removed per sample while a key is held in sustain.
    pub fade_rate: i32,
}

impl Default for Adsr {
    fn default() -> Self {
        Self {
            attack_rate: GAIN_MAX >> 4,
            decay_rate: 8,
            sustain_level: GAIN_MAX >> 2,
            release_rate: 2,
            fade_rate: 0,
        }
    }
}

impl Adsr {
    /// Check that every rate is non-negative and sustain is within gain range.
    pub fn validate(&self) -> Result<()> {
        let rates = [
            ("attack rate", self.attack_rate),
            ("decay rate", self.decay_rate),
            ("release rate", self.release_rate),
            ("fade rate", self.fade_rate),
        ];
        for (what, rate) in rates {
            if rate < 0 {
                return Err(Error::out_of_range(what, rate));
            }
        }
        if !(0..=GAIN_MAX).contains(&self.sustain_level) {
            return Err(Error::out_of_range("sustain level", self.sustain_level));
        }
        Ok(())
    }
}

/// Phase of the envelope state machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnvelopePhase {
    /// Gain rising toward `GAIN_MAX`.
    #[default]
    Attack,
    /// Gain falling toward the sustain level.
    Decay,
    /// Holding (and fading) at sustain, or releasing after key-off.
    SustainRelease,
}

/// One output voice.
#[derive(Clone, Debug)]
pub struct Channel {
    index: usize,

    base_frequency: f32,
    bent_frequency: f32,
    last_note: u8,
    detune: f32,
    mapping: NoteMapping,

    adsr: Adsr,
    phase: EnvelopePhase,
    gain: i32,
    counter: i32,

    volume: u8,
    global_volume: u8,
    system_volume: u8,
    fade_target: u8,

    generator: GeneratorSource,
    noise: NoiseRegister,
    read_position: usize,

    ring: CommandRing,
    sequence: Option<SequenceLog>,
}

impl Channel {
    /// A channel at its defaults.
    pub(crate) fn new(index: usize) -> Self {
        Self {
            index,
            base_frequency: DEFAULT_FREQUENCY,
            bent_frequency: DEFAULT_FREQUENCY,
            last_note: 0,
            detune: 0.0,
            mapping: NoteMapping::Standard,
            adsr: Adsr::default(),
            phase: EnvelopePhase::Attack,
            gain: 0,
            counter: KEY_OFF,
            volume: VOLUME_MAX,
            global_volume: VOLUME_MAX,
            system_volume: VOLUME_MAX,
            fade_target: VOLUME_MAX,
            generator: GeneratorSource::Slot(0),
            noise: NoiseRegister::new(),
            read_position: 0,
            ring: CommandRing::new(),
            sequence: None,
        }
    }

    /// Restore defaults, dropping any bound log.
    pub(crate) fn reset(&mut self) {
        *self = Self::new(self.index);
    }

    // -- accessors ------------------------------------------------------

    /// Channel index within the engine.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Note frequency before pitch bend, in Hz.
    pub fn base_frequency(&self) -> f32 {
        self.base_frequency
    }

    /// Oscillator frequency after pitch bend, in Hz (detune not included).
    pub fn bent_frequency(&self) -> f32 {
        self.bent_frequency
    }

    /// Last nonzero note number applied.
    pub fn last_note(&self) -> u8 {
        self.last_note
    }

    /// Detune offset in Hz.
    pub fn detune(&self) -> f32 {
        self.detune
    }

    /// Table used to resolve note numbers.
    pub fn note_mapping(&self) -> NoteMapping {
        self.mapping
    }

    /// Envelope parameters.
    pub fn adsr(&self) -> Adsr {
        self.adsr
    }

    /// Current envelope phase.
    pub fn envelope_phase(&self) -> EnvelopePhase {
        self.phase
    }

    /// Gain accumulator, `0..=GAIN_MAX`.
    pub fn gain(&self) -> i32 {
        self.gain
    }

    /// Key counter: `-1` when released, otherwise samples since key-on (or
    /// since entering sustain).
    pub fn key_counter(&self) -> i32 {
        self.counter
    }

    /// True while the key is held.
    pub fn is_key_on(&self) -> bool {
        self.counter >= 0
    }

    /// Per-note volume.
    pub fn volume(&self) -> u8 {
        self.volume
    }

    /// Channel volume.
    pub fn global_volume(&self) -> u8 {
        self.global_volume
    }

    /// System volume, the one auto-fades move.
    pub fn system_volume(&self) -> u8 {
        self.system_volume
    }

    /// Target of the running auto-fade.
    pub fn fade_target(&self) -> u8 {
        self.fade_target
    }

    /// Bound generator.
    pub fn generator(&self) -> GeneratorSource {
        self.generator
    }

    /// Noise register contents.
    pub fn noise_register(&self) -> u16 {
        self.noise.value()
    }

    /// Oscillator read position, always below [`TABLE_LENGTH`].
    pub fn read_position(&self) -> usize {
        self.read_position
    }

    /// Near-term command ring.
    pub fn ring(&self) -> &CommandRing {
        &self.ring
    }

    /// Bound far-term log, if any.
    pub fn sequence(&self) -> Option<&SequenceLog> {
        self.sequence.as_ref()
    }

    // -- control --------------------------------------------------------

    pub(crate) fn bind_generator(&mut self, generator: GeneratorSource) {
        self.generator = generator;
    }

    pub(crate) fn set_adsr(&mut self, adsr: Adsr) {
        self.adsr = adsr;
    }

    pub(crate) fn set_detune(&mut self, detune: f32) {
        self.detune = detune;
    }

    pub(crate) fn set_frequency(&mut self, hz: f32) {
        self.base_frequency = hz;
        self.bent_frequency = hz;
    }

    pub(crate) fn set_note_mapping(&mut self, mapping: NoteMapping) {
        self.mapping = mapping;
    }

    pub(crate) fn set_global_volume(&mut self, volume: u8) {
        self.global_volume = volume.min(VOLUME_MAX);
    }

    pub(crate) fn set_system_volume(&mut self, volume: u8) {
        let volume = volume.min(VOLUME_MAX);
        self.system_volume = volume;
        self.fade_target = volume;
    }

    pub(crate) fn request_fade(&mut self, target: u8) {
        self.fade_target = target.min(VOLUME_MAX);
    }

    pub(crate) fn reset_volumes(&mut self) {
        self.volume = VOLUME_MAX;
        self.global_volume = VOLUME_MAX;
        self.system_volume = VOLUME_MAX;
        self.fade_target = VOLUME_MAX;
    }

    pub(crate) fn force_note_off(&mut self) {
        self.counter = KEY_OFF;
        self.gain = 0;
    }

    pub(crate) fn ring_mut(&mut self) -> &mut CommandRing {
        &mut self.ring
    }

    pub(crate) fn sequence_slot(&mut self) -> &mut Option<SequenceLog> {
        &mut self.sequence
    }

    /// Refill the ring from the bound log. No-op without a log.
    pub(crate) fn fill(&mut self, current_tick: u64) {
        if let Some(log) = self.sequence.as_mut() {
            log.fill(current_tick, &mut self.ring);
        }
    }

    // -- per-sample -----------------------------------------------------

    /// Apply one command. Returns `false` for a disabled command, which
    /// leaves the channel untouched.
    pub(crate) fn apply(&mut self, cmd: Command, notes: &CustomNoteTable) -> bool {
        if !cmd.is_enabled() {
            return false;
        }

        if !cmd.is_no_key() {
            if cmd.is_key_on() {
                self.counter = 0;
                self.phase = EnvelopePhase::Attack;
            } else {
                self.counter = KEY_OFF;
            }
        }

        if let Some(volume) = cmd.volume() {
            self.volume = volume;
        }

        let note = cmd.note();
        if note != 0 {
            let freq = notes.resolve(self.mapping, note);
            self.base_frequency = freq;
            self.bent_frequency = freq;
            self.last_note = note;
        }

        if let Some(bend) = cmd.pitch_bend() {
            self.bent_frequency = self.bend(bend);
        }

        true
    }

    fn bend(&self, bend: PitchBend) -> f32 {
        let base = self.base_frequency;
        let (target, amount) = match bend {
            PitchBend::Up(a) => (transpose(base, 2.0), a),
            PitchBend::Down(a) => (transpose(base, -2.0), a),
        };
        base + (target - base) * f32::from(amount) / f32::from(crate::command::PITCH_BEND_MAX)
    }

    /// Move the system volume one unit toward the fade target.
    #[inline]
    pub(crate) fn step_fade(&mut self) {
        use core::cmp::Ordering;
        match self.system_volume.cmp(&self.fade_target) {
            Ordering::Less => self.system_volume += 1,
            Ordering::Greater => self.system_volume -= 1,
            Ordering::Equal => {}
        }
    }

    /// Advance the envelope by one sample.
    #[inline]
    pub(crate) fn step_envelope(&mut self) {
        let adsr = self.adsr;
        match self.phase {
            EnvelopePhase::Attack => {
                if self.counter < 0 {
                    self.phase = EnvelopePhase::SustainRelease;
                    return;
                }
                self.gain = self.gain.saturating_add(adsr.attack_rate);
                if self.gain >= GAIN_MAX {
                    self.gain = GAIN_MAX;
                    self.phase = EnvelopePhase::Decay;
                }
            }
            EnvelopePhase::Decay => {
                if self.counter < 0 {
                    self.phase = EnvelopePhase::SustainRelease;
                    return;
                }
                self.gain = self.gain.saturating_sub(adsr.decay_rate);
                if self.gain <= adsr.sustain_level {
                    self.gain = adsr.sustain_level;
                    self.phase = EnvelopePhase::SustainRelease;
                    self.counter = 1;
                }
            }
            EnvelopePhase::SustainRelease => {
                if self.counter >= 0 {
                    let faded = i64::from(adsr.sustain_level)
                        - i64::from(self.counter) * i64::from(adsr.fade_rate);
                    if faded < 0 {
                        self.gain = FADE_FLOOR_GAIN;
                        self.counter = KEY_OFF;
                    } else {
                        self.gain = faded as i32;
                    }
                } else if self.gain > 0 {
                    let rate = if self.gain > adsr.sustain_level {
                        adsr.decay_rate
                    } else {
                        adsr.release_rate
                    };
                    self.gain = self.gain.saturating_sub(rate).max(0);
                }
            }
        }
    }

    /// Count one sample of a held key.
    #[inline]
    pub(crate) fn advance_state(&mut self) {
        if self.counter >= 0 {
            self.counter = self.counter.saturating_add(1);
        }
    }

    /// Step the oscillator read position for the current pitch.
    #[inline]
    pub(crate) fn advance_phase(&mut self) {
        self.read_position = next_read_position(
            self.read_position,
            self.bent_frequency + self.detune,
        );
    }

    /// Generator sample at the read position scaled by the gain accumulator.
    #[inline]
    pub(crate) fn gain_sample(&mut self, bank: &WavetableBank) -> i32 {
        let generated = match self.generator {
            GeneratorSource::Noise => self.noise.next_sample(),
            GeneratorSource::Slot(slot) => i32::from(bank.sample(slot, self.read_position)),
        };
        ((self.gain >> 2) * generated) / (GAIN_MAX >> 2)
    }

    /// One sample of this channel's contribution to the mix.
    ///
    /// Steps the envelope, counter and phase, then scales the gain sample by
    /// note, global and system volume.
    #[inline]
    pub(crate) fn next_contribution(&mut self, bank: &WavetableBank) -> i32 {
        self.step_envelope();
        self.advance_state();
        self.advance_phase();
        let raw = self.gain_sample(bank);
        let mixed = raw * i32::from(self.volume) * i32::from(self.global_volume) / VOLUME_SCALE;
        mixed * i32::from(self.system_volume) / i32::from(VOLUME_MAX)
    }
}

/// Read position after one sample at `frequency` Hz.
///
/// The step is truncated toward zero and the result wraps into
/// `0..TABLE_LENGTH`, so negative frequencies play the table backwards.
#[inline]
pub fn next_read_position(position: usize, frequency: f32) -> usize {
    phase_step(frequency)
        .wrapping_add(position as i64)
        .rem_euclid(TABLE_LENGTH as i64) as usize
}

/// Table samples advanced per output sample at `frequency` Hz.
#[inline]
pub fn phase_step(frequency: f32) -> i64 {
    (frequency / BASE_GENERATOR_FREQUENCY) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::standard_frequency;

    fn channel() -> Channel {
        Channel::new(0)
    }

    fn notes() -> CustomNoteTable {
        CustomNoteTable::new()
    }

    #[test]
    fn test_defaults() {
        let ch = channel();
        assert_eq!(ch.base_frequency(), 440.0);
        assert_eq!(ch.adsr(), Adsr::default());
        assert_eq!(ch.adsr().attack_rate, 8192);
        assert_eq!(ch.adsr().sustain_level, 32768);
        assert_eq!(ch.key_counter(), -1);
        assert_eq!(ch.gain(), 0);
        assert_eq!(ch.volume(), 127);
        assert_eq!(ch.system_volume(), 127);
        assert_eq!(ch.generator(), GeneratorSource::Slot(0));
    }

    #[test]
    fn test_disabled_command_is_noop() {
        let mut ch = channel();
        assert!(!ch.apply(Command::from_bits(crate::command::KEY_ON | 60), &notes()));
        assert_eq!(ch.key_counter(), -1);
        assert_eq!(ch.base_frequency(), 440.0);
    }

    #[test]
    fn test_key_on_resets_to_attack() {
        let mut ch = channel();
        ch.set_adsr(Adsr {
            attack_rate: GAIN_MAX,
            decay_rate: GAIN_MAX,
            ..Adsr::default()
        });
        ch.apply(Command::key_on(60), &notes());
        for _ in 0..4 {
            ch.step_envelope();
            ch.advance_state();
        }
        assert_eq!(ch.envelope_phase(), EnvelopePhase::SustainRelease);

        ch.apply(Command::key_on(62), &notes());
        assert_eq!(ch.envelope_phase(), EnvelopePhase::Attack);
        assert_eq!(ch.key_counter(), 0);
        assert_eq!(ch.last_note(), 62);
    }

    #[test]
    fn test_no_key_keeps_key_state() {
        let mut ch = channel();
        ch.apply(Command::key_on(60), &notes());
        ch.advance_state();
        ch.apply(Command::update().with_volume(40), &notes());
        assert_eq!(ch.key_counter(), 1);
        assert_eq!(ch.volume(), 40);
        assert_eq!(ch.last_note(), 60);
    }

    #[test]
    fn test_note_zero_keeps_pitch() {
        let mut ch = channel();
        ch.apply(Command::key_on(69), &notes());
        ch.apply(Command::key_on(0), &notes());
        assert!((ch.base_frequency() - 440.0).abs() < 0.01);
        assert_eq!(ch.last_note(), 69);
    }

    #[test]
    fn test_custom_mapping() {
        let mut table = notes();
        table.set(36, 123.0);
        let mut ch = channel();
        ch.set_note_mapping(NoteMapping::Custom);
        ch.apply(Command::key_on(36), &table);
        assert_eq!(ch.base_frequency(), 123.0);
        ch.apply(Command::key_on(37), &table);
        assert_eq!(ch.base_frequency(), standard_frequency(37));
    }

    #[test]
    fn test_pitch_bend_interpolates() {
        let mut ch = channel();
        ch.apply(Command::key_on(69).with_pitch_bend(PitchBend::Up(63)), &notes());
        assert!((ch.bent_frequency() - 493.88).abs() < 0.05);
        assert!((ch.base_frequency() - 440.0).abs() < 0.01);

        ch.apply(Command::update().with_pitch_bend(PitchBend::Down(63)), &notes());
        assert!((ch.bent_frequency() - 392.0).abs() < 0.05);

        ch.apply(Command::update().with_pitch_bend(PitchBend::Up(0)), &notes());
        assert!((ch.bent_frequency() - 440.0).abs() < 0.01);
    }

    #[test]
    fn test_attack_decay_sustain_boundaries() {
        let mut ch = channel();
        ch.set_adsr(Adsr {
            attack_rate: GAIN_MAX / 4,
            decay_rate: GAIN_MAX / 8,
            sustain_level: GAIN_MAX / 2,
            release_rate: 1,
            fade_rate: 0,
        });
        ch.apply(Command::key_on(60), &notes());

        for expected in [GAIN_MAX / 4, GAIN_MAX / 2, GAIN_MAX * 3 / 4] {
            ch.step_envelope();
            assert_eq!(ch.gain(), expected);
            assert_eq!(ch.envelope_phase(), EnvelopePhase::Attack);
        }
        ch.step_envelope();
        assert_eq!(ch.gain(), GAIN_MAX);
        assert_eq!(ch.envelope_phase(), EnvelopePhase::Decay);

        for _ in 0..3 {
            ch.step_envelope();
            assert_eq!(ch.envelope_phase(), EnvelopePhase::Decay);
        }
        ch.step_envelope();
        assert_eq!(ch.gain(), GAIN_MAX / 2);
        assert_eq!(ch.envelope_phase(), EnvelopePhase::SustainRelease);
        assert_eq!(ch.key_counter(), 1);
    }

    #[test]
    fn test_sustain_fade_runs_out() {
        let mut ch = channel();
        ch.set_adsr(Adsr {
            attack_rate: GAIN_MAX,
            decay_rate: GAIN_MAX,
            sustain_level: 100,
            release_rate: 1,
            fade_rate: 30,
        });
        ch.apply(Command::key_on(60), &notes());
        ch.step_envelope(); // attack -> decay
        ch.step_envelope(); // decay -> sustain, counter = 1
        assert_eq!(ch.gain(), 100);

        ch.step_envelope();
        assert_eq!(ch.gain(), 70);
        ch.advance_state();
        ch.step_envelope();
        assert_eq!(ch.gain(), 40);
        for _ in 0..2 {
            ch.advance_state();
            ch.step_envelope();
        }
        assert_eq!(ch.gain(), FADE_FLOOR_GAIN);
        assert!(!ch.is_key_on());
    }

    #[test]
    fn test_release_is_monotone_to_zero() {
        let mut ch = channel();
        ch.apply(Command::key_on(60), &notes());
        for _ in 0..20 {
            ch.step_envelope();
            ch.advance_state();
        }
        ch.apply(Command::key_off(), &notes());
        let mut last = ch.gain();
        for _ in 0..100_000 {
            ch.step_envelope();
            assert!(ch.gain() <= last);
            assert!(ch.gain() >= 0);
            last = ch.gain();
        }
        assert_eq!(last, 0);
    }

    #[test]
    fn test_key_off_during_attack_goes_to_release() {
        let mut ch = channel();
        ch.apply(Command::key_on(60), &notes());
        ch.step_envelope();
        ch.apply(Command::key_off(), &notes());
        ch.step_envelope();
        assert_eq!(ch.envelope_phase(), EnvelopePhase::SustainRelease);
        assert_eq!(ch.gain(), GAIN_MAX >> 4);
    }

    #[test]
    fn test_force_note_off() {
        let mut ch = channel();
        ch.apply(Command::key_on(60), &notes());
        ch.step_envelope();
        ch.force_note_off();
        assert_eq!(ch.gain(), 0);
        assert_eq!(ch.key_counter(), -1);
    }

    #[test]
    fn test_fade_steps_one_unit() {
        let mut ch = channel();
        ch.request_fade(125);
        ch.step_fade();
        assert_eq!(ch.system_volume(), 126);
        ch.step_fade();
        ch.step_fade();
        assert_eq!(ch.system_volume(), 125);

        ch.request_fade(200);
        assert_eq!(ch.fade_target(), 127);
        ch.step_fade();
        assert_eq!(ch.system_volume(), 126);
    }

    #[test]
    fn test_phase_step_truncates() {
        assert_eq!(phase_step(440.0), 3520);
        assert_eq!(phase_step(0.2), 1);
        assert_eq!(phase_step(0.1), 0);
        assert_eq!(phase_step(-0.2), -1);
    }

    #[test]
    fn test_read_position_wraps_negative() {
        assert_eq!(next_read_position(0, -1.0), TABLE_LENGTH - 8);
        assert_eq!(next_read_position(TABLE_LENGTH - 1, 0.125), 0);
    }

    #[test]
    fn test_noise_channel_draws_register() {
        let bank = WavetableBank::new();
        let mut ch = channel();
        ch.bind_generator(GeneratorSource::Noise);
        ch.apply(Command::key_on(60), &notes());
        let before = ch.noise_register();
        ch.next_contribution(&bank);
        assert_ne!(ch.noise_register(), before);
    }

    #[test]
    fn test_adsr_validation() {
        assert!(Adsr::default().validate().is_ok());
        let bad = Adsr {
            release_rate: -1,
            ..Adsr::default()
        };
        assert!(bad.validate().is_err());
        let bad = Adsr {
            sustain_level: GAIN_MAX + 1,
            ..Adsr::default()
        };
        assert!(bad.validate().is_err());
    }
}
