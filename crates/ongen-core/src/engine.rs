//! The synthesis engine.
//!
//! [`Engine`] owns the wavetable bank, the channels, and the custom note
//! table. Control operations return [`Result`]; [`Engine::render`] is the
//! only call meant for the audio thread and never allocates, blocks, or
//! fails once its buffer arguments are valid.
//!
//! # Render loop
//!
//! At the start of a call, and again every [`LOOKAHEAD_TICKS`] samples, each
//! channel refills its ring from its bound log. Then, for each sample:
//!
//! 1. On a fetch boundary (`tick % FETCH_INTERVAL == 0`) every channel
//!    consumes one ring slot, applies it, and steps its auto-fade.
//! 2. Every channel steps its envelope and oscillator and contributes one
//!    volume-scaled sample.
//! 3. The sum is clamped to ±32767 and written.
//! 4. The global tick advances.

use crate::channel::{Adsr, Channel, VOLUME_MAX};
use crate::command::Command;
use crate::error::{Error, Result};
use crate::notes::{CustomNoteTable, NoteMapping};
use crate::ring::{FETCH_INTERVAL, LOOKAHEAD_TICKS, RING_CAPACITY};
use crate::sequence::SequenceLog;
use crate::wavetable::{GeneratorSource, NUM_GENERATORS, TABLE_LENGTH, Waveform, WavetableBank};
use crate::NUM_CHANNELS;

/// Largest magnitude written to the output.
pub const OUTPUT_CLAMP: i32 = 32767;

/// Byte order of rendered samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Endianness {
    /// Most significant byte first.
    Big,
    /// Least significant byte first.
    #[default]
    Little,
}

impl Endianness {
    /// Byte order of the running target.
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            Self::Big
        } else {
            Self::Little
        }
    }

    #[inline]
    fn encode(self, sample: i16) -> [u8; 2] {
        match self {
            Self::Big => sample.to_be_bytes(),
            Self::Little => sample.to_le_bytes(),
        }
    }
}

/// Receives every command a channel applies during a render.
///
/// Called synchronously from the render loop with the channel index, the
/// command, and the sample offset within the current call. Closures
/// `FnMut(usize, Command, usize)` implement this trait.
pub trait CommandObserver {
    /// A command was applied to `channel` at sample `offset`.
    fn command_applied(&mut self, channel: usize, command: Command, offset: usize);
}

impl<F> CommandObserver for F
where
    F: FnMut(usize, Command, usize),
{
    fn command_applied(&mut self, channel: usize, command: Command, offset: usize) {
        self(channel, command, offset);
    }
}

struct NoObserver;

impl CommandObserver for NoObserver {
    #[inline]
    fn command_applied(&mut self, _channel: usize, _command: Command, _offset: usize) {}
}

/// Multi-channel wavetable synthesizer.
///
/// # Example
///
/// ```rust
/// use ongen_core::{Command, Endianness, Engine, GeneratorSource, Waveform};
///
/// let mut engine = Engine::new();
/// engine.generate(0, Waveform::Square).unwrap();
/// engine.bind_generator(0, GeneratorSource::Slot(0)).unwrap();
/// engine.schedule_immediate(0, 0, Command::key_on(60)).unwrap();
///
/// let mut out = vec![0u8; 441 * 4];
/// engine.render(&mut out, 441, 4, true, Endianness::Little).unwrap();
/// assert_eq!(engine.global_tick(), 441);
/// ```
pub struct Engine {
    bank: WavetableBank,
    channels: [Channel; NUM_CHANNELS],
    notes: CustomNoteTable,
    tick: u64,
    paused: bool,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Engine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Engine")
            .field("tick", &self.tick)
            .field("paused", &self.paused)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// An engine with silent tables and default channels at tick 0.
    pub fn new() -> Self {
        Self {
            bank: WavetableBank::new(),
            channels: core::array::from_fn(Channel::new),
            notes: CustomNoteTable::new(),
            tick: 0,
            paused: false,
        }
    }

    /// Reset tick, tables, channels, and the custom note table.
    ///
    /// Bound logs are dropped.
    pub fn initialize(&mut self) {
        self.tick = 0;
        self.paused = false;
        self.bank.silence();
        self.notes.clear();
        for ch in &mut self.channels {
            ch.reset();
        }
        #[cfg(feature = "tracing")]
        tracing::debug!("engine initialized");
    }

    fn check_channel(channel: usize) -> Result<()> {
        if channel < NUM_CHANNELS {
            Ok(())
        } else {
            Err(Error::out_of_range("channel", channel))
        }
    }

    fn channel_mut(&mut self, channel: usize) -> Result<&mut Channel> {
        self.channels
            .get_mut(channel)
            .ok_or(Error::out_of_range("channel", channel))
    }

    /// Read-only view of `channel`.
    pub fn channel(&self, channel: usize) -> Result<&Channel> {
        self.channels
            .get(channel)
            .ok_or(Error::out_of_range("channel", channel))
    }

    /// Iterate all channels.
    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    // -- wavetables -----------------------------------------------------

    /// Fill wavetable `slot` with `waveform`.
    pub fn generate(&mut self, slot: usize, waveform: Waveform<'_>) -> Result<()> {
        self.bank.generate(slot, waveform)?;
        #[cfg(feature = "tracing")]
        tracing::debug!(slot, "generated wavetable");
        Ok(())
    }

    /// Apply the smoothing filter to wavetable `slot`.
    pub fn smooth_generator(&mut self, slot: usize) -> Result<()> {
        self.bank.smooth(slot)
    }

    /// Sample `index` of wavetable `slot`.
    pub fn generator_sample(&self, slot: usize, index: usize) -> Result<i16> {
        if slot >= NUM_GENERATORS {
            return Err(Error::out_of_range("generator slot", slot));
        }
        if index >= TABLE_LENGTH {
            return Err(Error::out_of_range("sample index", index));
        }
        Ok(self.bank.sample(slot, index))
    }

    /// The wavetable bank.
    pub fn wavetables(&self) -> &WavetableBank {
        &self.bank
    }

    // -- channel control ------------------------------------------------

    /// Make `channel` read from `source`.
    pub fn bind_generator(&mut self, channel: usize, source: GeneratorSource) -> Result<()> {
        if let GeneratorSource::Slot(slot) = source {
            if slot >= NUM_GENERATORS {
                return Err(Error::out_of_range("generator slot", slot));
            }
        }
        self.channel_mut(channel)?.bind_generator(source);
        #[cfg(feature = "tracing")]
        tracing::debug!(channel, ?source, "bound generator");
        Ok(())
    }

    /// Replace the envelope of `channel`.
    pub fn set_adsr(&mut self, channel: usize, adsr: Adsr) -> Result<()> {
        Self::check_channel(channel)?;
        adsr.validate()?;
        self.channels[channel].set_adsr(adsr);
        Ok(())
    }

    /// Envelope of `channel`.
    pub fn adsr(&self, channel: usize) -> Result<Adsr> {
        self.channel(channel).map(Channel::adsr)
    }

    /// Detune `channel` by `hz`. Negative values are allowed.
    pub fn set_detune(&mut self, channel: usize, hz: f32) -> Result<()> {
        self.channel_mut(channel)?.set_detune(hz);
        Ok(())
    }

    /// Set both base and bent frequency of `channel` directly.
    pub fn set_frequency(&mut self, channel: usize, hz: f32) -> Result<()> {
        self.channel_mut(channel)?.set_frequency(hz);
        Ok(())
    }

    /// Set the channel (global) volume, clamped to 127.
    pub fn set_volume(&mut self, channel: usize, volume: u8) -> Result<()> {
        self.channel_mut(channel)?.set_global_volume(volume);
        Ok(())
    }

    /// Set the system volume immediately, cancelling any running fade.
    pub fn set_system_volume(&mut self, channel: usize, volume: u8) -> Result<()> {
        self.channel_mut(channel)?.set_system_volume(volume);
        Ok(())
    }

    /// Ramp the system volume to `target`, one unit per fetch interval.
    pub fn request_fade(&mut self, channel: usize, target: u8) -> Result<()> {
        self.channel_mut(channel)?.request_fade(target);
        #[cfg(feature = "tracing")]
        tracing::debug!(channel, target, "fade requested");
        Ok(())
    }

    /// Ramp the system volume back to full.
    pub fn fade_to_max(&mut self, channel: usize) -> Result<()> {
        self.request_fade(channel, VOLUME_MAX)
    }

    /// Restore every volume of `channel` to full.
    pub fn reset_volumes(&mut self, channel: usize) -> Result<()> {
        self.channel_mut(channel)?.reset_volumes();
        Ok(())
    }

    /// Silence `channel` now: gain to zero and key released, no release ramp.
    pub fn force_note_off(&mut self, channel: usize) -> Result<()> {
        self.channel_mut(channel)?.force_note_off();
        Ok(())
    }

    /// Choose the note table `channel` resolves against.
    pub fn set_note_mapping(&mut self, channel: usize, mapping: NoteMapping) -> Result<()> {
        self.channel_mut(channel)?.set_note_mapping(mapping);
        Ok(())
    }

    /// Set slot `note` of the custom note table to `hz`.
    pub fn set_custom_note(&mut self, note: usize, hz: f32) -> Result<()> {
        if self.notes.set(note, hz) {
            Ok(())
        } else {
            Err(Error::out_of_range("custom note", note))
        }
    }

    /// Unset every slot of the custom note table.
    pub fn clear_custom_notes(&mut self) {
        self.notes.clear();
    }

    /// The custom note table.
    pub fn custom_notes(&self) -> &CustomNoteTable {
        &self.notes
    }

    // -- scheduling -----------------------------------------------------

    /// Write `command` into the ring of `channel`, `offset` fetches ahead,
    /// cancelling everything scheduled after it.
    pub fn schedule_immediate(
        &mut self,
        channel: usize,
        offset: usize,
        command: Command,
    ) -> Result<()> {
        if offset >= RING_CAPACITY {
            return Err(Error::BufferFull {
                capacity: RING_CAPACITY,
            });
        }
        self.channel_mut(channel)?
            .ring_mut()
            .schedule_and_truncate(offset, command)
    }

    /// Attach `log` to `channel`, returning the log it replaces.
    pub fn bind_sequence(
        &mut self,
        channel: usize,
        log: SequenceLog,
    ) -> Result<Option<SequenceLog>> {
        let previous = self.channel_mut(channel)?.sequence_slot().replace(log);
        #[cfg(feature = "tracing")]
        tracing::debug!(channel, replaced = previous.is_some(), "bound sequence");
        Ok(previous)
    }

    /// Detach and return the log bound to `channel`.
    pub fn unbind_sequence(&mut self, channel: usize) -> Result<Option<SequenceLog>> {
        Ok(self.channel_mut(channel)?.sequence_slot().take())
    }

    /// The log bound to `channel`.
    pub fn sequence(&self, channel: usize) -> Result<Option<&SequenceLog>> {
        self.channel(channel).map(Channel::sequence)
    }

    /// Mutable access to the log bound to `channel`, for appending between
    /// renders.
    pub fn sequence_mut(&mut self, channel: usize) -> Result<&mut SequenceLog> {
        self.channel_mut(channel)?
            .sequence_slot()
            .as_mut()
            .ok_or(Error::NotBound { channel })
    }

    // -- transport ------------------------------------------------------

    /// Pause or resume. A paused engine renders silence and holds all state.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
        #[cfg(feature = "tracing")]
        tracing::debug!(paused, tick = self.tick, "pause state changed");
    }

    /// True while paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Samples rendered since the last initialize (paused samples excluded).
    pub fn global_tick(&self) -> u64 {
        self.tick
    }

    /// Overwrite the global tick. Meant for resynchronisation and tests.
    pub fn force_global_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    // -- rendering ------------------------------------------------------

    /// Render `sample_count` frames of 16-bit PCM into `out`.
    ///
    /// Frame `i` starts at byte `i * stride_bytes`; a stereo frame writes the
    /// same sample twice. `out` must hold the last frame and `stride_bytes`
    /// must fit a whole frame, otherwise nothing is rendered. Renders longer
    /// than [`LOOKAHEAD_TICKS`] are scheduled in lookahead-sized chunks, so one
    /// long call produces the same audio as many short ones.
    pub fn render(
        &mut self,
        out: &mut [u8],
        sample_count: usize,
        stride_bytes: usize,
        stereo: bool,
        endianness: Endianness,
    ) -> Result<()> {
        self.render_observed(out, sample_count, stride_bytes, stereo, endianness, &mut NoObserver)
    }

    /// [`render`](Self::render), reporting every applied command to
    /// `observer`.
    pub fn render_observed(
        &mut self,
        out: &mut [u8],
        sample_count: usize,
        stride_bytes: usize,
        stereo: bool,
        endianness: Endianness,
        observer: &mut dyn CommandObserver,
    ) -> Result<()> {
        let frame_bytes = if stereo { 4 } else { 2 };
        if stride_bytes < frame_bytes {
            return Err(Error::out_of_range("stride", stride_bytes));
        }
        if sample_count == 0 {
            return Ok(());
        }
        let needed = (sample_count - 1)
            .checked_mul(stride_bytes)
            .and_then(|n| n.checked_add(frame_bytes))
            .ok_or(Error::out_of_range("sample count", sample_count))?;
        if out.len() < needed {
            return Err(Error::out_of_range("output length", out.len()));
        }

        self.synthesize(sample_count, observer, |i, sample| {
            let bytes = endianness.encode(sample);
            let at = i * stride_bytes;
            out[at..at + 2].copy_from_slice(&bytes);
            if stereo {
                out[at + 2..at + 4].copy_from_slice(&bytes);
            }
        });
        Ok(())
    }

    /// Render native-endian samples into `out`, filling it completely.
    ///
    /// Stereo output is interleaved; a trailing odd sample is left as is.
    pub fn render_i16(&mut self, out: &mut [i16], stereo: bool) {
        if stereo {
            let frames = out.len() / 2;
            self.synthesize(frames, &mut NoObserver, |i, sample| {
                out[2 * i] = sample;
                out[2 * i + 1] = sample;
            });
        } else {
            let frames = out.len();
            self.synthesize(frames, &mut NoObserver, |i, sample| out[i] = sample);
        }
    }

    fn synthesize(
        &mut self,
        frames: usize,
        observer: &mut dyn CommandObserver,
        mut write: impl FnMut(usize, i16),
    ) {
        if frames == 0 {
            return;
        }
        if self.paused {
            for i in 0..frames {
                write(i, 0);
            }
            return;
        }

        // Rings only see LOOKAHEAD_TICKS ahead, so long renders refill per chunk.
        let chunk = LOOKAHEAD_TICKS as usize;
        for i in 0..frames {
            if i % chunk == 0 {
                for ch in &mut self.channels {
                    ch.fill(self.tick);
                }
            }
            let fetch = self.tick % FETCH_INTERVAL == 0;
            let mut mix = 0i32;
            for ch in &mut self.channels {
                if fetch {
                    let cmd = ch.ring_mut().consume_and_advance();
                    if ch.apply(cmd, &self.notes) {
                        observer.command_applied(ch.index(), cmd, i);
                    }
                    ch.step_fade();
                }
                mix += ch.next_contribution(&self.bank);
            }
            write(i, mix.clamp(-OUTPUT_CLAMP, OUTPUT_CLAMP) as i16);
            self.tick = self.tick.saturating_add(1);
        }
    }
}
