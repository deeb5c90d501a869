//! Turning one MIDI channel into a sequence log.

use crate::error::{MidiError, Result};
use crate::file::{MIDI_CHANNELS, MidiFile, NoteEvent, NoteKind};
use ongen_core::{Command, SequenceLog};
use tracing::debug;

/// MIDI ticks a note-off is pulled forward when a note-on shares its tick.
pub const RETRIGGER_GAP_TICKS: u64 = 2;

/// Snare notes on the drum channel, played as [`DRUM_SNARE_NOTE`].
pub const DRUM_SNARE_SOURCES: [u8; 2] = [38, 40];

/// Note the snare sounds are mapped to.
pub const DRUM_SNARE_NOTE: u8 = 1;

/// Note every other drum sound is mapped to, at two thirds of its velocity.
pub const DRUM_OTHER_NOTE: u8 = 120;

/// Builds sequence logs from a parsed [`MidiFile`].
///
/// Each MIDI tick becomes `tick_scale` output ticks. A note-on becomes a
/// key-on whose per-note volume is the velocity; a note-off becomes a
/// key-off. The file's loop span, if any, becomes the log's loop region.
///
/// # Example
///
/// ```rust,no_run
/// use ongen_midi::{Importer, MidiFile};
///
/// let file = MidiFile::load("song.mid").unwrap();
/// let (log, end) = Importer::new(&file).with_drum_channel(9).import(0, 8820).unwrap();
/// println!("{} entries, last at tick {end}", log.len());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Importer<'a> {
    file: &'a MidiFile,
    tick_scale: u64,
    drum_channel: Option<u8>,
}

impl<'a> Importer<'a> {
    /// An importer using the file's own tempo.
    pub fn new(file: &'a MidiFile) -> Self {
        Self {
            file,
            tick_scale: file.tick_scale(),
            drum_channel: None,
        }
    }

    /// Override output ticks per MIDI tick (at least 1).
    pub fn with_tick_scale(mut self, tick_scale: u64) -> Self {
        self.tick_scale = tick_scale.max(1);
        self
    }

    /// Treat `channel` as percussion.
    pub fn with_drum_channel(mut self, channel: u8) -> Self {
        self.drum_channel = Some(channel);
        self
    }

    /// Output ticks per MIDI tick.
    pub fn tick_scale(&self) -> u64 {
        self.tick_scale
    }

    /// Note events of `channel` in play order, with drum mapping and
    /// retrigger gaps applied. Ticks are still MIDI ticks.
    pub fn channel_events(&self, channel: u8) -> Result<Vec<NoteEvent>> {
        if channel >= MIDI_CHANNELS {
            return Err(MidiError::InvalidChannel(channel));
        }
        let drums = self.drum_channel == Some(channel);
        let mut events: Vec<NoteEvent> = self
            .file
            .events
            .iter()
            .filter(|e| e.channel == channel)
            .map(|&e| if drums { map_drum(e) } else { e })
            .collect();

        events.sort_by_key(|e| e.tick);
        for i in 1..events.len() {
            let (prev, next) = (events[i - 1], events[i]);
            if matches!(prev.kind, NoteKind::Off { .. })
                && matches!(next.kind, NoteKind::On { .. })
                && prev.tick == next.tick
            {
                events[i - 1].tick = prev.tick.saturating_sub(RETRIGGER_GAP_TICKS);
            }
        }
        events.sort_by_key(|e| e.tick);
        Ok(events)
    }

    /// Build the log for MIDI `channel`, starting at `origin_tick`.
    ///
    /// Returns the log and the tick of its last entry (`origin_tick` when
    /// the channel is silent).
    pub fn import(&self, channel: u8, origin_tick: u64) -> Result<(SequenceLog, u64)> {
        let events = self.channel_events(channel)?;
        let scaled = |tick: u64| origin_tick.saturating_add(tick.saturating_mul(self.tick_scale));

        let mut log = SequenceLog::with_capacity(events.len());
        for event in &events {
            let command = match event.kind {
                NoteKind::On { note, velocity } => Command::key_on(note).with_volume(velocity),
                NoteKind::Off { .. } => Command::key_off(),
            };
            log.append(scaled(event.tick), command)?;
        }

        if let Some(span) = self.file.loop_span {
            let (start, end) = (scaled(span.start_tick), scaled(span.end_tick));
            match loop_bounds(&log, start, end) {
                Some((first, last)) => log.set_loop_region(first, last, start, end)?,
                None => debug!(channel, "loop span holds no events on this channel"),
            }
        }

        let end = log.last_tick().unwrap_or(origin_tick);
        debug!(
            channel,
            entries = log.len(),
            end,
            tick_scale = self.tick_scale,
            looped = log.loop_region().is_some(),
            "imported MIDI channel"
        );
        Ok((log, end))
    }
}

/// Entries in `[start, end)`, plus key-offs landing exactly on `end`.
fn loop_bounds(log: &SequenceLog, start: u64, end: u64) -> Option<(usize, usize)> {
    let entries = log.entries();
    let first = entries.iter().position(|e| e.tick >= start)?;
    let inside = entries[first..]
        .iter()
        .take_while(|e| e.tick < end || (e.tick == end && !e.command.is_key_on()))
        .count();
    (inside > 0).then_some((first, first + inside - 1))
}

fn map_drum(event: NoteEvent) -> NoteEvent {
    let kind = match event.kind {
        NoteKind::On { note, velocity } if DRUM_SNARE_SOURCES.contains(&note) => NoteKind::On {
            note: DRUM_SNARE_NOTE,
            velocity,
        },
        NoteKind::On { velocity, .. } => NoteKind::On {
            note: DRUM_OTHER_NOTE,
            velocity: (u16::from(velocity) * 2 / 3) as u8,
        },
        NoteKind::Off { note } if DRUM_SNARE_SOURCES.contains(&note) => NoteKind::Off {
            note: DRUM_SNARE_NOTE,
        },
        NoteKind::Off { .. } => NoteKind::Off {
            note: DRUM_OTHER_NOTE,
        },
    };
    NoteEvent { kind, ..event }
}
