//! Standard MIDI File parsing.
//!
//! Reads an SMF with `midly` and keeps only what a monophonic channel can
//! play: note-on and note-off events with their absolute tick, plus the
//! tempo and an optional pair of loop markers.

use crate::error::{MidiError, Result};
use midly::{MetaMessage, MidiMessage, Smf, Timing, Track, TrackEventKind};
use ongen_core::OUTPUT_SAMPLE_RATE;
use std::path::Path;
use tracing::debug;

/// Microseconds per quarter note when the file sets no tempo (120 BPM).
pub const DEFAULT_TEMPO: u32 = 500_000;

/// Number of MIDI channels.
pub const MIDI_CHANNELS: u8 = 16;

/// A note event with its absolute position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    /// Absolute MIDI tick from the start of its track.
    pub tick: u64,
    /// MIDI channel, `0..16`.
    pub channel: u8,
    /// What happens.
    pub kind: NoteKind,
}

/// Note event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteKind {
    /// Key pressed; velocity is never 0.
    On {
        /// Note number (0-127).
        note: u8,
        /// Velocity (1-127).
        velocity: u8,
    },
    /// Key released. A note-on with velocity 0 is read as this.
    Off {
        /// Note number (0-127).
        note: u8,
    },
}

impl NoteKind {
    /// Note number of the event.
    pub fn note(self) -> u8 {
        match self {
            Self::On { note, .. } | Self::Off { note } => note,
        }
    }
}

/// Loop span declared by marker meta events, in MIDI ticks.
///
/// A marker whose text is the single byte `0x01` is a loop marker. The loop
/// starts at the first event after the first loop marker and ends at the
/// second loop marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiLoop {
    /// Tick the loop returns to.
    pub start_tick: u64,
    /// Tick the loop jumps back from.
    pub end_tick: u64,
}

/// A parsed MIDI file reduced to note events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiFile {
    /// Ticks per quarter note.
    pub ticks_per_beat: u16,

    /// Microseconds per quarter note (last tempo event wins).
    pub tempo: u32,

    /// Note events of every track, in file order.
    pub events: Vec<NoteEvent>,

    /// Loop span from the first track that declares a valid one.
    pub loop_span: Option<MidiLoop>,
}

impl MidiFile {
    /// Load and parse a MIDI file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| MidiError::read_file(path, e))?;
        let file = Self::parse(&data)?;
        debug!(path = %path.display(), events = file.events.len(), "loaded MIDI file");
        Ok(file)
    }

    /// Parse a MIDI file from bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let smf = Smf::parse(data)?;

        let ticks_per_beat = match smf.header.timing {
            Timing::Metrical(tpb) if tpb.as_int() > 0 => tpb.as_int(),
            _ => return Err(MidiError::UnsupportedTiming),
        };

        let mut tempo = DEFAULT_TEMPO;
        let mut events = Vec::new();
        let mut loop_span = None;

        for track in &smf.tracks {
            read_track(track, &mut events, &mut tempo);
            if loop_span.is_none() {
                loop_span = find_loop(track);
            }
        }

        debug!(
            tracks = smf.tracks.len(),
            ticks_per_beat,
            tempo,
            events = events.len(),
            looped = loop_span.is_some(),
            "parsed MIDI file"
        );

        Ok(Self {
            ticks_per_beat,
            tempo,
            events,
            loop_span,
        })
    }

    /// Output samples per MIDI tick at the file's tempo, at least 1.
    pub fn tick_scale(&self) -> u64 {
        let num = u64::from(self.tempo) * u64::from(OUTPUT_SAMPLE_RATE);
        let den = u64::from(self.ticks_per_beat) * 1_000_000;
        (num / den).max(1)
    }

    /// Whether any event uses `channel`.
    pub fn uses_channel(&self, channel: u8) -> bool {
        self.events.iter().any(|e| e.channel == channel)
    }
}

fn read_track(track: &Track<'_>, events: &mut Vec<NoteEvent>, tempo: &mut u32) {
    let mut tick = 0u64;
    for event in track {
        tick += u64::from(event.delta.as_int());
        match event.kind {
            TrackEventKind::Midi { channel, message } => {
                let kind = match message {
                    MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => NoteKind::On {
                        note: key.as_int(),
                        velocity: vel.as_int(),
                    },
                    MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                        NoteKind::Off { note: key.as_int() }
                    }
                    _ => continue,
                };
                events.push(NoteEvent {
                    tick,
                    channel: channel.as_int(),
                    kind,
                });
            }
            TrackEventKind::Meta(MetaMessage::Tempo(t)) => *tempo = t.as_int(),
            _ => {}
        }
    }
}

fn is_loop_marker(kind: &TrackEventKind<'_>) -> bool {
    matches!(kind, TrackEventKind::Meta(MetaMessage::Marker(text)) if *text == [1u8])
}

/// Loop span of one track, if it has two loop markers around a non-empty span.
fn find_loop(track: &Track<'_>) -> Option<MidiLoop> {
    let mut tick = 0u64;
    let mut markers = 0;
    let mut awaiting_start = false;
    let mut start_tick = 0;
    let mut end_tick = 0;

    for event in track {
        tick += u64::from(event.delta.as_int());
        if is_loop_marker(&event.kind) {
            markers += 1;
            match markers {
                1 => awaiting_start = true,
                2 => end_tick = tick,
                _ => {}
            }
        } else if awaiting_start {
            awaiting_start = false;
            start_tick = tick;
        }
    }

    (markers >= 2 && end_tick > start_tick).then_some(MidiLoop {
        start_tick,
        end_tick,
    })
}
