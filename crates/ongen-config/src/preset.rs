//! Preset file format and operations.

use ongen_core::{Engine, NUM_CHANNELS, OUTPUT_SAMPLE_RATE};
use ongen_midi::{Importer, MIDI_CHANNELS, MidiFile};
use ongen_mml::Compiler;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::channel::ChannelConfig;
use crate::error::ConfigError;

/// Ticks per whole note when a preset does not say (two seconds).
pub const DEFAULT_WHOLE_NOTE_TICKS: u64 = 2 * OUTPUT_SAMPLE_RATE as u64;

/// Tick the first note lands on when a preset does not say (0.2 s).
pub const DEFAULT_ORIGIN_TICK: u64 = OUTPUT_SAMPLE_RATE as u64 / 5;

/// A full engine setup: one entry per used channel.
///
/// # TOML Format
///
/// ```toml
/// name = "demo"
/// whole_note_ticks = 88200
/// origin_tick = 8820
///
/// [[channels]]
/// channel = 0
/// generator = "harmonics"
/// coefficients = [1.0, 0.5]
/// volume = 0.8
/// mml = "o4 l8 cdefgab<c"
/// loop = true
/// [channels.adsr]
/// attack_rate = 8192
/// decay_rate = 8
/// sustain_level = 32768
/// release_rate = 2
/// ```
///
/// A preset may also name a Standard MIDI File. Entries with a
/// `midi_channel` play that channel of the file instead of their MML:
///
/// ```toml
/// name = "midi"
/// midi = "song.mid"
/// drum_channel = 9
///
/// [[channels]]
/// channel = 0
/// midi_channel = 0
/// loop = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Preset {
    /// Name of the preset.
    pub name: String,

    /// Optional description of the preset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Samples per whole note.
    #[serde(default = "default_whole_note_ticks")]
    pub whole_note_ticks: u64,

    /// Tick of the first statement of every voice.
    #[serde(default = "default_origin_tick")]
    pub origin_tick: u64,

    /// Standard MIDI File read by entries with a `midi_channel`.
    ///
    /// A relative path in a preset file is relative to that file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub midi: Option<PathBuf>,

    /// Output ticks per MIDI tick; derived from the file's tempo when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub midi_tick_scale: Option<u64>,

    /// MIDI channel whose notes are folded onto the two drum notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drum_channel: Option<u8>,

    /// Channel entries.
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
}

fn default_whole_note_ticks() -> u64 {
    DEFAULT_WHOLE_NOTE_TICKS
}

fn default_origin_tick() -> u64 {
    DEFAULT_ORIGIN_TICK
}

impl Preset {
    /// Create a new empty preset.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            whole_note_ticks: DEFAULT_WHOLE_NOTE_TICKS,
            origin_tick: DEFAULT_ORIGIN_TICK,
            midi: None,
            midi_tick_scale: None,
            drum_channel: None,
            channels: Vec::new(),
        }
    }

    /// A preset playing `mml` on channel 0 with a square wave.
    pub fn single_voice(mml: impl Into<String>) -> Self {
        Self::new("mml").with_channel(ChannelConfig::new(0, mml))
    }

    /// Create a preset with a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the tempo as ticks per whole note.
    pub fn with_whole_note_ticks(mut self, ticks: u64) -> Self {
        self.whole_note_ticks = ticks;
        self
    }

    /// Set the origin tick.
    pub fn with_origin_tick(mut self, tick: u64) -> Self {
        self.origin_tick = tick;
        self
    }

    /// Read MIDI voices from `path`.
    pub fn with_midi(mut self, path: impl Into<PathBuf>) -> Self {
        self.midi = Some(path.into());
        self
    }

    /// Fix the number of output ticks per MIDI tick.
    pub fn with_midi_tick_scale(mut self, scale: u64) -> Self {
        self.midi_tick_scale = Some(scale);
        self
    }

    /// Treat MIDI channel `channel` as percussion.
    pub fn with_drum_channel(mut self, channel: u8) -> Self {
        self.drum_channel = Some(channel);
        self
    }

    /// Add a channel entry.
    pub fn with_channel(mut self, channel: ChannelConfig) -> Self {
        self.channels.push(channel);
        self
    }

    /// Load a preset from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let mut preset: Preset = toml::from_str(&content)?;
        if let Some(midi) = &mut preset.midi
            && midi.is_relative()
            && let Some(dir) = path.parent()
        {
            *midi = dir.join(&*midi);
        }
        tracing::debug!(path = %path.display(), name = %preset.name, "loaded preset");
        Ok(preset)
    }

    /// Load a preset from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the preset to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the preset to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every entry and reject channels configured twice.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = [false; NUM_CHANNELS];
        for entry in &self.channels {
            entry.validate()?;
            if std::mem::replace(&mut seen[entry.channel], true) {
                return Err(ConfigError::DuplicateChannel(entry.channel));
            }
            if entry.midi_channel.is_some() && self.midi.is_none() {
                return Err(ConfigError::invalid_parameter(
                    entry.channel,
                    "midi_channel",
                    "the preset names no MIDI input",
                ));
            }
        }
        if self.midi_tick_scale == Some(0) {
            return Err(ConfigError::invalid_parameter(
                0,
                "midi_tick_scale",
                "must be positive",
            ));
        }
        if let Some(drum) = self.drum_channel
            && drum >= MIDI_CHANNELS
        {
            return Err(ConfigError::invalid_parameter(
                0,
                "drum_channel",
                format!("{drum} is outside 0-15"),
            ));
        }
        if self.whole_note_ticks == 0 {
            return Err(ConfigError::invalid_parameter(
                0,
                "whole_note_ticks",
                "must be positive",
            ));
        }
        Ok(())
    }

    /// Configure `engine` from this preset.
    ///
    /// Each entry generates its table into the slot matching its channel,
    /// binds it, sets detune, volume and envelope, then compiles its MML (or
    /// imports its MIDI channel) and binds the result as the channel's
    /// sequence. Channels not named keep their current state.
    ///
    /// Returns the tick just past the last note of the longest voice, or
    /// `origin_tick` when no voice has notes.
    pub fn apply(&self, engine: &mut Engine) -> Result<u64, ConfigError> {
        self.validate()?;
        let compiler = Compiler::new(self.whole_note_ticks);
        let midi = self.load_midi()?;
        let importer = midi.as_ref().map(|file| self.importer(file));
        let mut end_tick = self.origin_tick;

        for entry in &self.channels {
            let channel = entry.channel;
            if let Some(waveform) = entry.waveform() {
                engine.generate(channel, waveform)?;
                if entry.smooth {
                    engine.smooth_generator(channel)?;
                }
            }
            engine.bind_generator(channel, entry.source())?;
            engine.set_detune(channel, entry.detune)?;
            engine.set_volume(channel, entry.engine_volume())?;
            if let Some(adsr) = entry.adsr {
                engine.set_adsr(channel, adsr.into())?;
            }

            let (mut log, end) = match (entry.midi_channel, &importer) {
                (Some(midi_channel), Some(importer)) => {
                    importer.import(midi_channel, self.origin_tick)?
                }
                _ => compiler
                    .compile(&entry.mml, self.origin_tick)
                    .map_err(|source| ConfigError::Mml { channel, source })?,
            };
            if !entry.looped {
                log.clear_loop_region();
            } else if log.loop_region().is_none()
                && let Some(first) = log.entries().first().map(|e| e.tick)
                && end > first
            {
                log.set_loop_region(0, log.len() - 1, first, end)?;
            }
            tracing::debug!(
                channel,
                entries = log.len(),
                end,
                looped = entry.looped,
                "configured channel"
            );
            engine.bind_sequence(channel, log)?;
            end_tick = end_tick.max(end);
        }

        tracing::info!(preset = %self.name, channels = self.channels.len(), end_tick, "applied preset");
        Ok(end_tick)
    }

    /// The MIDI input, when some entry reads from it.
    fn load_midi(&self) -> Result<Option<MidiFile>, ConfigError> {
        match &self.midi {
            Some(path) if self.channels.iter().any(|c| c.midi_channel.is_some()) => {
                Ok(Some(MidiFile::load(path)?))
            }
            _ => Ok(None),
        }
    }

    fn importer<'a>(&self, file: &'a MidiFile) -> Importer<'a> {
        let mut importer = Importer::new(file);
        if let Some(scale) = self.midi_tick_scale {
            importer = importer.with_tick_scale(scale);
        }
        if let Some(drum) = self.drum_channel {
            importer = importer.with_drum_channel(drum);
        }
        importer
    }

    /// Number of channel entries.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Check if the preset has no channel entries.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Entry for output channel `channel`, if configured.
    pub fn channel(&self, channel: usize) -> Option<&ChannelConfig> {
        self.channels.iter().find(|c| c.channel == channel)
    }
}

impl Default for Preset {
    fn default() -> Self {
        Self::new("Untitled")
    }
}
