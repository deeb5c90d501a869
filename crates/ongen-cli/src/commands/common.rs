//! Shared CLI helpers used across multiple commands.

use clap::Args;
use ongen_config::{Preset, get_factory_preset};
use ongen_core::OUTPUT_SAMPLE_RATE;
use std::path::PathBuf;

/// Ticks of release tail rendered after the last note of a non-looping song.
pub const RELEASE_TAIL_TICKS: u64 = OUTPUT_SAMPLE_RATE as u64 / 2;

/// Where the song comes from: a preset or an inline MML voice.
#[derive(Args, Debug, Clone)]
pub struct SongArgs {
    /// Factory preset name or path to a preset TOML file
    #[arg(value_name = "PRESET", required_unless_present = "mml", conflicts_with = "mml")]
    pub preset: Option<String>,

    /// Play this MML on channel 0 instead of a preset
    #[arg(long, value_name = "TEXT")]
    pub mml: Option<String>,

    /// Override ticks per whole note
    #[arg(long, value_name = "TICKS")]
    pub whole_note: Option<u64>,
}

impl SongArgs {
    /// Resolve the preset these arguments describe.
    pub fn load(&self) -> anyhow::Result<Preset> {
        let mut preset = match (&self.preset, &self.mml) {
            (_, Some(mml)) => Preset::single_voice(mml.clone()),
            (Some(name), None) => load_preset(name)?,
            (None, None) => anyhow::bail!("No song given. Pass a PRESET or --mml"),
        };
        if let Some(ticks) = self.whole_note {
            preset.whole_note_ticks = ticks;
        }
        Ok(preset)
    }
}

/// Load a preset by factory name, then by file path.
pub fn load_preset(name: &str) -> anyhow::Result<Preset> {
    if let Some(preset) = get_factory_preset(name) {
        return Ok(preset);
    }

    let path = PathBuf::from(name);
    if path.exists() {
        return Ok(Preset::load(&path)?);
    }

    anyhow::bail!(
        "Preset '{}' not found. Use 'ongen presets' to see factory presets.",
        name
    )
}

/// Whether any channel of `preset` loops forever.
pub fn loops_forever(preset: &Preset) -> bool {
    preset
        .channels
        .iter()
        .any(|c| c.looped && (c.midi_channel.is_some() || !c.mml.trim().is_empty()))
}

/// Convert seconds to whole output ticks.
pub fn seconds_to_ticks(seconds: f32) -> anyhow::Result<u64> {
    if !seconds.is_finite() || seconds < 0.0 {
        anyhow::bail!("Duration must be a non-negative number of seconds, got {seconds}");
    }
    Ok((f64::from(seconds) * f64::from(OUTPUT_SAMPLE_RATE)).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_factory_preset() {
        assert_eq!(load_preset("scale").unwrap().name, "scale");
        assert!(load_preset("definitely-not-a-preset").is_err());
    }

    #[test]
    fn test_song_args_mml_override() {
        let args = SongArgs {
            preset: None,
            mml: Some("cde".into()),
            whole_note: Some(1000),
        };
        let preset = args.load().unwrap();
        assert_eq!(preset.whole_note_ticks, 1000);
        assert_eq!(preset.channels[0].mml, "cde");
        assert!(!loops_forever(&preset));
    }

    #[test]
    fn test_loops_forever() {
        assert!(loops_forever(&load_preset("chiptune").unwrap()));
        assert!(!loops_forever(&load_preset("organ").unwrap()));

        let midi = Preset::new("midi")
            .with_midi("song.mid")
            .with_channel(ongen_config::ChannelConfig::new(0, "").with_midi_channel(0).looped());
        assert!(loops_forever(&midi));
    }

    #[test]
    fn test_seconds_to_ticks() {
        assert_eq!(seconds_to_ticks(1.5).unwrap(), 66150);
        assert_eq!(seconds_to_ticks(0.0).unwrap(), 0);
        assert!(seconds_to_ticks(-1.0).is_err());
        assert!(seconds_to_ticks(f32::NAN).is_err());
    }
}
