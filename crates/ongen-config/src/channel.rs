//! Per-channel preset entries.

use ongen_core::{Adsr, GAIN_MAX, GeneratorSource, NUM_CHANNELS, VOLUME_MAX, Waveform};
use ongen_midi::MIDI_CHANNELS;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Generator recipe named in a preset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum GeneratorKind {
    /// 50% square.
    #[default]
    Square,
    /// 25% square.
    Square13,
    /// Square with eighths 0, 1 and 3 high.
    Square2114,
    /// Triangle.
    Triangle,
    /// Block-quantized noise table.
    ShortNoise,
    /// Live LFSR noise, no table.
    WhiteNoise,
    /// Additive sine from `coefficients`.
    Harmonics,
}

/// ADSR block of a channel entry, in gain units per sample.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdsrConfig {
    /// Gain added per sample during attack.
    pub attack_rate: i32,
    /// Gain removed per sample during decay.
    pub decay_rate: i32,
    /// Held gain.
    pub sustain_level: i32,
    /// Gain removed per sample after key-off.
    pub release_rate: i32,
    /// Gain removed per sample while sustaining.
    #[serde(default)]
    pub fade_rate: i32,
}

impl Default for AdsrConfig {
    fn default() -> Self {
        Adsr::default().into()
    }
}

impl From<Adsr> for AdsrConfig {
    fn from(adsr: Adsr) -> Self {
        Self {
            attack_rate: adsr.attack_rate,
            decay_rate: adsr.decay_rate,
            sustain_level: adsr.sustain_level,
            release_rate: adsr.release_rate,
            fade_rate: adsr.fade_rate,
        }
    }
}

impl From<AdsrConfig> for Adsr {
    fn from(config: AdsrConfig) -> Self {
        Self {
            attack_rate: config.attack_rate,
            decay_rate: config.decay_rate,
            sustain_level: config.sustain_level,
            release_rate: config.release_rate,
            fade_rate: config.fade_rate,
        }
    }
}

/// One `[[channels]]` entry of a preset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelConfig {
    /// Output channel index, `0..13`.
    pub channel: usize,

    /// Waveform recipe.
    #[serde(default)]
    pub generator: GeneratorKind,

    /// Harmonic amplitudes for [`GeneratorKind::Harmonics`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coefficients: Vec<f32>,

    /// Run the smoothing filter over the generated table.
    #[serde(default)]
    pub smooth: bool,

    /// Channel volume, `0.0..=1.0`.
    #[serde(default = "default_volume")]
    pub volume: f32,

    /// Frequency offset in Hz.
    #[serde(default)]
    pub detune: f32,

    /// MML voice.
    #[serde(default)]
    pub mml: String,

    /// Play this channel of the preset's MIDI input instead of `mml`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub midi_channel: Option<u8>,

    /// Loop the voice. A MIDI voice loops between the file's loop markers
    /// when it has them; every other voice loops whole.
    #[serde(default, rename = "loop")]
    pub looped: bool,

    /// Envelope override; the engine default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adsr: Option<AdsrConfig>,
}

fn default_volume() -> f32 {
    1.0
}

impl ChannelConfig {
    /// A square-wave entry for `channel` playing `mml`.
    pub fn new(channel: usize, mml: impl Into<String>) -> Self {
        Self {
            channel,
            generator: GeneratorKind::default(),
            coefficients: Vec::new(),
            smooth: false,
            volume: default_volume(),
            detune: 0.0,
            mml: mml.into(),
            midi_channel: None,
            looped: false,
            adsr: None,
        }
    }

    /// Set the generator.
    pub fn with_generator(mut self, generator: GeneratorKind) -> Self {
        self.generator = generator;
        self
    }

    /// Use an additive generator with these harmonic amplitudes.
    pub fn with_harmonics(mut self, coefficients: impl Into<Vec<f32>>) -> Self {
        self.generator = GeneratorKind::Harmonics;
        self.coefficients = coefficients.into();
        self
    }

    /// Set the volume.
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    /// Set the detune.
    pub fn with_detune(mut self, hz: f32) -> Self {
        self.detune = hz;
        self
    }

    /// Set the envelope.
    pub fn with_adsr(mut self, adsr: impl Into<AdsrConfig>) -> Self {
        self.adsr = Some(adsr.into());
        self
    }

    /// Play MIDI channel `channel` of the preset's MIDI input.
    pub fn with_midi_channel(mut self, channel: u8) -> Self {
        self.midi_channel = Some(channel);
        self
    }

    /// Enable smoothing.
    pub fn smoothed(mut self) -> Self {
        self.smooth = true;
        self
    }

    /// Loop the whole sequence.
    pub fn looped(mut self) -> Self {
        self.looped = true;
        self
    }

    /// Check the entry on its own; duplicate detection is the preset's job.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let channel = self.channel;
        if channel >= NUM_CHANNELS {
            return Err(ConfigError::InvalidChannel {
                channel,
                max: NUM_CHANNELS,
            });
        }
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(ConfigError::invalid_parameter(
                channel,
                "volume",
                format!("{} is outside 0.0..=1.0", self.volume),
            ));
        }
        if !self.detune.is_finite() {
            return Err(ConfigError::invalid_parameter(channel, "detune", "must be finite"));
        }
        if let Some(midi_channel) = self.midi_channel
            && midi_channel >= MIDI_CHANNELS
        {
            return Err(ConfigError::invalid_parameter(
                channel,
                "midi_channel",
                format!("{midi_channel} is outside 0-15"),
            ));
        }
        if self.generator == GeneratorKind::Harmonics {
            if self.coefficients.is_empty() {
                return Err(ConfigError::invalid_parameter(
                    channel,
                    "coefficients",
                    "harmonics need at least one coefficient",
                ));
            }
            if self.coefficients.iter().any(|c| !c.is_finite()) {
                return Err(ConfigError::invalid_parameter(
                    channel,
                    "coefficients",
                    "must be finite",
                ));
            }
        }
        if let Some(adsr) = self.adsr {
            let rates = [
                ("attack_rate", adsr.attack_rate),
                ("decay_rate", adsr.decay_rate),
                ("release_rate", adsr.release_rate),
                ("fade_rate", adsr.fade_rate),
            ];
            for (param, rate) in rates {
                if rate < 0 {
                    return Err(ConfigError::invalid_parameter(
                        channel,
                        param,
                        format!("{rate} is negative"),
                    ));
                }
            }
            if !(0..=GAIN_MAX).contains(&adsr.sustain_level) {
                return Err(ConfigError::invalid_parameter(
                    channel,
                    "sustain_level",
                    format!("{} is outside 0..={GAIN_MAX}", adsr.sustain_level),
                ));
            }
        }
        Ok(())
    }

    /// Volume scaled to the engine's `0..=127` range.
    pub fn engine_volume(&self) -> u8 {
        (self.volume.clamp(0.0, 1.0) * f32::from(VOLUME_MAX)).round() as u8
    }

    /// What the channel reads from once its table is generated.
    pub(crate) fn source(&self) -> GeneratorSource {
        match self.generator {
            GeneratorKind::WhiteNoise => GeneratorSource::Noise,
            _ => GeneratorSource::Slot(self.channel),
        }
    }

    /// Table recipe, or `None` when the channel reads live noise.
    pub(crate) fn waveform(&self) -> Option<Waveform<'_>> {
        Some(match self.generator {
            GeneratorKind::Square => Waveform::Square,
            GeneratorKind::Square13 => Waveform::Square13,
            GeneratorKind::Square2114 => Waveform::Square2114,
            GeneratorKind::Triangle => Waveform::Triangle,
            GeneratorKind::ShortNoise => Waveform::ShortNoise,
            GeneratorKind::Harmonics => Waveform::Harmonics(&self.coefficients),
            GeneratorKind::WhiteNoise => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_toml() {
        let config: ChannelConfig = toml::from_str("channel = 2").unwrap();
        assert_eq!(config, ChannelConfig::new(2, ""));
        assert_eq!(config.engine_volume(), 127);
    }

    #[test]
    fn test_generator_names() {
        let config: ChannelConfig =
            toml::from_str("channel = 0\ngenerator = \"white-noise\"").unwrap();
        assert_eq!(config.generator, GeneratorKind::WhiteNoise);
        assert_eq!(config.source(), GeneratorSource::Noise);
        assert!(config.waveform().is_none());

        let config: ChannelConfig =
            toml::from_str("channel = 4\ngenerator = \"square2114\"").unwrap();
        assert_eq!(config.source(), GeneratorSource::Slot(4));
        assert_eq!(config.waveform(), Some(Waveform::Square2114));

        assert!(toml::from_str::<ChannelConfig>("channel = 0\ngenerator = \"saw\"").is_err());
    }

    #[test]
    fn test_loop_key_renamed() {
        let config: ChannelConfig = toml::from_str("channel = 0\nloop = true").unwrap();
        assert!(config.looped);
        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("loop = true"), "got: {text}");
    }

    #[test]
    fn test_engine_volume_scaling() {
        assert_eq!(ChannelConfig::new(0, "").with_volume(0.0).engine_volume(), 0);
        assert_eq!(ChannelConfig::new(0, "").with_volume(0.5).engine_volume(), 64);
    }

    #[test]
    fn test_validate_rejects() {
        assert!(matches!(
            ChannelConfig::new(13, "").validate(),
            Err(ConfigError::InvalidChannel { channel: 13, max: 13 })
        ));
        assert!(matches!(
            ChannelConfig::new(0, "").with_volume(1.5).validate(),
            Err(ConfigError::InvalidParameter { param: "volume", .. })
        ));
        assert!(matches!(
            ChannelConfig::new(0, "").with_harmonics(Vec::new()).validate(),
            Err(ConfigError::InvalidParameter {
                param: "coefficients",
                ..
            })
        ));
        assert!(matches!(
            ChannelConfig::new(0, "").with_midi_channel(16).validate(),
            Err(ConfigError::InvalidParameter {
                param: "midi_channel",
                ..
            })
        ));
        let adsr = AdsrConfig {
            sustain_level: GAIN_MAX + 1,
            ..AdsrConfig::default()
        };
        assert!(matches!(
            ChannelConfig::new(0, "").with_adsr(adsr).validate(),
            Err(ConfigError::InvalidParameter {
                param: "sustain_level",
                ..
            })
        ));
        let adsr = AdsrConfig {
            release_rate: -1,
            ..AdsrConfig::default()
        };
        assert!(matches!(
            ChannelConfig::new(0, "").with_adsr(adsr).validate(),
            Err(ConfigError::InvalidParameter {
                param: "release_rate",
                ..
            })
        ));
    }

    #[test]
    fn test_adsr_conversion() {
        let adsr = Adsr {
            attack_rate: 1,
            decay_rate: 2,
            sustain_level: 3,
            release_rate: 4,
            fade_rate: 5,
        };
        assert_eq!(Adsr::from(AdsrConfig::from(adsr)), adsr);
    }
}
